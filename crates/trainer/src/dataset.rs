//! CSV dataset loading and cleaning
//!
//! Reads the semicolon-delimited wine quality files, normalizes their
//! headers, derives the binary `good_wine` label from `quality` and drops
//! exact duplicate rows.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use winerate_model::{
    normalize_column_name, FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT, GOOD_QUALITY_ABOVE,
    MEASUREMENT_COLUMNS, QUALITY_COLUMN,
};

use crate::errors::{Result, TrainerError};

/// Number of physicochemical measurements per row
pub const MEASUREMENT_COUNT: usize = MEASUREMENT_COLUMNS.len();

/// Positions of [`FEATURE_COLUMNS`] within [`MEASUREMENT_COLUMNS`]
const SELECTED_MEASUREMENTS: [usize; FEATURE_COUNT] = [1, 2, 5, 6, 7, 8, 9, 10];

/// One cleaned wine sample
#[derive(Clone, Debug, PartialEq)]
pub struct WineRow {
    pub measurements: [f64; MEASUREMENT_COUNT],
    pub good_wine: bool,
}

impl WineRow {
    /// The model features, in model order
    pub fn features(&self) -> FeatureVector {
        SELECTED_MEASUREMENTS.map(|idx| self.measurements[idx])
    }

    /// Bitwise identity key; `-0.0` and `0.0` compare equal
    fn dedup_key(&self) -> [u64; MEASUREMENT_COUNT + 1] {
        let mut key = [0u64; MEASUREMENT_COUNT + 1];
        for (slot, &value) in key.iter_mut().zip(self.measurements.iter()) {
            *slot = if value == 0.0 { 0 } else { value.to_bits() };
        }
        key[MEASUREMENT_COUNT] = self.good_wine as u64;
        key
    }
}

/// Labelled wine dataset
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub rows: Vec<WineRow>,
}

impl Dataset {
    pub fn new(rows: Vec<WineRow>) -> Self {
        Self { rows }
    }

    /// Load a semicolon-delimited wine quality CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|err| {
            TrainerError::Dataset(format!("failed to open {}: {err}", path.display()))
        })?;
        Self::from_reader(file, &path.display().to_string())
    }

    /// Parse wine quality CSV content from any reader
    ///
    /// `source` names the input in error messages.
    pub fn from_reader<R: Read>(reader: R, source: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(normalize_column_name)
            .collect();

        let column_index = |name: &str| -> Result<usize> {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                TrainerError::Dataset(format!("{source}: missing column '{name}'"))
            })
        };

        let mut measurement_idx = [0usize; MEASUREMENT_COUNT];
        for (slot, name) in measurement_idx.iter_mut().zip(MEASUREMENT_COLUMNS) {
            *slot = column_index(name)?;
        }
        let quality_idx = column_index(QUALITY_COLUMN)?;

        let mut rows = Vec::new();
        for (line_idx, record) in csv_reader.records().enumerate() {
            let record = record?;
            // Header is line 1.
            let line = line_idx + 2;

            let parse = |col: usize| -> Result<f64> {
                let raw = record.get(col).unwrap_or("");
                match raw.parse::<f64>() {
                    Ok(value) if value.is_finite() => Ok(value),
                    _ => Err(TrainerError::Dataset(format!(
                        "{source}: line {line}, column '{}': invalid number '{raw}'",
                        headers[col]
                    ))),
                }
            };

            let mut measurements = [0.0; MEASUREMENT_COUNT];
            for (slot, &col) in measurements.iter_mut().zip(measurement_idx.iter()) {
                *slot = parse(col)?;
            }
            let quality = parse(quality_idx)?;

            rows.push(WineRow {
                measurements,
                good_wine: quality > GOOD_QUALITY_ABOVE,
            });
        }

        if rows.is_empty() {
            return Err(TrainerError::Dataset(format!("{source}: dataset is empty")));
        }

        Ok(Self { rows })
    }

    /// Append another dataset's rows after this one's
    pub fn concat(mut self, other: Dataset) -> Self {
        self.rows.extend(other.rows);
        self
    }

    /// Remove exact duplicate rows, keeping first occurrences.
    ///
    /// Returns the number of rows removed.
    pub fn drop_duplicates(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen = HashSet::with_capacity(before);
        self.rows.retain(|row| seen.insert(row.dedup_key()));
        before - self.rows.len()
    }

    /// Rows at the given indices, in index order
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Model feature matrix
    pub fn features(&self) -> Vec<FeatureVector> {
        self.rows.iter().map(WineRow::features).collect()
    }

    pub fn labels(&self) -> Vec<bool> {
        self.rows.iter().map(|row| row.good_wine).collect()
    }

    pub fn positive_count(&self) -> usize {
        self.rows.iter().filter(|row| row.good_wine).count()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Min and max of each model feature
    pub fn feature_stats(&self) -> Vec<(&'static str, f64, f64)> {
        let mut stats: Vec<(&'static str, f64, f64)> = FEATURE_COLUMNS
            .iter()
            .map(|&name| (name, f64::INFINITY, f64::NEG_INFINITY))
            .collect();

        for row in &self.rows {
            for (stat, value) in stats.iter_mut().zip(row.features()) {
                stat.1 = stat.1.min(value);
                stat.2 = stat.2.max(value);
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "\"fixed acidity\";\"volatile acidity\";\"citric acid\";\"residual sugar\";\"chlorides\";\"free sulfur dioxide\";\"total sulfur dioxide\";\"density\";\"pH\";\"sulphates\";\"alcohol\";\"quality\"";

    fn red_csv() -> String {
        [
            HEADER,
            "7.4;0.7;0;1.9;0.076;11;34;0.9978;3.51;0.56;9.4;5",
            "7.8;0.88;0;2.6;0.098;25;67;0.9968;3.2;0.68;9.8;5",
            "11.2;0.28;0.56;1.9;0.075;17;60;0.998;3.16;0.58;9.8;6",
            "7.4;0.7;0;1.9;0.076;11;34;0.9978;3.51;0.56;9.4;5",
        ]
        .join("\n")
    }

    #[test]
    fn test_header_normalization_and_label() {
        let dataset = Dataset::from_reader(red_csv().as_bytes(), "red").unwrap();
        assert_eq!(dataset.len(), 4);
        assert!(!dataset.rows[0].good_wine);
        assert!(dataset.rows[2].good_wine);
        assert_eq!(dataset.rows[2].measurements[0], 11.2);
    }

    #[test]
    fn test_selected_measurements_match_feature_names() {
        for (pos, &idx) in SELECTED_MEASUREMENTS.iter().enumerate() {
            assert_eq!(MEASUREMENT_COLUMNS[idx], FEATURE_COLUMNS[pos]);
        }
    }

    #[test]
    fn test_features_in_model_order() {
        let dataset = Dataset::from_reader(red_csv().as_bytes(), "red").unwrap();
        assert_eq!(
            dataset.rows[0].features(),
            [0.7, 0.0, 11.0, 34.0, 0.9978, 3.51, 0.56, 9.4]
        );
    }

    #[test]
    fn test_drop_duplicates_keeps_first() {
        let mut dataset = Dataset::from_reader(red_csv().as_bytes(), "red").unwrap();
        let removed = dataset.drop_duplicates();
        assert_eq!(removed, 1);
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.rows[0].measurements[1], 0.7);
        assert_eq!(dataset.drop_duplicates(), 0);
    }

    #[test]
    fn test_duplicates_across_files_removed_once() {
        let red = Dataset::from_reader(red_csv().as_bytes(), "red").unwrap();
        let white = Dataset::from_reader(red_csv().as_bytes(), "white").unwrap();
        let mut merged = red.concat(white);
        assert_eq!(merged.len(), 8);
        merged.drop_duplicates();
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let content = "fixed acidity;quality\n7.4;5\n";
        let err = Dataset::from_reader(content.as_bytes(), "broken").unwrap_err();
        assert!(err.to_string().contains("volatile_acidity"));
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let content = format!("{HEADER}\n7.4;abc;0;1.9;0.076;11;34;0.9978;3.51;0.56;9.4;5\n");
        let err = Dataset::from_reader(content.as_bytes(), "red").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("line 2"));
        assert!(message.contains("volatile_acidity"));
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        assert!(Dataset::from_reader(HEADER.as_bytes(), "red").is_err());
    }

    #[test]
    fn test_load_from_file() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        write!(file, "{}", red_csv())?;
        file.flush()?;

        let dataset = Dataset::from_csv(file.path())?;
        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.positive_count(), 1);

        let stats = dataset.feature_stats();
        assert_eq!(stats[7], ("alcohol", 9.4, 9.8));
        Ok(())
    }

    #[test]
    fn test_missing_file_is_dataset_error() {
        assert!(matches!(
            Dataset::from_csv("/nonexistent/winequality_red.csv"),
            Err(TrainerError::Dataset(_))
        ));
    }
}
