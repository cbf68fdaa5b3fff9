use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::blocking::Client;
use serde_json::{json, Value};

#[derive(Debug, Parser)]
#[command(author, version, about = "Send sample wines to the winerate prediction service", long_about = None)]
struct Args {
    /// Prediction endpoint
    #[arg(long, default_value = "http://127.0.0.1:8000/predict")]
    url: String,
}

/// Five sample wines; the first sends every value as a string.
fn sample_clients() -> Vec<Value> {
    vec![
        json!({
            "fixed_acidity": "7.4",
            "volatile_acidity": "0.7",
            "citric_acid": "0.0",
            "residual_sugar": "1.9",
            "chlorides": "0.076",
            "free_sulfur_dioxide": "11.0",
            "total_sulfur_dioxide": "34.0",
            "density": "0.9978",
            "ph": "3.51",
            "sulphates": "0.56",
            "alcohol": "9.4",
            "quality": "5"
        }),
        json!({
            "fixed_acidity": 7.8,
            "volatile_acidity": 0.76,
            "citric_acid": 0.04,
            "residual_sugar": 2.3,
            "chlorides": 0.092,
            "free_sulfur_dioxide": 15.0,
            "total_sulfur_dioxide": 54.0,
            "density": 0.997,
            "ph": 3.26,
            "sulphates": 0.65,
            "alcohol": 9.8,
            "quality": 5
        }),
        json!({
            "fixed_acidity": 11.2,
            "volatile_acidity": 0.28,
            "citric_acid": 0.56,
            "residual_sugar": 1.9,
            "chlorides": 0.075,
            "free_sulfur_dioxide": 17.0,
            "total_sulfur_dioxide": 60.0,
            "density": 0.998,
            "ph": 3.16,
            "sulphates": 0.58,
            "alcohol": 9.8,
            "quality": 6
        }),
        json!({
            "fixed_acidity": 6.5,
            "volatile_acidity": 0.24,
            "citric_acid": 0.19,
            "residual_sugar": 1.2,
            "chlorides": 0.041,
            "free_sulfur_dioxide": 30.0,
            "total_sulfur_dioxide": 111.0,
            "density": 0.99254,
            "ph": 2.99,
            "sulphates": 0.46,
            "alcohol": 9.4,
            "quality": 6
        }),
        json!({
            "fixed_acidity": 5.5,
            "volatile_acidity": 0.29,
            "citric_acid": 0.3,
            "residual_sugar": 1.1,
            "chlorides": 0.022,
            "free_sulfur_dioxide": 20.0,
            "total_sulfur_dioxide": 110.0,
            "density": 0.98869,
            "ph": 3.34,
            "sulphates": 0.38,
            "alcohol": 12.8,
            "quality": 7
        }),
    ]
}

fn main() -> Result<()> {
    let args = Args::parse();

    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("build reqwest client")?;

    for (idx, payload) in sample_clients().iter().enumerate() {
        let response: Value = client
            .post(&args.url)
            .json(payload)
            .send()
            .with_context(|| format!("request for client {} failed", idx + 1))?
            .json()
            .with_context(|| format!("response for client {} was not JSON", idx + 1))?;
        println!("Client {} - {}", idx + 1, response);
    }

    Ok(())
}
