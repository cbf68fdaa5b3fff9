use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use winerate_model::CalibratedModel;

use crate::errors::{Result, ServiceError};

/// Probability above which a wine is reported as good
pub const DECISION_THRESHOLD: f64 = 0.5;

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<CalibratedModel>,
    pub req_count: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(model: CalibratedModel) -> Self {
        Self {
            model: Arc::new(model),
            req_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn record_request(&self) -> u64 {
        self.req_count.fetch_add(1, Ordering::Relaxed) as u64 + 1
    }
}

type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
struct PredictResponse {
    #[serde(rename = "Good?")]
    good: bool,
    prediction_probability: f64,
    request: Value,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn internal<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let payload = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}

/// Round to 3 decimal places
pub fn round_probability(p: f64) -> f64 {
    (p * 1000.0).round() / 1000.0
}

pub async fn start_server(state: AppState, addr: &str) -> Result<()> {
    let app = build_router(state);
    let listener = bind_listener(addr).await?;
    info!("Prediction service listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    let bound = if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr).await
    } else {
        tokio::net::TcpListener::bind(addr).await
    };
    bound.map_err(|source| ServiceError::Bind {
        addr: addr.to_string(),
        source,
    })
}

pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);
    Router::new()
        .route("/predict", post(handle_predict))
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// The body is parsed as JSON whatever its `Content-Type` says.
async fn handle_predict(
    State(state): State<SharedState>,
    body: Bytes,
) -> std::result::Result<Json<PredictResponse>, ApiError> {
    let req_total = state.record_request();
    let request: Value = serde_json::from_slice(&body).map_err(|err| {
        debug!(req_total, "rejected malformed body: {err}");
        ApiError::bad_request(format!("invalid JSON body: {err}"))
    })?;
    debug!(req_total, payload = %request, "received prediction request");

    let probability = state.model.predict_record(&request).map_err(|err| {
        error!("prediction failed: {err}");
        ApiError::internal(format!("prediction failed: {err}"))
    })?;

    let rounded = round_probability(probability);
    Ok(Json(PredictResponse {
        good: rounded > DECISION_THRESHOLD,
        prediction_probability: rounded,
        request,
    }))
}
