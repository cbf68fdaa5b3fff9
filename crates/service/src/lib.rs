//! winerate prediction service
//!
//! Serves the trained classifier over `POST /predict`.

pub mod config;
pub mod errors;
pub mod server;

pub use config::ServiceConfig;
pub use errors::{Result, ServiceError};
pub use server::{build_router, round_probability, start_server, AppState, DECISION_THRESHOLD};
