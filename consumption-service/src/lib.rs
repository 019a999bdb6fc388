pub mod auth;
pub mod config;
pub mod error;
pub mod metrics_server;
pub mod observability;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::{AppState, Clock};
