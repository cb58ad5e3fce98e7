//! CardioRisk API
//!
//! HTTP boundary for the cardiovascular risk service: request validation,
//! routing, error mapping, and operational endpoints around the predictor.

pub mod cli;
pub mod config;
pub mod routes;
pub mod state;

pub use cli::Cli;
pub use config::ServiceConfig;
pub use routes::create_router;
pub use state::AppState;
