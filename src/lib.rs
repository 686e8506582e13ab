pub mod config;
pub mod models;
pub mod routes;
pub mod sink;
pub mod state;

pub use config::{Config, ConfigError};
pub use models::{GetCheckpointResponse, GetFiltersResponse};
pub use routes::create_router;
pub use sink::LogSink;
pub use state::AppState;
