pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;
pub mod state;

pub use config::{AppConfig, ConfigError, LoggingConfig, ServerConfig, load_config};
pub use observability::{apply_logging_level, init_tracing};
pub use server::{ServerBuilder, WardflowServer, build_app};
pub use state::AppState;
