// Adapters - External system implementations

pub mod json_store;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
pub use json_store::JsonFileSessionStore;
pub use toml_config::TomlConfigAdapter;
pub use tracing_log::init_logging;
