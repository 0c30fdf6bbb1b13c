//! Process-level runtime support shared by reelbase crates:
//! layered configuration loading and `tracing` initialisation.

pub mod config;
pub mod logging;

pub use config::{default_logging_config, AppConfig, ConfigProvider, LoggingConfig, Section};
pub use logging::init_logging_from_config;
