// rmon Library - Public API

// Re-export error types
pub mod error;
pub use error::{MonitorError, PublishError, Result, SourceError, ValidationError};

// Module declarations
pub mod commands;
pub mod core;
pub mod ui;

// Re-export commonly used types
pub use core::config::Config;
pub use core::system_monitor::{MonitorHandle, MonitorRuntime, MonitorSettings, PublishedState};

// Initialize logging
pub fn init_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
