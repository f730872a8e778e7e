// MDASH Library - Public API

// Re-export error types
pub mod error;
pub use error::{MdashError, Result};

// Module declarations
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;

// Re-export commonly used types
pub use core::config::DashboardConfig;

/// Initialize logging. Quiet by default so the TUI owns the terminal;
/// `RUST_LOG` raises the level.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}
