// UI and formatting module

pub mod dashboard_tui;
pub mod formatters;
pub mod messages;
pub mod plain;

pub use formatters::{format_absolute, format_relative, format_rounded};
pub use messages::{confirm, dimmed, success, warn};
