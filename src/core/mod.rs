// Core business logic module

pub mod channels;
pub mod config;
pub mod document;
pub mod fleet;

// Re-export commonly used items
pub use channels::ChannelHub;
pub use config::{DashboardConfig, FeedSource, WidgetConfig};
pub use document::Document;
