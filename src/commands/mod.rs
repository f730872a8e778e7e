// Command handlers module
pub mod completions;
pub mod config;
pub mod options;
pub mod snapshot;
pub mod version;
pub mod watch;

// Re-exports for cleaner imports
pub use snapshot::execute as snapshot;
pub use version::execute as version;
pub use watch::execute as watch;
