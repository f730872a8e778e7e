//! Terminal dashboard for fleet maintenance status.
//!
//! Renders the runtime's snapshots as a table using ratatui and forwards
//! reset requests back to the runtime.

mod app;
mod event_handler;
mod render;

pub use app::{run_dashboard_app, DashboardApp};
pub use event_handler::DashboardEvent;
