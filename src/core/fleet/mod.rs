//! Fleet maintenance view.
//!
//! Resolves the device directory from the coordinating agent's config,
//! subscribes to every device's tags, and keeps a sorted, live view of the
//! fleet's service state.

pub mod directory;
pub mod dispatcher;
pub mod refresh;
pub mod runtime;
pub mod subscription;
pub mod view;

pub use directory::{resolve_devices, Device};
pub use dispatcher::{reset_service_payload, CommandFuture, CommandSettled, CommandSink, RowDispatcher};
pub use refresh::{RefreshClock, RefreshTick, REFRESH_PERIOD};
pub use runtime::{
    run_orchestrator, DashboardRuntime, DashboardSnapshot, RowView, RuntimeSettings, UiCommand,
};
pub use subscription::{
    ChannelSnapshot, DeviceUpdate, SubscriptionAdapter, SubscriptionSet, TagChannel,
    DEPLOYMENT_CONFIG_CHANNEL, TAG_VALUES_CHANNEL,
};
pub use view::{compute_sorted_view, tag_value, DeviceState, DisplayValues, FleetView};
