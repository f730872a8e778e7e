//! Device directory resolution.
//!
//! The coordinating agent's deployment config lists the devices it manages
//! under `applications.<app_key>.DEVICE_MAP` as `{ device_id: display_name }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::document::Document;

/// Field holding the device map inside the dashboard's application entry.
pub const DEVICE_MAP_FIELD: &str = "DEVICE_MAP";

/// Top-level field holding per-application configuration.
pub const APPLICATIONS_FIELD: &str = "applications";

/// A managed device as listed in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
}

impl Device {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Resolve the ordered device set from a configuration snapshot.
///
/// Entries keep the map's document order. The entry keyed by `self_id` (the
/// coordinating agent itself) is skipped. A missing or non-object device map
/// yields an empty list.
pub fn resolve_devices(config: &Document, app_key: &str, self_id: Option<&str>) -> Vec<Device> {
    let device_map = config.lookup(&[APPLICATIONS_FIELD, app_key, DEVICE_MAP_FIELD]);
    log::debug!("device map for {}: {:?}", app_key, device_map);

    let Some(entries) = device_map.and_then(Value::as_object) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter(|(id, _)| Some(id.as_str()) != self_id)
        .map(|(id, name)| {
            // Names are expected to be strings; anything else shows the id.
            let name = name.as_str().unwrap_or(id);
            Device::new(id.clone(), name)
        })
        .collect()
}
