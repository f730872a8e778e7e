//! Aggregation and sort view.
//!
//! Holds the latest state reported by every device in the directory and
//! derives the sorted device order from it. The sort is a pure function of
//! the current directory and state map, so the result does not depend on the
//! order in which per-device updates arrived.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::directory::Device;
use crate::core::document::Document;

/// Predicted time of the next service, epoch milliseconds.
pub const NEXT_SERVICE_EST: &str = "next_service_est";
/// Engine hours left until the next service.
pub const HOURS_TILL_NEXT_SERVICE: &str = "hours_till_next_service";
/// Distance left until the next service, kilometres.
pub const KMS_TILL_NEXT_SERVICE: &str = "kms_till_next_service";
/// Time of the last service, epoch milliseconds.
pub const LAST_SERVICE_DATE: &str = "last_service_date";

/// Latest reported state of one device.
#[derive(Debug, Clone)]
pub struct DeviceState {
    pub aggregate: Option<Arc<Document>>,
    pub is_loading: bool,
}

impl DeviceState {
    pub fn new(aggregate: Option<Arc<Document>>, is_loading: bool) -> Self {
        Self {
            aggregate,
            is_loading,
        }
    }

    /// State of a device that has not reported yet.
    pub fn loading() -> Self {
        Self::new(None, true)
    }

    pub fn loaded(aggregate: Document) -> Self {
        Self::new(Some(Arc::new(aggregate)), false)
    }

    /// Same aggregate (pointer or value) and same loading flag.
    pub fn same_as(&self, other: &DeviceState) -> bool {
        if self.is_loading != other.is_loading {
            return false;
        }
        match (&self.aggregate, &other.aggregate) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::loading()
    }
}

/// The values a row displays for one device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayValues {
    pub next_service_est: Option<f64>,
    pub hours_till_next_service: Option<f64>,
    pub kms_till_next_service: Option<f64>,
    pub last_service_date: Option<f64>,
    pub is_loading: bool,
}

impl Default for DisplayValues {
    fn default() -> Self {
        Self::from_state(None, "")
    }
}

impl DisplayValues {
    fn from_state(state: Option<&DeviceState>, namespace: &str) -> Self {
        let aggregate = state.and_then(|s| s.aggregate.as_deref());
        Self {
            next_service_est: tag_value(aggregate, namespace, NEXT_SERVICE_EST),
            hours_till_next_service: tag_value(aggregate, namespace, HOURS_TILL_NEXT_SERVICE),
            kms_till_next_service: tag_value(aggregate, namespace, KMS_TILL_NEXT_SERVICE),
            last_service_date: tag_value(aggregate, namespace, LAST_SERVICE_DATE),
            // Devices that never reported are loading, not empty.
            is_loading: state.map_or(true, |s| s.is_loading),
        }
    }
}

/// Read `aggregate.<namespace>.<tag>` as a number.
pub fn tag_value(aggregate: Option<&Document>, namespace: &str, tag: &str) -> Option<f64> {
    aggregate?.number(&[namespace, tag])
}

/// Order `devices` by `next_service_est`, soonest first.
///
/// Devices without an estimate go last and keep their directory order.
/// Only devices present in `devices` appear in the result.
pub fn compute_sorted_view(
    devices: &[Device],
    states: &HashMap<String, DeviceState>,
    namespace: &str,
) -> Vec<Device> {
    let mut keyed: Vec<(Option<f64>, &Device)> = devices
        .iter()
        .map(|device| {
            let aggregate = states.get(&device.id).and_then(|s| s.aggregate.as_deref());
            (tag_value(aggregate, namespace, NEXT_SERVICE_EST), device)
        })
        .collect();

    // slice::sort_by is stable, ties keep input order
    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.total_cmp(b),
    });

    keyed.into_iter().map(|(_, device)| device.clone()).collect()
}

type ViewObserver = Box<dyn FnMut(u64, &[Device]) + Send>;

/// Device id → state mapping plus the derived sorted order.
pub struct FleetView {
    namespace: String,
    devices: Vec<Device>,
    states: HashMap<String, DeviceState>,
    sorted: Vec<Device>,
    dirty: bool,
    revision: u64,
    observers: Vec<ViewObserver>,
}

impl FleetView {
    /// Create an empty view reading tags under `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            devices: Vec::new(),
            states: HashMap::new(),
            sorted: Vec::new(),
            dirty: false,
            revision: 0,
            observers: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Current directory, in directory order.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Current devices in display order.
    pub fn sorted(&self) -> &[Device] {
        &self.sorted
    }

    /// Number of accepted mutations so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn state(&self, device_id: &str) -> Option<&DeviceState> {
        self.states.get(device_id)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Register an observer called with the new revision and sorted order
    /// after every accepted mutation.
    pub fn on_change<F>(&mut self, observer: F)
    where
        F: FnMut(u64, &[Device]) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Replace the directory with the one from a newer configuration snapshot.
    ///
    /// State for devices that left the directory is dropped. Returns `false`
    /// if the directory is unchanged.
    pub fn set_directory(&mut self, devices: Vec<Device>) -> bool {
        if devices == self.devices {
            return false;
        }
        self.states
            .retain(|id, _| devices.iter().any(|device| &device.id == id));
        self.devices = devices;
        self.dirty = true;
        self.flush();
        true
    }

    /// Merge an update reported by a device's subscription.
    ///
    /// Identical updates and updates for devices outside the directory are
    /// ignored and return `false`.
    pub fn apply_device_update(&mut self, device_id: &str, state: DeviceState) -> bool {
        if !self.devices.iter().any(|device| device.id == device_id) {
            log::trace!("ignoring update for unknown device {}", device_id);
            return false;
        }
        if let Some(existing) = self.states.get(device_id) {
            if existing.same_as(&state) {
                return false;
            }
        }
        self.states.insert(device_id.to_string(), state);
        self.dirty = true;
        self.flush();
        true
    }

    /// Display values for one device; unknown devices read as loading.
    pub fn display_values(&self, device_id: &str) -> DisplayValues {
        DisplayValues::from_state(self.states.get(device_id), &self.namespace)
    }

    fn flush(&mut self) {
        if !self.dirty {
            return;
        }
        self.sorted = compute_sorted_view(&self.devices, &self.states, &self.namespace);
        self.dirty = false;
        self.revision += 1;
        for observer in &mut self.observers {
            observer(self.revision, &self.sorted);
        }
    }
}
