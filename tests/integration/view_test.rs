use mdash::core::document::Document;
use mdash::core::fleet::{Device, DeviceState, FleetView};
use serde_json::json;

const NS: &str = "maintenance_manager_1";

fn directory() -> Vec<Device> {
    vec![
        Device::new("B", "Truck 2"),
        Device::new("C", "Truck 3"),
        Device::new("D", "Truck 4"),
    ]
}

fn report(next_service_est: Option<f64>) -> DeviceState {
    let tags = match next_service_est {
        Some(ms) => json!({ "next_service_est": ms, "hours_till_next_service": 4.4 }),
        None => json!({ "hours_till_next_service": 9 }),
    };
    DeviceState::loaded(Document::new(json!({ NS: tags })))
}

fn order(view: &FleetView) -> Vec<String> {
    view.sorted().iter().map(|d| d.id.clone()).collect()
}

fn updates() -> Vec<(&'static str, DeviceState)> {
    vec![
        ("B", report(Some(2_000.0))),
        ("C", report(Some(1_000.0))),
        ("D", report(None)),
    ]
}

#[test]
fn test_arrival_order_does_not_change_result() {
    let permutations: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    for permutation in permutations {
        let mut view = FleetView::new(NS);
        view.set_directory(directory());
        let all = updates();
        for index in permutation {
            let (id, state) = all[index].clone();
            view.apply_device_update(id, state);
        }
        assert_eq!(order(&view), vec!["C", "B", "D"], "permutation {:?}", permutation);
    }
}

#[test]
fn test_display_values_follow_namespace() {
    let mut view = FleetView::new(NS);
    view.set_directory(directory());
    view.apply_device_update("B", report(Some(5.0)));

    let values = view.display_values("B");
    assert!(!values.is_loading);
    assert_eq!(values.next_service_est, Some(5.0));
    assert_eq!(values.hours_till_next_service, Some(4.4));
    assert_eq!(values.kms_till_next_service, None);

    // Same aggregate read under another namespace shows nothing.
    let mut other = FleetView::new("other_manager");
    other.set_directory(directory());
    other.apply_device_update("B", report(Some(5.0)));
    assert_eq!(other.display_values("B").next_service_est, None);
}

#[test]
fn test_repeated_identical_reports_do_not_bump_revision() {
    let mut view = FleetView::new(NS);
    view.set_directory(directory());
    let state = report(Some(1.0));

    assert!(view.apply_device_update("B", state.clone()));
    let revision = view.revision();
    assert!(!view.apply_device_update("B", state));
    assert_eq!(view.revision(), revision);
}

#[test]
fn test_directory_shrink_drops_state() {
    let mut view = FleetView::new(NS);
    view.set_directory(directory());
    for (id, state) in updates() {
        view.apply_device_update(id, state);
    }

    view.set_directory(vec![Device::new("D", "Truck 4")]);
    assert_eq!(order(&view), vec!["D"]);
    assert_eq!(view.state_count(), 1);
    assert!(view.state("B").is_none());

    // A late report from a removed device is ignored.
    assert!(!view.apply_device_update("B", report(Some(1.0))));
    assert_eq!(order(&view), vec!["D"]);
}
