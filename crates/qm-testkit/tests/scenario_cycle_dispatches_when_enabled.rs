//! Full cycle with should_run=true.
//!
//! GREEN when:
//! - SteelPlate min 50, 20 on hand, 10 queued -> exactly one request for 20
//! - queued units come only from assemblers in assembly mode
//! - suffixed blueprints are requested under their blueprint name

use qm_reconcile::{DispatchMode, InventorySource, ProductionQueueSource};
use qm_runtime::{QuotaMonitor, SettingsSource};
use qm_testkit::*;

#[test]
fn scenario_plate_deficit_is_dispatched_once() {
    let mut monitor = QuotaMonitor::new(definition(&[("SteelPlate", 0)]));
    let mut store = MemoryConfigStore::new(&custom_data(true, &[("SteelPlate", 50)]));
    let cargo = FakeInventory::new().with_units("SteelPlate", 20);
    let asm = FakeAssembler::assembling().queued("SteelPlate", 10);
    let mut dispatcher = RecordingDispatcher::new();

    let inventories: [&dyn InventorySource; 1] = [&cargo];
    let queues: [&dyn ProductionQueueSource; 1] = [&asm];
    let out = monitor.run_cycle(&mut store, &inventories, &queues, &mut dispatcher);

    assert_eq!(out.settings_source, SettingsSource::Loaded);
    assert_eq!(out.mode(), DispatchMode::Enabled);
    assert!(!out.has_config_error());

    let line = out.report.line(&component("SteelPlate")).unwrap();
    assert_eq!(line.deficit, 20);

    assert_eq!(dispatcher.requests.len(), 1);
    assert_eq!(dispatcher.requests[0].quantity, 20);
    assert_eq!(dispatcher.requests[0].blueprint.subtype, "SteelPlate");
    assert_eq!(out.dispatch.dispatched, dispatcher.requests);
}

#[test]
fn scenario_disassembling_assembler_does_not_cover_deficit() {
    let mut monitor = QuotaMonitor::new(definition(&[("Computer", 0), ("Motor", 0)]));
    let mut store = MemoryConfigStore::new(&custom_data(true, &[("Computer", 10), ("Motor", 4)]));
    let building = FakeAssembler::assembling().queued("ComputerComponent", 6);
    let scrapping = FakeAssembler::disassembling().queued("MotorComponent", 4);
    let mut dispatcher = RecordingDispatcher::new();

    let queues: [&dyn ProductionQueueSource; 2] = [&building, &scrapping];
    let out = monitor.run_cycle(&mut store, &[], &queues, &mut dispatcher);

    let computer = out.report.line(&component("Computer")).unwrap();
    assert_eq!((computer.queued, computer.deficit), (6, 4));
    let motor = out.report.line(&component("Motor")).unwrap();
    assert_eq!((motor.queued, motor.deficit), (0, 4));

    let requested: Vec<(String, i64)> = dispatcher
        .requests
        .iter()
        .map(|r| (r.blueprint.subtype.clone(), r.quantity))
        .collect();
    assert_eq!(
        requested,
        vec![
            ("ComputerComponent".to_string(), 4),
            ("MotorComponent".to_string(), 4)
        ]
    );
}

#[test]
fn scenario_surplus_generates_no_dispatch() {
    let mut monitor = QuotaMonitor::new(definition(&[("SteelPlate", 0)]));
    let mut store = MemoryConfigStore::new(&custom_data(true, &[("SteelPlate", 50)]));
    let cargo = FakeInventory::new().with_units("SteelPlate", 60);
    let mut dispatcher = RecordingDispatcher::new();

    let inventories: [&dyn InventorySource; 1] = [&cargo];
    let out = monitor.run_cycle(&mut store, &inventories, &[], &mut dispatcher);

    assert_eq!(out.report.line(&component("SteelPlate")).unwrap().deficit, -10);
    assert_eq!(dispatcher.calls(), 0);
    assert!(out.plan.requests.is_empty());
}

#[test]
fn scenario_rejected_request_does_not_abort_cycle() {
    let mut monitor = QuotaMonitor::new(definition(&[("Computer", 0), ("SteelPlate", 0)]));
    let mut store =
        MemoryConfigStore::new(&custom_data(true, &[("Computer", 3), ("SteelPlate", 3)]));
    let mut dispatcher = RecordingDispatcher::rejecting("ComputerComponent");

    let out = monitor.run_cycle(&mut store, &[], &[], &mut dispatcher);

    assert_eq!(dispatcher.calls(), 2);
    assert_eq!(out.dispatch.failed.len(), 1);
    assert_eq!(out.dispatch.dispatched.len(), 1);
    assert_eq!(out.dispatch.dispatched[0].kind, component("SteelPlate"));
}

#[test]
fn scenario_fractional_stacks_summed_before_truncation() {
    use qm_reconcile::{BlueprintResolver, InventoryItem};

    let mut monitor = QuotaMonitor::new(definition(&[("Motor", 0), ("SteelPlate", 0)]));
    assert_eq!(monitor.blueprints().len(), 2);
    assert_eq!(
        monitor
            .blueprints()
            .resolve(&component("Motor"))
            .map(|b| b.subtype),
        Some("MotorComponent".to_string())
    );

    let half_and_some = InventoryItem {
        kind: component("SteelPlate"),
        amount_micros: 1_500_000,
    };
    let cargo_a = FakeInventory::new().with_item(half_and_some.clone());
    let cargo_b = FakeInventory::new().with_item(half_and_some);
    let mut store = MemoryConfigStore::new(&custom_data(true, &[("Motor", 0), ("SteelPlate", 5)]));
    let mut dispatcher = RecordingDispatcher::new();

    let inventories: [&dyn InventorySource; 2] = [&cargo_a, &cargo_b];
    let out = monitor.run_cycle(&mut store, &inventories, &[], &mut dispatcher);

    let line = out.report.line(&component("SteelPlate")).unwrap();
    assert_eq!(line.available, 3, "1.5 + 1.5 counts as 3, not 1 + 1");
    assert_eq!(dispatcher.requests[0].quantity, 2);
}
