mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use alira::actuator::{DeviceActuator, DeviceAction, DeviceIntent, FleetAction};
use alira::config::Config;
use alira::error::Error;
use common::FakeRelay;

fn actuator_with(fake: Arc<FakeRelay>) -> DeviceActuator {
    DeviceActuator::new(&Config::default(), fake).unwrap()
}

#[tokio::test]
async fn idempotent_on_issues_no_write() {
    // Relay 2 ("light") already on.
    let fake = Arc::new(FakeRelay::with_state(0b0100));
    let actuator = actuator_with(fake.clone());

    let result = actuator
        .execute_one(&DeviceIntent::new("light", DeviceAction::On))
        .await;

    assert!(result.skipped);
    assert!(result.ok());
    assert_eq!(result.pre_state, Some(true));
    assert_eq!(result.post_state, Some(true));
    assert_eq!(result.http_status, None);
    assert_eq!(fake.writes(), 0, "no write call for an idempotent command");
}

#[tokio::test]
async fn unknown_device_is_config_error_without_network() {
    let fake = Arc::new(FakeRelay::with_state(0));
    let actuator = actuator_with(fake.clone());

    let result = actuator
        .execute_one(&DeviceIntent::new("heater", DeviceAction::On))
        .await;

    assert!(result.skipped);
    assert!(matches!(result.error, Some(Error::Config(_))));
    assert_eq!(
        fake.status_calls.load(Ordering::SeqCst),
        0,
        "config errors never reach the wire"
    );
    assert_eq!(fake.writes(), 0);
}

#[tokio::test]
async fn partial_batch_failure_is_isolated() {
    // Relay 3 ("fan") fails transiently; lamp (0) and bulb (1) are fine.
    let fake = Arc::new(FakeRelay::failing(0b0010, &[3]));
    let actuator = actuator_with(fake.clone());

    let intents = vec![
        DeviceIntent::new("lamp", DeviceAction::On),
        DeviceIntent::new("fan", DeviceAction::On),
        DeviceIntent::new("bulb", DeviceAction::Off),
    ];
    let results = actuator.execute(&intents).await;

    assert_eq!(results.len(), 3, "every intent reports, regardless of siblings");

    assert!(results[0].ok());
    assert_eq!(results[0].pre_state, Some(false));
    assert_eq!(results[0].post_state, Some(true));
    assert_eq!(results[0].http_status, Some(200));

    assert!(matches!(results[1].error, Some(Error::TransientNetwork(_))));
    assert!(!results[1].skipped);
    assert_eq!(results[1].post_state, None);

    assert!(results[2].ok());
    assert!(!results[2].skipped);
    assert_eq!(results[2].pre_state, Some(true));
    assert_eq!(results[2].post_state, Some(false));
}

#[tokio::test]
async fn toggle_reports_pre_and_post_state() {
    let fake = Arc::new(FakeRelay::with_state(0));
    let actuator = actuator_with(fake.clone());

    let result = actuator
        .execute_one(&DeviceIntent::new("bulb", DeviceAction::Toggle))
        .await;

    assert!(result.ok());
    assert!(!result.skipped);
    assert_eq!(result.pre_state, Some(false));
    assert_eq!(result.post_state, Some(true));
    assert_eq!(fake.toggle_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn status_intent_never_writes() {
    let fake = Arc::new(FakeRelay::with_state(0b1000));
    let actuator = actuator_with(fake.clone());

    let result = actuator
        .execute_one(&DeviceIntent::new("fan", DeviceAction::Status))
        .await;

    assert!(result.skipped);
    assert_eq!(result.pre_state, Some(true));
    assert_eq!(result.post_state, Some(true));
    assert_eq!(fake.writes(), 0);
}

#[tokio::test]
async fn fleet_all_off_is_idempotent() {
    let fake = Arc::new(FakeRelay::with_state(0));
    let actuator = actuator_with(fake.clone());

    let results = actuator.execute_fleet(FleetAction::AllOff).await;

    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r.skipped && r.ok()));
    assert!(results
        .iter()
        .all(|r| r.pre_state == Some(false) && r.post_state == Some(false)));
    assert_eq!(fake.scene_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fleet_idempotency_ignores_unmapped_relays() {
    // Only relays 0 and 1 are mapped; relay 2 is on but not ours.
    let mut config = Config::default();
    config.devices = [("lamp".to_string(), 0u8), ("bulb".to_string(), 1u8)]
        .into_iter()
        .collect();
    let fake = Arc::new(FakeRelay::with_state(0b0100));
    let actuator = DeviceActuator::new(&config, fake.clone()).unwrap();

    let results = actuator.execute_fleet(FleetAction::AllOff).await;

    assert!(results.iter().all(|r| r.skipped && r.ok()));
    assert_eq!(
        fake.scene_calls.load(Ordering::SeqCst),
        0,
        "mapped relays already off, so no scene write"
    );
}

#[tokio::test]
async fn fleet_all_on_writes_once_and_reports_per_device() {
    // Relay 0 already on; the rest off.
    let fake = Arc::new(FakeRelay::with_state(0b0001));
    let actuator = actuator_with(fake.clone());

    let results = actuator.execute_fleet(FleetAction::AllOn).await;

    assert_eq!(fake.scene_calls.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| r.post_state == Some(true)));

    // lamp and switch1 share relay 0, which was already on.
    for r in &results {
        let already_on = r.device == "lamp" || r.device == "switch1";
        assert_eq!(r.skipped, already_on, "device {}", r.device);
    }
}

#[tokio::test]
async fn fleet_status_reads_without_writing() {
    let fake = Arc::new(FakeRelay::with_state(0b0101));
    let actuator = actuator_with(fake.clone());

    let results = actuator.execute_fleet(FleetAction::Status).await;

    assert!(results.iter().all(|r| r.skipped && r.ok()));
    assert_eq!(fake.writes(), 0);

    let light = results.iter().find(|r| r.device == "light").unwrap();
    assert_eq!(light.pre_state, Some(true));
    let fan = results.iter().find(|r| r.device == "fan").unwrap();
    assert_eq!(fan.pre_state, Some(false));
}

#[tokio::test]
async fn every_classifier_device_name_resolves() {
    let fake = Arc::new(FakeRelay::with_state(0));
    let actuator = actuator_with(fake);

    for name in actuator.device_names() {
        assert!(
            actuator.relay_index(&name).is_some(),
            "vocabulary name '{name}' must map to a relay"
        );
    }
}
