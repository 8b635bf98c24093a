#![cfg(feature = "cloud")]

use cloudlink_protocol::c_str_or_empty;
use cloudlink_protocol::mock::{MockEngine, PublishOutcome, PublishedEvent, SubscriptionInfo};
use cloudlink_wiring::{
    Cloud, CloudConfig, EventScope, NO_ACK, OutgoingEvent, PRIVATE, PublishFlags,
    SubscriptionScope, WITH_ACK,
};
use pretty_assertions::assert_eq;
use std::ffi::c_char;
use std::sync::{Arc, Mutex};

fn setup() -> (Arc<MockEngine>, Cloud) {
    let engine = Arc::new(MockEngine::new());
    let cloud = Cloud::new(engine.clone(), CloudConfig::default());
    (engine, cloud)
}

fn connected() -> (Arc<MockEngine>, Cloud) {
    let (engine, cloud) = setup();
    engine.set_connected(true);
    (engine, cloud)
}

// ── Publish ──────────────────────────────────────────────────────

#[test]
fn publish_defaults_to_public_with_default_ttl() {
    let (engine, cloud) = connected();
    assert!(cloud.publish("boot").wait());
    assert_eq!(
        engine.published(),
        vec![PublishedEvent {
            name: "boot".into(),
            data: None,
            ttl: 60,
            flags: PublishFlags::default(),
        }]
    );
}

#[test]
fn publish_carries_data_ttl_and_flags() {
    let (engine, cloud) = connected();
    let event = OutgoingEvent::new("door")
        .with_data("open")
        .with_ttl(300)
        .with_flags(PRIVATE | WITH_ACK);
    assert!(cloud.publish_event(event).wait());

    let published = engine.published();
    assert_eq!(published[0].data.as_deref(), Some("open"));
    assert_eq!(published[0].ttl, 300);
    assert!(!published[0].flags.is_public());
    assert!(published[0].flags.contains(WITH_ACK));
}

#[test]
fn configured_ttl_applies_when_unset() {
    let engine = Arc::new(MockEngine::new());
    let config = CloudConfig {
        default_ttl: 120,
        ..CloudConfig::default()
    };
    let cloud = Cloud::new(engine.clone(), config);
    cloud.publish_data("reading", "42");
    assert_eq!(engine.published()[0].ttl, 120);
    assert_eq!(engine.published()[0].data.as_deref(), Some("42"));
}

#[test]
fn with_flags_accumulates() {
    let event = OutgoingEvent::new("x").with_flags(PRIVATE).with_flags(NO_ACK);
    assert_eq!(event.flags(), PRIVATE | NO_ACK);
    assert_eq!(event.ttl(), None);
    assert_eq!(event.data(), None);
    assert_eq!(event.name(), "x");
}

#[test]
fn publish_while_disconnected_resolves_false() {
    let (_engine, cloud) = setup();
    let mut future = cloud.publish("offline");
    assert_eq!(future.try_result(), Some(false));
}

#[tokio::test]
async fn deferred_publish_resolves_when_engine_acknowledges() {
    let (engine, cloud) = connected();
    engine.set_publish_outcome(PublishOutcome::Defer);
    let mut future = cloud.publish("slow");
    assert!(!future.is_done());
    engine.resolve_deferred(true);
    assert!(future.await);
}

// ── Subscribe ────────────────────────────────────────────────────

#[test]
fn closure_receives_name_and_payload() {
    let (engine, cloud) = setup();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    assert!(cloud.subscribe(
        "sensor/",
        move |name, data| sink.lock().unwrap().push((name.to_string(), data.to_string())),
        EventScope::AllDevices,
    ));

    engine.deliver_event("sensor/temp", Some("21.5"));
    engine.deliver_event("sensor/ping", None);
    engine.deliver_event("other", Some("ignored"));

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ("sensor/temp".to_string(), "21.5".to_string()),
            ("sensor/ping".to_string(), String::new()),
        ]
    );
}

#[test]
fn handler_panic_does_not_escape() {
    let (engine, cloud) = setup();
    cloud.subscribe("boom", |_, _| panic!("handler failed"), EventScope::AllDevices);
    assert_eq!(engine.deliver_event("boom", Some("x")), 1);
}

#[test]
fn concurrent_deliveries_are_serialized() {
    let (engine, cloud) = setup();
    let total = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&total);
    let mut local = 0usize;
    assert!(cloud.subscribe(
        "tick",
        move |_, _| {
            local += 1;
            *sink.lock().unwrap() = local;
        },
        EventScope::AllDevices,
    ));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                for _ in 0..5_000 {
                    engine.deliver_event("tick", None);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(*total.lock().unwrap(), 20_000);
}

static RAW_SEEN: Mutex<Vec<String>> = Mutex::new(Vec::new());

unsafe extern "C" fn raw_handler(name: *const c_char, data: *const c_char) {
    let name = unsafe { c_str_or_empty(name) };
    let data = unsafe { c_str_or_empty(data) };
    RAW_SEEN.lock().unwrap().push(format!("{name}={data}"));
}

#[test]
fn raw_handler_is_called_directly() {
    let (engine, cloud) = setup();
    assert!(cloud.subscribe_raw("raw", raw_handler, SubscriptionScope::MyDevices));
    engine.deliver_event("raw/a", Some("1"));
    assert_eq!(*RAW_SEEN.lock().unwrap(), vec!["raw/a=1".to_string()]);
    assert_eq!(engine.subscriptions()[0].scope, SubscriptionScope::MyDevices);
}

#[derive(Default)]
struct Tally {
    events: Vec<String>,
}

impl Tally {
    fn record(&mut self, name: &str, _data: &str) {
        self.events.push(name.to_string());
    }
}

#[test]
fn method_handler_updates_instance() {
    let (engine, cloud) = setup();
    let tally = Arc::new(Mutex::new(Tally::default()));
    assert!(cloud.subscribe_method("t", Arc::clone(&tally), Tally::record, EventScope::MyDevices));
    engine.deliver_event("t1", None);
    engine.deliver_event("t2", None);
    assert_eq!(tally.lock().unwrap().events, vec!["t1", "t2"]);
}

#[test]
fn device_scope_lowers_to_my_devices_with_id() {
    let (engine, cloud) = setup();
    cloud.subscribe("a", |_, _| {}, EventScope::AllDevices);
    cloud.subscribe("b", |_, _| {}, EventScope::Device("e00fce68".into()));
    assert_eq!(
        engine.subscriptions(),
        vec![
            SubscriptionInfo {
                prefix: "a".into(),
                scope: SubscriptionScope::AllDevices,
                device_id: None,
            },
            SubscriptionInfo {
                prefix: "b".into(),
                scope: SubscriptionScope::MyDevices,
                device_id: Some("e00fce68".into()),
            },
        ]
    );
}

#[test]
fn rejected_subscription_drops_handler() {
    let (engine, cloud) = setup();
    engine.set_subscription_limit(0);
    let witness = Arc::new(());
    let held = Arc::clone(&witness);
    assert!(!cloud.subscribe(
        "full",
        move |_, _| {
            let _ = &held;
        },
        EventScope::AllDevices,
    ));
    assert_eq!(Arc::strong_count(&witness), 1);
}

#[test]
fn unsubscribe_cancels_all() {
    let (engine, cloud) = setup();
    cloud.subscribe("a", |_, _| {}, EventScope::AllDevices);
    cloud.subscribe("b", |_, _| {}, EventScope::MyDevices);
    cloud.unsubscribe();
    assert!(engine.subscriptions().is_empty());
    assert_eq!(engine.unsubscribe_calls(), 1);
    assert_eq!(engine.deliver_event("a", None), 0);
}
