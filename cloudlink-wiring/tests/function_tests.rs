#![cfg(feature = "cloud")]

use cloudlink_protocol::mock::MockEngine;
use cloudlink_wiring::{Cloud, CloudConfig, FUNCTION_FAILED, function_name};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn setup() -> (Arc<MockEngine>, Cloud) {
    let engine = Arc::new(MockEngine::new());
    let cloud = Cloud::new(engine.clone(), CloudConfig::default());
    (engine, cloud)
}

fn parse_level(arg: &str) -> i32 {
    arg.trim().parse().unwrap_or(-2)
}

fn always_panics(_arg: &str) -> i32 {
    panic!("boom")
}

// ── Function pointers ────────────────────────────────────────────

#[test]
fn plain_function_receives_argument() {
    let (engine, cloud) = setup();
    assert!(cloud.function("level", parse_level));
    assert_eq!(engine.call_function("level", "42"), Some(42));
    assert_eq!(engine.call_function("level", "nope"), Some(-2));
}

#[test]
fn plain_function_panic_reports_failure() {
    let (engine, cloud) = setup();
    assert!(cloud.function("explode", always_panics));
    assert_eq!(engine.call_function("explode", ""), Some(FUNCTION_FAILED));
}

// ── Closures ─────────────────────────────────────────────────────

#[test]
fn closure_keeps_its_state_between_calls() {
    let (engine, cloud) = setup();
    let mut total = 0;
    assert!(cloud.function_with("add", move |arg| {
        total += arg.parse::<i32>().unwrap_or(0);
        total
    }));
    assert_eq!(engine.call_function("add", "5"), Some(5));
    assert_eq!(engine.call_function("add", "7"), Some(12));
}

#[test]
fn closure_sees_empty_argument() {
    let (engine, cloud) = setup();
    cloud.function_with("len", |arg| arg.len() as i32);
    assert_eq!(engine.call_function("len", ""), Some(0));
}

#[test]
fn closure_panic_reports_failure_and_stays_callable() {
    let (engine, cloud) = setup();
    cloud.function_with("maybe", |arg| {
        if arg == "panic" {
            panic!("requested");
        }
        1
    });
    assert_eq!(engine.call_function("maybe", "panic"), Some(FUNCTION_FAILED));
    assert_eq!(engine.call_function("maybe", "ok"), Some(1));
}

#[test]
fn rejected_closure_is_dropped() {
    let (_engine, cloud) = setup();
    let witness = Arc::new(());
    let held = Arc::clone(&witness);
    assert!(!cloud.function_with("name_too_long_here", move |_| {
        let _ = &held;
        0
    }));
    assert_eq!(Arc::strong_count(&witness), 1);
}

#[test]
fn accepted_closure_is_retained() {
    let (_engine, cloud) = setup();
    let witness = Arc::new(());
    let held = Arc::clone(&witness);
    assert!(cloud.function_with("kept", move |_| {
        let _ = &held;
        0
    }));
    assert_eq!(Arc::strong_count(&witness), 2);
}

#[test]
fn closure_calls_from_many_threads_are_serialized() {
    let (engine, cloud) = setup();
    let mut count = 0;
    assert!(cloud.function_with("inc", move |_| {
        count += 1;
        count
    }));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                for _ in 0..10_000 {
                    engine.call_function("inc", "");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.call_function("inc", ""), Some(40_001));
}

// ── Bound methods ────────────────────────────────────────────────

#[derive(Default)]
struct Dimmer {
    level: i32,
    calls: usize,
}

impl Dimmer {
    fn set(&mut self, arg: &str) -> i32 {
        self.calls += 1;
        match arg.parse() {
            Ok(level) if (0..=100).contains(&level) => {
                self.level = level;
                level
            }
            _ => -1,
        }
    }
}

#[test]
fn method_mutates_shared_instance() {
    let (engine, cloud) = setup();
    let dimmer = Arc::new(Mutex::new(Dimmer::default()));
    assert!(cloud.function_method("dim", Arc::clone(&dimmer), Dimmer::set));

    assert_eq!(engine.call_function("dim", "75"), Some(75));
    assert_eq!(engine.call_function("dim", "250"), Some(-1));

    let dimmer = dimmer.lock().unwrap();
    assert_eq!(dimmer.level, 75);
    assert_eq!(dimmer.calls, 2);
}

// ── Names ────────────────────────────────────────────────────────

#[test]
fn duplicate_and_oversized_names_are_rejected() {
    let (_engine, cloud) = setup();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    assert!(cloud.function_with(function_name!("twelve_chars"), move |_| {
        counter.fetch_add(1, Ordering::SeqCst) as i32
    }));
    assert!(!cloud.function("twelve_chars", parse_level));
    assert!(!cloud.function("thirteen_char", parse_level));
    assert!(!cloud.function("", parse_level));
}

#[test]
fn nul_in_name_is_rejected() {
    let (engine, cloud) = setup();
    assert!(!cloud.function("a\0b", parse_level));
    assert!(!engine.has_function("a"));
}
