use cloudlink_types::{NO_ACK, PRIVATE, PUBLIC, PublishFlag, PublishFlags, WITH_ACK};
use proptest::prelude::*;
use std::str::FromStr;

// ── Defaults ─────────────────────────────────────────────────────

#[test]
fn default_is_public() {
    let flags = PublishFlags::default();
    assert_eq!(flags, PublishFlags::PUBLIC);
    assert_eq!(flags, PublishFlags::from(PUBLIC));
    assert_eq!(flags.bits(), 0);
    assert!(flags.is_public());
}

#[test]
fn engine_bit_values() {
    assert_eq!(PUBLIC.bits(), 0x00);
    assert_eq!(PRIVATE.bits(), 0x01);
    assert_eq!(NO_ACK.bits(), 0x02);
    assert_eq!(WITH_ACK.bits(), 0x08);
}

// ── Composition ──────────────────────────────────────────────────

#[test]
fn combined_flags_differ_from_each_alone_and_default() {
    let combined = PRIVATE | WITH_ACK;
    assert_ne!(combined, PublishFlags::from(PRIVATE));
    assert_ne!(combined, PublishFlags::from(WITH_ACK));
    assert_ne!(combined, PublishFlags::default());
    assert_eq!(combined.bits(), 0x09);
}

#[test]
fn flag_or_set_and_set_or_flag_agree() {
    let set = PublishFlags::from(NO_ACK);
    assert_eq!(PRIVATE | set, set | PRIVATE);
}

#[test]
fn or_assign_accumulates() {
    let mut flags = PublishFlags::default();
    flags |= PRIVATE;
    flags |= PublishFlags::from(NO_ACK);
    assert!(flags.contains(PRIVATE));
    assert!(flags.contains(NO_ACK));
    assert!(!flags.contains(WITH_ACK));
    assert!(!flags.is_public());
}

#[test]
fn public_is_contained_everywhere() {
    assert!(PublishFlags::default().contains(PUBLIC));
    assert!((PRIVATE | NO_ACK).contains(PUBLIC));
}

#[test]
fn iter_lists_named_flags_only() {
    let flags = PRIVATE | WITH_ACK;
    let listed: Vec<PublishFlag> = flags.iter().collect();
    assert_eq!(listed, vec![PublishFlag::Private, PublishFlag::WithAck]);
    assert_eq!(PublishFlags::default().iter().count(), 0);
}

// ── Display / FromStr ────────────────────────────────────────────

#[test]
fn display_public_and_composed() {
    assert_eq!(PublishFlags::default().to_string(), "public");
    assert_eq!((PRIVATE | NO_ACK).to_string(), "private|no_ack");
}

#[test]
fn parse_composed() {
    let flags = PublishFlags::from_str("private|with_ack").unwrap();
    assert_eq!(flags, PRIVATE | WITH_ACK);
    assert_eq!(PublishFlags::from_str("public").unwrap(), PublishFlags::PUBLIC);
}

#[test]
fn parse_unknown_flag_fails() {
    assert!(PublishFlags::from_str("private|loud").is_err());
    assert!(PublishFlag::from_str("").is_err());
}

#[test]
fn serde_is_raw_bits() {
    let json = serde_json::to_string(&(PRIVATE | WITH_ACK)).unwrap();
    assert_eq!(json, "9");
    let parsed: PublishFlags = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, PRIVATE | WITH_ACK);
}

// ── Properties ───────────────────────────────────────────────────

fn flag_strategy() -> impl Strategy<Value = PublishFlag> {
    prop_oneof![
        Just(PublishFlag::Public),
        Just(PublishFlag::Private),
        Just(PublishFlag::NoAck),
        Just(PublishFlag::WithAck),
    ]
}

proptest! {
    /// Composition is commutative.
    #[test]
    fn or_is_commutative(a in flag_strategy(), b in flag_strategy()) {
        prop_assert_eq!(a | b, b | a);
    }

    /// Composition is idempotent.
    #[test]
    fn or_is_idempotent(a in flag_strategy(), b in flag_strategy()) {
        let once = a | b;
        prop_assert_eq!(once | a, once);
        prop_assert_eq!(once | once, once);
    }

    /// Every composed flag is contained in the result.
    #[test]
    fn or_contains_both(a in flag_strategy(), b in flag_strategy()) {
        let flags = a | b;
        prop_assert!(flags.contains(a));
        prop_assert!(flags.contains(b));
    }

    /// Display and FromStr agree.
    #[test]
    fn display_parses_back(a in flag_strategy(), b in flag_strategy()) {
        let flags = a | b;
        prop_assert_eq!(flags.to_string().parse::<PublishFlags>().unwrap(), flags);
    }
}
