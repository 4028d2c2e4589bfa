//! Comprehensive property-based tests for pre-commit hook
//!
//! Covers the pure decision layers with proptest, designed to run fast as
//! a quality gate:
//!
//! 1. Policy evaluation totality and tri-state threshold semantics
//! 2. Rate limiter behavior over arbitrary timelines
//! 3. Filename encoding safety for arbitrary tracee paths
//! 4. Payload serialization round-trips

use proptest::prelude::*;

use recuerdo::persist::{encode_path_component, snapshot_file_name};
use recuerdo::value::capture_value;
use recuerdo::{policy, rate, CaptureConfig, Payload, TrackedSet, ValueId};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_policy_is_total_over_thresholds(
        threshold in i64::MIN / 2..i64::MAX / 2,
        value in any::<i64>(),
    ) {
        // Property: evaluate never panics, whatever the configured threshold
        let config = CaptureConfig::new("t.rs").with_min_object_size(threshold);
        let verdict = policy::evaluate(ValueId::of(&value), &value, &config, &TrackedSet::new());

        if threshold < 0 {
            // Explicit-only mode admits nothing untracked
            prop_assert!(!verdict.is_include());
        } else if threshold <= 8 {
            // An i64 reports 8 bytes and is a recognized builtin kind
            prop_assert!(verdict.is_include());
        } else {
            prop_assert!(!verdict.is_include());
        }
    }

    #[test]
    fn prop_tracked_identity_always_wins(threshold in any::<i64>(), value in any::<i64>()) {
        // Property: explicit tracking overrides every threshold, negative included
        let config = CaptureConfig::new("t.rs").with_min_object_size(threshold);
        let mut tracked = TrackedSet::new();
        tracked.insert(ValueId::of(&value));
        let verdict = policy::evaluate(ValueId::of(&value), &value, &config, &tracked);
        prop_assert!(verdict.is_include());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_rate_limiter_tri_state(
        frequency_ms in -10_000i64..10_000,
        last in proptest::option::of(0u64..u64::MAX / 2),
        now in 0u64..u64::MAX / 2,
    ) {
        let ready = rate::ready_to_capture(frequency_ms, last, now);

        match (frequency_ms, last) {
            // Zero frequency fires on every trigger
            (0, _) => prop_assert!(ready),
            // No capture recorded yet: always ready, even in manual-only mode
            (_, None) => prop_assert!(ready),
            // Manual-only mode never fires again
            (f, Some(_)) if f < 0 => prop_assert!(!ready),
            // Positive window honored exactly
            (f, Some(last)) => {
                prop_assert_eq!(ready, now.saturating_sub(last) >= f as u64);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_encoded_component_is_filesystem_safe(component in ".*") {
        let encoded = encode_path_component(&component);
        let all_safe = encoded.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '~' | '+' | '%')
        });
        prop_assert!(all_safe);
        prop_assert!(!encoded.contains('/'));
    }

    #[test]
    fn prop_file_name_is_one_component(
        tracee in ".*",
        label in ".*",
        timestamp_ms in any::<u64>(),
        sequence in any::<u64>(),
    ) {
        let name = snapshot_file_name(&tracee, &label, timestamp_ms, sequence);
        prop_assert!(!name.contains('/'));
        prop_assert!(!name.contains('\0'));
        prop_assert!(name.ends_with(".snap"));
    }
}

fn arbitrary_payload() -> impl Strategy<Value = Payload> {
    proptest::collection::vec(("[a-z_][a-z0-9_]{0,12}", any::<i64>()), 0..8).prop_map(|entries| {
        let mut payload = Payload::new();
        for (name, value) in entries {
            let captured = capture_value(&name, &value).unwrap();
            payload.insert(name, captured);
        }
        payload
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_payload_round_trips_through_envelope_encoding(payload in arbitrary_payload()) {
        // Property: serialize/deserialize preserves key set, order, and values
        let bytes = rmp_serde::to_vec_named(&payload).unwrap();
        let restored: Payload = rmp_serde::from_slice(&bytes).unwrap();

        let before: Vec<&str> = payload.names().collect();
        let after: Vec<&str> = restored.names().collect();
        prop_assert_eq!(before, after);
        for (name, value) in payload.iter() {
            prop_assert_eq!(restored.get(name), Some(value));
        }
    }

    #[test]
    fn prop_captured_integers_preserve_value(n in any::<i64>()) {
        let captured = capture_value("n", &n).unwrap();
        prop_assert_eq!(captured.data, serde_json::json!(n));
        prop_assert_eq!(captured.size_bytes, 8);
    }
}
