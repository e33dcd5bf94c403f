//! Property-based tests for rust_promtail_client using proptest

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_promtail_client::core::encoder;
use rust_promtail_client::prelude::*;
use rust_promtail_client::{canonicalize, sanitize_key, BatchAccumulator, Stream};
use std::collections::BTreeMap;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Disable),
    ]
}

fn any_labels() -> impl Strategy<Value = LabelSet> {
    prop::collection::btree_map("[a-zA-Z_.\\-/ ]{1,12}", ".{0,16}", 0..5)
        .prop_map(|map: BTreeMap<String, String>| map.into_iter().collect())
}

// ============================================================================
// Label Tests
// ============================================================================

proptest! {
    /// Sanitized keys only contain [A-Za-z0-9_] and keep their length in chars
    #[test]
    fn test_sanitize_key_charset(key in ".{0,32}") {
        let sanitized = sanitize_key(&key);
        prop_assert!(sanitized.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        prop_assert_eq!(sanitized.chars().count(), key.chars().count());
    }

    /// Sanitizing twice is the same as sanitizing once
    #[test]
    fn test_sanitize_key_stable(key in ".{0,32}") {
        let once = sanitize_key(&key);
        prop_assert_eq!(sanitize_key(&once), once.clone());
    }

    /// Valid keys pass through untouched
    #[test]
    fn test_sanitize_key_keeps_valid(key in "[A-Za-z0-9_]{1,32}") {
        prop_assert_eq!(sanitize_key(&key), key);
    }

    /// Canonical strings parse back into the same label set
    #[test]
    fn test_canonical_parse_roundtrip(labels in any_labels()) {
        let canonical = labels.canonical();
        let parsed = LabelSet::parse(&canonical).unwrap();
        prop_assert_eq!(parsed, labels);
    }

    /// Canonicalization is idempotent
    #[test]
    fn test_canonicalize_idempotent(labels in any_labels()) {
        let once = canonicalize(&labels.canonical()).unwrap();
        let twice = canonicalize(&once).unwrap();
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once, labels.canonical());
    }

    /// Backslashes that do not start a known escape survive parsing untouched
    #[test]
    fn test_unescaped_backslashes_preserved(
        parts in prop::collection::vec("[a-mo-z0-9:./]{1,6}", 1..5)
    ) {
        let raw = parts.join("\\");
        let parsed = LabelSet::parse(&format!("{{path=\"{raw}\"}}")).unwrap();
        prop_assert_eq!(parsed.get("path"), Some(raw.as_str()));
        let once = parsed.canonical();
        prop_assert_eq!(canonicalize(&once).unwrap(), once);
    }

    /// Colliding raw keys resolve the same way regardless of input order
    #[test]
    fn test_key_collision_order_independent(a in "[a-z]{1,4}", b in "[a-z]{1,4}") {
        let pairs = vec![(format!("{a}.x"), "dot"), (format!("{a}-x"), "dash"), (b, "other")];
        let forward: LabelSet = pairs.clone().into_iter().collect();
        let backward: LabelSet = pairs.into_iter().rev().collect();
        prop_assert_eq!(forward.canonical(), backward.canonical());
    }

    /// Insertion order never changes the canonical form
    #[test]
    fn test_canonical_order_independent(
        pairs in prop::collection::vec(("[a-z]{1,6}", "[a-z0-9]{0,6}"), 0..8)
    ) {
        let mut dedup = BTreeMap::new();
        for (k, v) in &pairs {
            dedup.insert(k.clone(), v.clone());
        }
        let forward: LabelSet = dedup.clone().into_iter().collect();
        let backward: LabelSet = dedup.into_iter().rev().collect();
        prop_assert_eq!(forward.canonical(), backward.canonical());
    }
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Level ordering follows discriminants: DEBUG < INFO < WARN < ERROR < DISABLE
    #[test]
    fn test_log_level_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a <= b, (a as u8) <= (b as u8));
        prop_assert_eq!(a < b, (a as u8) < (b as u8));
    }

    /// A threshold passes exactly the levels at or above it, and DISABLE passes nothing
    #[test]
    fn test_threshold_gating(level in any_level(), threshold in any_level()) {
        let expected = threshold != LogLevel::Disable && level >= threshold;
        prop_assert_eq!(level.passes(threshold), expected);
    }

    /// String conversions roundtrip
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        prop_assert_eq!(parsed, level);
        prop_assert_eq!(level.to_string(), level.to_str());
    }
}

// ============================================================================
// Encoding Tests
// ============================================================================

proptest! {
    /// Encoding preserves stream and entry counts under both groupings
    #[test]
    fn test_encode_preserves_counts(
        submissions in prop::collection::vec(("[a-c]", ".{0,24}", 0i64..2_000_000_000), 0..40),
        per_entry in any::<bool>(),
    ) {
        let grouping = if per_entry { StreamGrouping::PerEntry } else { StreamGrouping::ByLabels };
        let mut acc = BatchAccumulator::new(grouping);
        for (job, line, secs) in &submissions {
            let ts = Utc.timestamp_opt(*secs, 0).single().unwrap();
            let entry = LogEntry::new(LogLevel::Info, line.clone()).with_timestamp(ts);
            acc.append(Stream::new(&LabelSet::new().with("job", job.clone()), entry));
        }
        prop_assert_eq!(acc.size(), submissions.len());

        let batch = acc.drain();
        let decoded = encoder::decode(&encoder::encode(&batch).unwrap()).unwrap();
        prop_assert_eq!(decoded.entry_count(), submissions.len());
        prop_assert_eq!(decoded.streams.len(), batch.stream_count());
        for (stream, wire) in batch.streams().iter().zip(&decoded.streams) {
            prop_assert_eq!(&stream.labels, &wire.labels);
            let lines: Vec<&str> = stream.entries.iter().map(|e| e.line.as_str()).collect();
            let wire_lines: Vec<&str> = wire.entries.iter().map(|e| e.line.as_str()).collect();
            prop_assert_eq!(lines, wire_lines);
        }
        prop_assert!(acc.is_empty());
    }

    /// Wire timestamps parse back to the same instant
    #[test]
    fn test_timestamp_roundtrip(secs in 0i64..4_000_000_000, nanos in 0u32..1_000_000_000) {
        let ts = Utc.timestamp_opt(secs, nanos).single().unwrap();
        let formatted = encoder::format_timestamp(&ts);
        prop_assert!(formatted.ends_with('Z'));
        let parsed = chrono::DateTime::parse_from_rfc3339(&formatted).unwrap();
        prop_assert_eq!(parsed.with_timezone(&Utc), ts);
    }
}

// ============================================================================
// Retry Policy Tests
// ============================================================================

proptest! {
    /// Backoff never decreases and never exceeds the maximum wait
    #[test]
    fn test_backoff_monotonic_and_capped(
        min_ms in 1u64..1_000,
        extra_ms in 0u64..60_000,
        attempts in 1u32..40,
    ) {
        let policy = RetryPolicy::new(
            attempts,
            std::time::Duration::from_millis(min_ms),
            std::time::Duration::from_millis(min_ms + extra_ms),
        );
        let mut previous = std::time::Duration::ZERO;
        for attempt in 1..=attempts {
            let wait = policy.backoff(attempt);
            prop_assert!(wait >= previous);
            prop_assert!(wait <= policy.max_wait);
            previous = wait;
        }
    }
}
