//! Scope collection: assembling a snapshot payload from declared bindings
//!
//! Frame walking is not available here, so the probe site declares its
//! bindings explicitly, split into module-level ("global") and call-scoped
//! ("local") lists. Globals are collected first; a local that genuinely
//! shadows a collected global of the same name overwrites it with a
//! warning, while a local that is the identical value under the same name
//! is a duplicate and is skipped.

use fnv::FnvHashMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::CaptureConfig;
use crate::diag::Diagnostics;
use crate::error::Error;
use crate::policy::{self, SkipReason, TrackedSet, Verdict};
use crate::value::{self, Capturable, CapturedValue, ValueId};

/// One declared name/value association at a probe site
pub struct Binding<'a> {
    name: &'a str,
    id: ValueId,
    value: &'a dyn Capturable,
}

impl<'a> Binding<'a> {
    /// Bind `name` to `value`, capturing the value's identity
    pub fn new<T: Capturable>(name: &'a str, value: &'a T) -> Self {
        Self {
            name,
            id: ValueId::of(value),
            value,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn id(&self) -> ValueId {
        self.id
    }

    pub fn value(&self) -> &dyn Capturable {
        self.value
    }
}

impl std::fmt::Debug for Binding<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("type", &self.value.type_label())
            .finish()
    }
}

/// Insertion-ordered name → captured-value mapping
///
/// Serializes as a map; order survives the round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    entries: Vec<(String, CapturedValue)>,
    index: FnvHashMap<String, usize>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: FnvHashMap::default(),
        }
    }

    /// Insert or overwrite; returns true when an existing entry was
    /// overwritten
    pub fn insert(&mut self, name: impl Into<String>, value: CapturedValue) -> bool {
        let name = name.into();
        if let Some(&slot) = self.index.get(&name) {
            self.entries[slot].1 = value;
            true
        } else {
            self.index.insert(name.clone(), self.entries.len());
            self.entries.push((name, value));
            false
        }
    }

    pub fn get(&self, name: &str) -> Option<&CapturedValue> {
        self.index.get(name).map(|&slot| &self.entries[slot].1)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CapturedValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PayloadVisitor;

        impl<'de> Visitor<'de> for PayloadVisitor {
            type Value = Payload;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of names to captured values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Payload, A::Error> {
                let mut payload = Payload::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, value)) = access.next_entry::<String, CapturedValue>()? {
                    payload.insert(name, value);
                }
                Ok(payload)
            }
        }

        deserializer.deserialize_map(PayloadVisitor)
    }
}

/// What happened to one binding during collection
///
/// Exclusions and failures always carry their cause; nothing is dropped
/// without a trace.
#[derive(Debug)]
pub enum BindingOutcome {
    Captured { name: String },
    Skipped { name: String, reason: SkipReason },
    Failed { name: String, error: Error },
}

impl BindingOutcome {
    pub fn name(&self) -> &str {
        match self {
            Self::Captured { name } | Self::Skipped { name, .. } | Self::Failed { name, .. } => name,
        }
    }

    pub fn is_captured(&self) -> bool {
        matches!(self, Self::Captured { .. })
    }
}

/// Build a snapshot payload from the declared bindings
///
/// Globals first, then locals. Per-binding failures become
/// [`BindingOutcome::Failed`] and never propagate. An empty payload is a
/// valid result and is still persisted by the caller.
pub fn collect(
    globals: &[Binding<'_>],
    locals: &[Binding<'_>],
    config: &CaptureConfig,
    tracked: &TrackedSet,
    diag: &Diagnostics,
) -> (Payload, Vec<BindingOutcome>) {
    let mut payload = Payload::with_capacity(globals.len() + locals.len());
    let mut outcomes = Vec::with_capacity(globals.len() + locals.len());

    for binding in globals {
        outcomes.push(collect_one(binding, "global", &mut payload, config, tracked, diag));
    }

    for binding in locals {
        let duplicate_of_global = globals
            .iter()
            .any(|global| global.name() == binding.name() && global.id() == binding.id());
        if duplicate_of_global {
            diag.emit(
                2,
                &format!("[local] skip {} ({})", binding.name(), SkipReason::DuplicateOfGlobal),
            );
            outcomes.push(BindingOutcome::Skipped {
                name: binding.name().to_string(),
                reason: SkipReason::DuplicateOfGlobal,
            });
            continue;
        }
        outcomes.push(collect_one(binding, "local", &mut payload, config, tracked, diag));
    }

    (payload, outcomes)
}

fn collect_one(
    binding: &Binding<'_>,
    scope_label: &str,
    payload: &mut Payload,
    config: &CaptureConfig,
    tracked: &TrackedSet,
    diag: &Diagnostics,
) -> BindingOutcome {
    let name = binding.name().to_string();
    match policy::evaluate(binding.id(), binding.value(), config, tracked) {
        Verdict::Include => match value::capture_value(binding.name(), binding.value()) {
            Ok(captured) => {
                diag.emit(1, &format!("[{scope_label}] add {name}"));
                if payload.insert(binding.name(), captured) {
                    diag.emit(1, &format!("  overwrite! {name}"));
                }
                BindingOutcome::Captured { name }
            }
            Err(error) => {
                diag.emit(1, &format!("[{scope_label}] drop {name}: {error}"));
                BindingOutcome::Failed { name, error }
            }
        },
        Verdict::Skip(reason) => {
            diag.emit(2, &format!("[{scope_label}] skip {name} ({reason})"));
            BindingOutcome::Skipped { name, reason }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::MemorySink;
    use crate::value::{Document, DocumentError, ValueKind};
    use std::sync::Arc;

    fn permissive_config() -> CaptureConfig {
        CaptureConfig::new("t.rs").with_min_object_size(0)
    }

    fn diag_pair(verbosity: u8) -> (Arc<MemorySink>, Diagnostics) {
        let sink = Arc::new(MemorySink::new());
        let diag = Diagnostics::new(verbosity, sink.clone());
        (sink, diag)
    }

    fn captured(data: i64) -> CapturedValue {
        CapturedValue {
            type_name: "i64".to_string(),
            origin: Some("core::primitive".to_string()),
            size_bytes: 8,
            data: serde_json::json!(data),
        }
    }

    #[test]
    fn test_payload_preserves_insertion_order() {
        let mut payload = Payload::new();
        payload.insert("zebra", captured(1));
        payload.insert("apple", captured(2));
        payload.insert("mango", captured(3));
        let names: Vec<_> = payload.names().collect();
        assert_eq!(names, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_payload_overwrite_keeps_original_slot() {
        let mut payload = Payload::new();
        payload.insert("a", captured(1));
        payload.insert("b", captured(2));
        assert!(payload.insert("a", captured(9)));
        let names: Vec<_> = payload.names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(payload.get("a").unwrap().data, serde_json::json!(9));
    }

    #[test]
    fn test_shadowing_local_wins_and_warns() {
        let global_x = 1i64;
        let local_x = 2i64;
        let (sink, diag) = diag_pair(1);
        let globals = [Binding::new("x", &global_x)];
        let locals = [Binding::new("x", &local_x)];
        let (payload, outcomes) =
            collect(&globals, &locals, &permissive_config(), &TrackedSet::new(), &diag);
        assert_eq!(payload.get("x").unwrap().data, serde_json::json!(2));
        assert!(sink.contains("overwrite! x"));
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(BindingOutcome::is_captured));
    }

    #[test]
    fn test_identical_local_is_a_duplicate_not_a_shadow() {
        let x = 7i64;
        let (sink, diag) = diag_pair(2);
        let globals = [Binding::new("x", &x)];
        let locals = [Binding::new("x", &x)];
        let (payload, outcomes) =
            collect(&globals, &locals, &permissive_config(), &TrackedSet::new(), &diag);
        assert_eq!(payload.len(), 1);
        assert!(!sink.contains("overwrite!"));
        assert!(matches!(
            outcomes[1],
            BindingOutcome::Skipped { reason: SkipReason::DuplicateOfGlobal, .. }
        ));
    }

    #[test]
    fn test_exclusions_logged_only_at_verbosity_two() {
        let flag = true; // unrecognized builtin kind, always skipped
        let bindings = [Binding::new("flag", &flag)];

        let (quiet_sink, quiet) = diag_pair(1);
        collect(&bindings, &[], &permissive_config(), &TrackedSet::new(), &quiet);
        assert!(!quiet_sink.contains("skip flag"));

        let (loud_sink, loud) = diag_pair(2);
        collect(&bindings, &[], &permissive_config(), &TrackedSet::new(), &loud);
        assert!(loud_sink.contains("skip flag"));
    }

    #[test]
    fn test_empty_scope_yields_valid_empty_payload() {
        let (_, diag) = diag_pair(0);
        let (payload, outcomes) =
            collect(&[], &[], &permissive_config(), &TrackedSet::new(), &diag);
        assert!(payload.is_empty());
        assert!(outcomes.is_empty());
    }

    /// Qualifies by policy but cannot be rendered into a document
    struct Unrepresentable {
        bad_keys: std::collections::HashMap<i32, i32>,
    }

    impl Capturable for Unrepresentable {
        fn type_label(&self) -> &'static str {
            "scope::tests::Unrepresentable"
        }

        fn origin_module(&self) -> Option<&'static str> {
            Some("ndarray::fake")
        }

        fn approx_size(&self) -> usize {
            1 << 20
        }

        fn kind(&self) -> ValueKind {
            ValueKind::Other
        }

        fn capture(&self) -> Result<Document, DocumentError> {
            value::to_document(&self.bad_keys)
        }
    }

    #[test]
    fn test_serialization_failure_is_reported_not_propagated() {
        let mut bad_keys = std::collections::HashMap::new();
        bad_keys.insert(1, 2);
        let broken = Unrepresentable { bad_keys };
        let count = 5i64;
        let (sink, diag) = diag_pair(1);
        let locals = [Binding::new("broken", &broken), Binding::new("count", &count)];
        let (payload, outcomes) =
            collect(&[], &locals, &permissive_config(), &TrackedSet::new(), &diag);
        assert!(matches!(outcomes[0], BindingOutcome::Failed { .. }));
        assert!(sink.contains("drop broken"));
        // Collection continues past the failure
        assert_eq!(payload.len(), 1);
        assert_eq!(payload.get("count").unwrap().data, serde_json::json!(5));
    }

    #[test]
    fn test_payload_serde_round_trip_preserves_order_and_values() {
        let mut payload = Payload::new();
        payload.insert("zeta", captured(26));
        payload.insert("alpha", captured(1));
        let bytes = rmp_serde::to_vec_named(&payload).unwrap();
        let restored: Payload = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(restored, payload);
        let names: Vec<_> = restored.names().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }
}
