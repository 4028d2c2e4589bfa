//! Capture policy: decides, per value, whether it belongs in a snapshot
//!
//! Evaluation is a pure, ordered, short-circuiting decision:
//!
//! 1. explicitly tracked identity: include, regardless of everything else
//! 2. negative size threshold: explicit-only mode, skip
//! 3. positive size threshold not met: skip
//! 4. unresolvable origin module: skip
//! 5. core-library origin with a recognized kind: include
//! 6. otherwise include iff the origin matches a tracked module prefix
//!
//! Every skip carries its reason so no exclusion is ever silent.

use fnv::FnvHashSet;

use crate::config::CaptureConfig;
use crate::value::{is_builtin_origin, Capturable, ValueId};

/// Why a value was left out of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Size threshold is negative and the value is not tracked
    ExplicitOnly,
    /// Reported size is below the positive threshold
    BelowSizeThreshold,
    /// The value's origin module could not be resolved
    UnknownOrigin,
    /// The origin module matches no tracked prefix
    UnmatchedModule,
    /// A local binding carried the identical value already collected as a
    /// global of the same name
    DuplicateOfGlobal,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::ExplicitOnly => "not explicitly tracked",
            Self::BelowSizeThreshold => "below size threshold",
            Self::UnknownOrigin => "unresolvable origin module",
            Self::UnmatchedModule => "origin matches no tracked prefix",
            Self::DuplicateOfGlobal => "duplicate of global binding",
        };
        f.write_str(reason)
    }
}

/// Outcome of evaluating one value against the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Include,
    Skip(SkipReason),
}

impl Verdict {
    pub fn is_include(self) -> bool {
        matches!(self, Self::Include)
    }
}

/// Values explicitly opted into capture, compared by identity
#[derive(Debug, Clone, Default)]
pub struct TrackedSet {
    ids: FnvHashSet<usize>,
}

impl TrackedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value by identity; re-adding is a no-op
    pub fn insert(&mut self, id: ValueId) {
        self.ids.insert(id.bits());
    }

    /// Remove every entry identical to `id`
    pub fn remove(&mut self, id: ValueId) {
        self.ids.remove(&id.bits());
    }

    pub fn contains(&self, id: ValueId) -> bool {
        self.ids.contains(&id.bits())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Evaluate one value against the configured policy
///
/// Total: resolution failures become skips, never panics or errors.
pub fn evaluate(
    id: ValueId,
    value: &dyn Capturable,
    config: &CaptureConfig,
    tracked: &TrackedSet,
) -> Verdict {
    if tracked.contains(id) {
        return Verdict::Include;
    }

    if config.min_object_size < 0 {
        return Verdict::Skip(SkipReason::ExplicitOnly);
    }

    if config.min_object_size > 0 && (value.approx_size() as u64) < config.min_object_size as u64 {
        return Verdict::Skip(SkipReason::BelowSizeThreshold);
    }

    let Some(origin) = value.origin_module() else {
        return Verdict::Skip(SkipReason::UnknownOrigin);
    };

    if is_builtin_origin(origin) && value.kind().is_recognized() {
        return Verdict::Include;
    }

    if config
        .tracked_module_prefixes
        .iter()
        .any(|prefix| origin.starts_with(prefix.as_str()))
    {
        Verdict::Include
    } else {
        Verdict::Skip(SkipReason::UnmatchedModule)
    }
}
