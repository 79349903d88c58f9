//! Modification tracking primitives.
//!
//! Every cache in the workspace is keyed by a [`ModificationStamp`]: the pair
//! of an out-of-code-block epoch (owned by the surrounding project/file
//! context and bumped on any structural change anywhere) and a per-declaration
//! local counter (bumped only when that declaration's own shape changes). A
//! cached value is reusable iff neither counter has advanced past the stamp.
//!
//! There is deliberately no process-global counter: callers construct an
//! [`EpochSource`] per context and thread it through component constructors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The out-of-code-block change counter for one project/file context.
///
/// External collaborators performing a structural edit must call
/// [`EpochSource::bump`] as part of the edit; caches have no other way of
/// learning about changes.
#[derive(Debug, Default)]
pub struct EpochSource {
    epoch: AtomicU64,
}

impl EpochSource {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn current(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Record an out-of-code-block structural change.
    pub fn bump(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Per-declaration structural change counter.
///
/// Owned by exactly one declaration (e.g. one class); incremented only when
/// that declaration's own structural shape changes.
#[derive(Debug, Default)]
pub struct LocalTracker {
    count: AtomicU64,
}

impl LocalTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    pub fn bump(&self) -> u64 {
        self.count.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Cache validity key: (global epoch, local tracker) at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModificationStamp {
    pub global: u64,
    pub local: u64,
}

impl ModificationStamp {
    #[must_use]
    pub fn capture(epoch: &EpochSource, local: &LocalTracker) -> Self {
        Self {
            global: epoch.current(),
            local: local.current(),
        }
    }

    /// A cached value recorded under this stamp must be discarded when either
    /// counter has advanced.
    #[must_use]
    pub fn is_current(&self, epoch: &EpochSource, local: &LocalTracker) -> bool {
        self.global == epoch.current() && self.local == local.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_invalidated_by_either_counter() {
        let epoch = EpochSource::new();
        let local = LocalTracker::new();

        let stamp = ModificationStamp::capture(&epoch, &local);
        assert!(stamp.is_current(&epoch, &local));

        epoch.bump();
        assert!(!stamp.is_current(&epoch, &local));

        let stamp = ModificationStamp::capture(&epoch, &local);
        local.bump();
        assert!(!stamp.is_current(&epoch, &local));
    }

    #[test]
    fn stamp_stable_under_no_change() {
        let epoch = EpochSource::new();
        let local = LocalTracker::new();
        let a = ModificationStamp::capture(&epoch, &local);
        let b = ModificationStamp::capture(&epoch, &local);
        assert_eq!(a, b);
    }
}
