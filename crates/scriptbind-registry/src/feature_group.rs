//! Per-architecture feature group gating.
//!
//! Every feature group holds a blacklist of architecture ids. A group with
//! no entry for an architecture is enabled there, so untouched groups are
//! enabled everywhere. Groups are created on first reference and never
//! removed.
//!
//! # Thread Safety
//!
//! The table sits behind a `parking_lot::RwLock`. It is expected to be
//! configured before hosts start dispatching; toggling during live dispatch
//! only affects method tables built afterwards.

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

/// Registry of feature groups and their disabled architectures.
#[derive(Debug, Default)]
pub struct FeatureGroups {
    groups: RwLock<FxHashMap<String, FxHashSet<String>>>,
}

impl FeatureGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `group` is referenced by some adapter.
    pub fn ensure_exists(&self, group: &str) {
        if self.groups.read().contains_key(group) {
            return;
        }
        self.groups.write().entry(group.to_string()).or_default();
    }

    /// Names of all groups created so far.
    pub fn known_feature_groups(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Hide `group` on `architecture`.
    pub fn disable(&self, group: &str, architecture: &str) {
        let mut groups = self.groups.write();
        if !groups.contains_key(group) {
            log::warn!("disabling feature group '{group}' on '{architecture}', but no adapter references it");
        }
        groups
            .entry(group.to_string())
            .or_default()
            .insert(architecture.to_string());
    }

    /// Expose `group` on `architecture` again.
    pub fn enable(&self, group: &str, architecture: &str) {
        let mut groups = self.groups.write();
        if !groups.contains_key(group) {
            log::warn!("enabling feature group '{group}' on '{architecture}', but no adapter references it");
        }
        groups
            .entry(group.to_string())
            .or_default()
            .remove(architecture);
    }

    /// Whether `group` is exposed on `architecture`.
    pub fn is_enabled(&self, group: &str, architecture: &str) -> bool {
        if let Some(disabled) = self.groups.read().get(group) {
            return !disabled.contains(architecture);
        }
        self.ensure_exists(group);
        true
    }
}
