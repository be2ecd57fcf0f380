//! Explicit configuration shared by registration and table construction.
//!
//! [`AdapterContext`] replaces process-wide singletons: it owns the type
//! classification chain, the feature group table, the converter of every
//! known architecture and the named environment each adapter kind may use.
//! Build it once at startup and pass it by reference.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use scriptbind_core::{NativeType, StandardConverter, StructuredClassifier};
//! use scriptbind_registry::{AdapterContext, AdapterKind, env::{architectures, keys}};
//!
//! let ctx = AdapterContext::new()
//!     .with_classifier(StructuredClassifier::new())
//!     .with_env_type(AdapterKind::Peripheral, keys::COMPUTER, NativeType::String);
//!
//! assert!(ctx.converter(architectures::COMPUTERCRAFT).is_some());
//! assert!(ctx.host_env("unknown").is_none());
//! ```

use std::sync::Arc;

use rustc_hash::FxHashMap;

use scriptbind_core::{
    EnvTypes, NativeType, SharedConverter, StandardConverter, TypeClassification, TypeClassifier,
};

use crate::adapter::AdapterKind;
use crate::env::{HostEnv, architectures};
use crate::feature_group::FeatureGroups;

/// Registration and dispatch configuration.
pub struct AdapterContext {
    classification: TypeClassification,
    feature_groups: FeatureGroups,
    converters: FxHashMap<String, SharedConverter>,
    env_types: [EnvTypes; 3],
    method_lister: bool,
}

impl Default for AdapterContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterContext {
    /// Create a context with both built-in architectures using
    /// [`StandardConverter`], the default environment of every adapter kind
    /// and the method lister enabled.
    pub fn new() -> Self {
        let mut converters: FxHashMap<String, SharedConverter> = FxHashMap::default();
        for arch in [architectures::COMPUTERCRAFT, architectures::OPENCOMPUTERS] {
            converters.insert(arch.to_string(), Arc::new(StandardConverter::new()));
        }

        Self {
            classification: TypeClassification::new(),
            feature_groups: FeatureGroups::new(),
            converters,
            env_types: AdapterKind::ALL.map(AdapterKind::default_env_types),
            method_lister: true,
        }
    }

    /// Add a type classifier ahead of the primitive rules.
    pub fn with_classifier(mut self, classifier: impl TypeClassifier + 'static) -> Self {
        self.classification.register(classifier);
        self
    }

    /// Install or replace the converter of `architecture`.
    pub fn with_converter(mut self, architecture: impl Into<String>, converter: SharedConverter) -> Self {
        self.converters.insert(architecture.into(), converter);
        self
    }

    /// Declare the type of a named environment value for one adapter kind.
    pub fn with_env_type(mut self, kind: AdapterKind, name: impl Into<String>, ty: NativeType) -> Self {
        self.env_types[kind.index()].insert(name.into(), ty);
        self
    }

    /// Toggle the `listMethods` / `listSources` / `getAdvancedMethodsData` helpers.
    pub fn with_method_lister(mut self, enabled: bool) -> Self {
        self.method_lister = enabled;
        self
    }

    pub fn classification(&self) -> &TypeClassification {
        &self.classification
    }

    pub fn feature_groups(&self) -> &FeatureGroups {
        &self.feature_groups
    }

    pub fn converter(&self, architecture: &str) -> Option<&SharedConverter> {
        self.converters.get(architecture)
    }

    /// Registered architecture ids, sorted.
    pub fn architectures(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.converters.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Named environment available to methods of `kind`.
    pub fn env_types(&self, kind: AdapterKind) -> &EnvTypes {
        &self.env_types[kind.index()]
    }

    pub fn method_lister_enabled(&self) -> bool {
        self.method_lister
    }

    /// Start a call environment for `architecture` with its converter.
    pub fn host_env(&self, architecture: &str) -> Option<HostEnv> {
        self.converter(architecture)
            .map(|converter| HostEnv::new(architecture, Arc::clone(converter)))
    }
}

impl std::fmt::Debug for AdapterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterContext")
            .field("architectures", &self.architectures())
            .field("feature_groups", &self.feature_groups)
            .field("method_lister", &self.method_lister)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::keys;

    #[test]
    fn default_architectures() {
        let ctx = AdapterContext::new();
        assert_eq!(ctx.architectures(), vec!["computercraft", "opencomputers"]);
        let env = ctx.host_env(architectures::OPENCOMPUTERS).unwrap();
        assert_eq!(env.architecture(), "opencomputers");
    }

    #[test]
    fn env_types_per_kind() {
        let ctx = AdapterContext::new()
            .with_env_type(AdapterKind::Peripheral, keys::COMPUTER, NativeType::String);
        assert_eq!(
            ctx.env_types(AdapterKind::Peripheral).get(keys::COMPUTER),
            Some(&NativeType::String)
        );
        assert!(ctx.env_types(AdapterKind::Property).get(keys::COMPUTER).is_none());
        assert!(ctx.env_types(AdapterKind::Property).contains_key(keys::CONVERTER));
    }

    #[test]
    fn custom_architecture() {
        let ctx = AdapterContext::new().with_converter("testhost", Arc::new(StandardConverter::new()));
        assert!(ctx.host_env("testhost").is_some());
        assert_eq!(ctx.architectures().len(), 3);
    }
}
