//! Host environment passed to every call.
//!
//! A [`HostEnv`] carries what the calling scripting host supplies besides the
//! script arguments: its architecture id, its converter, extra positional
//! values after the call target, and named values such as `"context"` or
//! `"computer"`.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use scriptbind_core::{NativeValue, SharedConverter, TypeConverter, converter_object};

/// Well-known environment names.
pub mod keys {
    pub const CONVERTER: &str = "converter";
    pub const CONTEXT: &str = "context";
    pub const ACCESS: &str = "access";
    pub const COMPUTER: &str = "computer";
    pub const ARCHITECTURE: &str = "architecture";
}

/// Architecture ids of the supported scripting hosts.
pub mod architectures {
    pub const COMPUTERCRAFT: &str = "computercraft";
    pub const OPENCOMPUTERS: &str = "opencomputers";
}

/// Values a host supplies for one call.
#[derive(Clone)]
pub struct HostEnv {
    architecture: Arc<str>,
    converter: SharedConverter,
    positional: Vec<NativeValue>,
    named: FxHashMap<String, NativeValue>,
}

impl HostEnv {
    /// Create an environment for `architecture`.
    ///
    /// The converter and the architecture id are also available as the
    /// named values `"converter"` and `"architecture"`.
    pub fn new(architecture: impl Into<Arc<str>>, converter: SharedConverter) -> Self {
        let architecture = architecture.into();
        let mut named = FxHashMap::default();
        named.insert(
            keys::CONVERTER.to_string(),
            NativeValue::Object(converter_object(Arc::clone(&converter))),
        );
        named.insert(
            keys::ARCHITECTURE.to_string(),
            NativeValue::String(architecture.to_string()),
        );
        Self {
            architecture,
            converter,
            positional: Vec::new(),
            named,
        }
    }

    /// Append a positional value following the call target.
    pub fn with_positional(mut self, value: NativeValue) -> Self {
        self.positional.push(value);
        self
    }

    /// Set a named value.
    pub fn with_named(mut self, name: impl Into<String>, value: NativeValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a named value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: NativeValue) {
        self.named.insert(name.into(), value);
    }

    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    pub fn converter(&self) -> &dyn TypeConverter {
        self.converter.as_ref()
    }

    pub fn shared_converter(&self) -> &SharedConverter {
        &self.converter
    }

    /// Positional value `index`, counting from the first value after the target.
    pub fn positional(&self, index: usize) -> Option<&NativeValue> {
        self.positional.get(index)
    }

    pub fn named(&self, name: &str) -> Option<&NativeValue> {
        self.named.get(name)
    }
}

impl std::fmt::Debug for HostEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostEnv")
            .field("architecture", &self.architecture)
            .field("positional", &self.positional.len())
            .field("named", &self.named.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptbind_core::StandardConverter;

    #[test]
    fn converter_and_architecture_are_named_values() {
        let env = HostEnv::new(architectures::OPENCOMPUTERS, Arc::new(StandardConverter::new()));
        assert_eq!(env.architecture(), "opencomputers");
        assert_eq!(
            env.named(keys::ARCHITECTURE),
            Some(&NativeValue::String("opencomputers".into()))
        );
        let converter = env.named(keys::CONVERTER).and_then(NativeValue::as_object).unwrap();
        assert!(converter.downcast_ref::<SharedConverter>().is_some());
    }

    #[test]
    fn positional_and_named_values() {
        let env = HostEnv::new(architectures::COMPUTERCRAFT, Arc::new(StandardConverter::new()))
            .with_positional(NativeValue::Int(7))
            .with_named(keys::COMPUTER, NativeValue::String("pc".into()));
        assert_eq!(env.positional(0), Some(&NativeValue::Int(7)));
        assert_eq!(env.positional(1), None);
        assert_eq!(env.named(keys::COMPUTER), Some(&NativeValue::String("pc".into())));
        assert_eq!(env.named(keys::ACCESS), None);
    }
}
