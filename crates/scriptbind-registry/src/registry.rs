//! Adapter registry.
//!
//! The registry owns every wrapped adapter and answers "what does a host
//! see for this type?" by building and caching [`AdaptedClass`] tables.
//!
//! # Lookup Order
//!
//! Adapters registered for the exact target come first, then adapters of
//! supertypes from the nearest ancestor outwards, each group in
//! registration order. That order decides which declaration wins a name
//! clash report and the order of [`AdaptedClass::method_names`].
//!
//! # Thread Safety
//!
//! Registration takes `&mut self`. Table construction takes `&self`; the
//! table cache is behind a `parking_lot::Mutex` so a registry shared
//! between host threads builds each (target, architecture) table once.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use scriptbind_core::{ClassRef, RegistrationError, TypeHash};

use crate::adapted_class::AdaptedClass;
use crate::adapter::{AdapterDefinition, AdapterWrapper};
use crate::context::AdapterContext;

type CacheKey = (TypeHash, String);

/// Registered adapters and the method tables built from them.
#[derive(Debug, Default)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<AdapterWrapper>>,
    by_target: FxHashMap<TypeHash, Vec<usize>>,
    cache: Mutex<FxHashMap<CacheKey, Arc<AdaptedClass>>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already built adapter.
    pub fn register(&mut self, wrapper: AdapterWrapper) -> Arc<AdapterWrapper> {
        let wrapper = Arc::new(wrapper);
        self.by_target
            .entry(wrapper.target().hash())
            .or_default()
            .push(self.adapters.len());
        self.adapters.push(Arc::clone(&wrapper));
        self.invalidate();
        log::debug!("registered {}", wrapper.describe());
        wrapper
    }

    /// Build and register an adapter.
    ///
    /// A method failing to wrap aborts registration of the whole adapter.
    pub fn register_definition(
        &mut self,
        definition: &AdapterDefinition,
        ctx: &AdapterContext,
    ) -> Result<Arc<AdapterWrapper>, RegistrationError> {
        let wrapper = AdapterWrapper::build(definition, ctx)?;
        Ok(self.register(wrapper))
    }

    /// Every registered adapter, in registration order.
    pub fn adapters(&self) -> &[Arc<AdapterWrapper>] {
        &self.adapters
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Adapters applicable to `class`, in lookup order.
    pub fn adapters_for(&self, class: &ClassRef) -> Vec<&AdapterWrapper> {
        std::iter::once(class.hash())
            .chain(class.supertypes().iter().copied())
            .filter_map(|hash| self.by_target.get(&hash))
            .flatten()
            .map(|&i| self.adapters[i].as_ref())
            .collect()
    }

    /// The method table of `class` on `architecture`, built on first use.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn adapted_class(
        &self,
        class: &ClassRef,
        architecture: &str,
        ctx: &AdapterContext,
    ) -> Result<Arc<AdaptedClass>, RegistrationError> {
        let key = (class.hash(), architecture.to_string());
        if let Some(table) = self.cache.lock().get(&key) {
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(AdaptedClass::build(
            class,
            architecture,
            self.adapters_for(class),
            ctx,
        )?);
        Ok(Arc::clone(self.cache.lock().entry(key).or_insert(table)))
    }

    /// Drop every cached table, e.g. after feature groups changed.
    pub fn invalidate(&self) {
        self.cache.lock().clear();
    }

    /// Re-check every adapter against `ctx` and drop cached tables.
    pub fn revalidate(&self, ctx: &AdapterContext) -> Result<(), RegistrationError> {
        for wrapper in &self.adapters {
            wrapper.revalidate(ctx)?;
        }
        self.invalidate();
        Ok(())
    }

    /// Number of cached tables.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptbind_core::{MethodSignature, NativeType, NativeValue, ParamSpec};

    use crate::adapter::{AdapterKind, MethodSpec};
    use crate::env::architectures;

    fn machine() -> ClassRef {
        ClassRef::new("Machine")
    }

    fn adapter(name: &str, target: &ClassRef, method: &str) -> AdapterDefinition {
        AdapterDefinition::new(name, target, AdapterKind::Peripheral).method(MethodSpec::new(
            MethodSignature::new(method).param(ParamSpec::positional(NativeType::class(target))),
            |_| Ok(NativeValue::Null),
        ))
    }

    #[test]
    fn supertype_adapters_follow_exact_ones() {
        let ctx = AdapterContext::new();
        let grinder = ClassRef::new("Grinder").extends(&machine());
        let mut registry = AdapterRegistry::new();
        registry.register_definition(&adapter("MachineAdapter", &machine(), "getEnergy"), &ctx).unwrap();
        registry.register_definition(&adapter("GrinderAdapter", &grinder, "grind"), &ctx).unwrap();

        let names: Vec<_> = registry.adapters_for(&grinder).into_iter().map(AdapterWrapper::name).collect();
        assert_eq!(names, ["GrinderAdapter", "MachineAdapter"]);
        assert_eq!(registry.adapters_for(&machine()).len(), 1);
    }

    #[test]
    fn tables_are_cached_per_architecture() {
        let ctx = AdapterContext::new().with_method_lister(false);
        let mut registry = AdapterRegistry::new();
        registry.register_definition(&adapter("MachineAdapter", &machine(), "getEnergy"), &ctx).unwrap();

        let a = registry.adapted_class(&machine(), architectures::COMPUTERCRAFT, &ctx).unwrap();
        let b = registry.adapted_class(&machine(), architectures::COMPUTERCRAFT, &ctx).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        registry.adapted_class(&machine(), architectures::OPENCOMPUTERS, &ctx).unwrap();
        assert_eq!(registry.cached_len(), 2);

        registry.invalidate();
        assert_eq!(registry.cached_len(), 0);
        let c = registry.adapted_class(&machine(), architectures::COMPUTERCRAFT, &ctx).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn registering_drops_cached_tables() {
        let ctx = AdapterContext::new().with_method_lister(false);
        let mut registry = AdapterRegistry::new();
        registry.register_definition(&adapter("MachineAdapter", &machine(), "getEnergy"), &ctx).unwrap();
        let before = registry.adapted_class(&machine(), architectures::COMPUTERCRAFT, &ctx).unwrap();
        assert_eq!(before.len(), 1);

        registry.register_definition(&adapter("ExtraAdapter", &machine(), "getHeat"), &ctx).unwrap();
        let after = registry.adapted_class(&machine(), architectures::COMPUTERCRAFT, &ctx).unwrap();
        assert_eq!(after.method_names(), ["getEnergy", "getHeat"]);
    }

    #[test]
    fn failed_definition_is_not_registered() {
        let ctx = AdapterContext::new();
        let mut registry = AdapterRegistry::new();
        let bad = AdapterDefinition::new("Bad", &machine(), AdapterKind::Composed).method(MethodSpec::new(
            MethodSignature::new("oops").param(ParamSpec::positional(NativeType::class(&machine()))),
            |_| Ok(NativeValue::Null),
        ));
        assert!(registry.register_definition(&bad, &ctx).is_err());
        assert!(registry.is_empty());
    }
}
