//! Per-architecture method tables.
//!
//! An [`AdaptedClass`] is what one scripting host sees for one target type:
//! every visible executor of every applicable adapter, exposed under its
//! canonical name and each alias. Tables are immutable once built; gating
//! changes take effect when the registry rebuilds them.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use scriptbind_core::{CallError, ClassRef, NativeValue, RegistrationError, ScriptValue};

use crate::adapter::AdapterWrapper;
use crate::context::AdapterContext;
use crate::env::HostEnv;
use crate::executor::MethodExecutor;
use crate::lister;

/// The exposed methods of one target type on one architecture.
#[derive(Debug)]
pub struct AdaptedClass {
    target: ClassRef,
    architecture: String,
    names: Vec<String>,
    executors: Vec<Arc<MethodExecutor>>,
    index: FxHashMap<String, usize>,
    sources: Vec<String>,
}

/// Collects exposed names while rejecting clashes between declarations.
struct TableBuilder {
    entries: Vec<(String, Arc<MethodExecutor>)>,
    index: FxHashMap<String, usize>,
    origins: Vec<String>,
}

impl TableBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
            origins: Vec::new(),
        }
    }

    fn add_wrapper(&mut self, wrapper: &AdapterWrapper, architecture: &str, ctx: &AdapterContext) -> Result<(), RegistrationError> {
        for executor in wrapper.executors() {
            if !executor.is_visible_on(architecture, ctx.feature_groups()) {
                log::trace!("'{}' hidden on {}", executor.name(), architecture);
                continue;
            }
            let origin = format!("{}::{}", wrapper.name(), executor.name());
            for name in executor.declaration().names() {
                self.add(name, executor, &origin)?;
            }
        }
        Ok(())
    }

    fn add(&mut self, name: &str, executor: &Arc<MethodExecutor>, origin: &str) -> Result<(), RegistrationError> {
        if let Some(&existing) = self.index.get(name) {
            // The same executor reached through two adapters of a hierarchy.
            if Arc::ptr_eq(&self.entries[existing].1, executor) {
                return Ok(());
            }
            return Err(RegistrationError::DuplicateMethod {
                name: name.to_string(),
                first: self.origins[existing].clone(),
                second: origin.to_string(),
            });
        }
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push((name.to_string(), Arc::clone(executor)));
        self.origins.push(origin.to_string());
        Ok(())
    }
}

impl AdaptedClass {
    /// Build the table of `target` on `architecture` from `wrappers`, in order.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build<'a>(
        target: &ClassRef,
        architecture: &str,
        wrappers: impl IntoIterator<Item = &'a AdapterWrapper>,
        ctx: &AdapterContext,
    ) -> Result<Self, RegistrationError> {
        let mut builder = TableBuilder::new();
        let mut sources = FxHashSet::default();

        for wrapper in wrappers {
            builder.add_wrapper(wrapper, architecture, ctx)?;
            sources.insert(wrapper.source().to_string());
        }

        let mut sources: Vec<String> = sources.into_iter().collect();
        sources.sort_unstable();

        if ctx.method_lister_enabled() {
            let lister = AdapterWrapper::build(&lister::definition(target, &builder.entries, &sources), ctx)?;
            builder.add_wrapper(&lister, architecture, ctx)?;
        }

        let (names, executors): (Vec<_>, Vec<_>) = builder.entries.into_iter().unzip();
        log::debug!(
            "adapted '{}' for {}: {} exposed name(s) from {} source(s)",
            target.name(),
            architecture,
            names.len(),
            sources.len()
        );

        Ok(Self {
            target: target.clone(),
            architecture: architecture.to_string(),
            names,
            executors,
            index: builder.index,
            sources,
        })
    }

    pub fn target(&self) -> &ClassRef {
        &self.target
    }

    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    /// Exposed names in table order, aliases included.
    pub fn method_names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn executor(&self, index: usize) -> Option<&Arc<MethodExecutor>> {
        self.executors.get(index)
    }

    pub fn find(&self, name: &str) -> Option<&Arc<MethodExecutor>> {
        self.index_of(name).and_then(|i| self.executor(i))
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Source tags of the adapters contributing to this table, sorted.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Call the method at `index` of [`method_names`](Self::method_names).
    pub fn call_method(
        &self,
        index: usize,
        env: &HostEnv,
        target: &NativeValue,
        args: &[ScriptValue],
    ) -> Result<Vec<ScriptValue>, CallError> {
        let executor = self
            .executor(index)
            .ok_or_else(|| CallError::NoSuchMethod(format!("#{index}")))?;
        Self::run(executor, env, target, args)
    }

    /// Call the method exposed as `name`.
    pub fn call(
        &self,
        name: &str,
        env: &HostEnv,
        target: &NativeValue,
        args: &[ScriptValue],
    ) -> Result<Vec<ScriptValue>, CallError> {
        let executor = self
            .find(name)
            .ok_or_else(|| CallError::NoSuchMethod(name.to_string()))?;
        Self::run(executor, env, target, args)
    }

    fn run(
        executor: &MethodExecutor,
        env: &HostEnv,
        target: &NativeValue,
        args: &[ScriptValue],
    ) -> Result<Vec<ScriptValue>, CallError> {
        executor.execute(env, target, args).inspect_err(|e| {
            log::debug!("error during method {} execution: {}", executor.name(), e);
        })
    }
}
