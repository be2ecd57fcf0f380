//! One-stop host facade.
//!
//! [`ScriptHost`] pairs an [`AdapterContext`] with an [`AdapterRegistry`] so
//! that gating changes and table caches stay consistent: toggling a feature
//! group through the host also drops the tables built under the old state.

use std::sync::Arc;

use thiserror::Error;

use scriptbind_core::{AdapterError, NativeObject, NativeValue, ScriptValue};
use scriptbind_registry::{
    AdaptedClass, AdapterContext, AdapterDefinition, AdapterRegistry, AdapterWrapper, HostEnv,
};

/// Errors surfaced by [`ScriptHost`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    /// No converter is installed for the architecture.
    #[error("unknown architecture '{0}'")]
    UnknownArchitecture(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl From<scriptbind_core::RegistrationError> for HostError {
    fn from(e: scriptbind_core::RegistrationError) -> Self {
        HostError::Adapter(e.into())
    }
}

impl From<scriptbind_core::CallError> for HostError {
    fn from(e: scriptbind_core::CallError) -> Self {
        HostError::Adapter(e.into())
    }
}

/// Adapter context and registry bundled for a single host process.
#[derive(Debug)]
pub struct ScriptHost {
    ctx: AdapterContext,
    registry: AdapterRegistry,
}

impl ScriptHost {
    pub fn new(ctx: AdapterContext) -> Self {
        Self {
            ctx,
            registry: AdapterRegistry::new(),
        }
    }

    pub fn context(&self) -> &AdapterContext {
        &self.ctx
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Wrap and register an adapter.
    pub fn register(&mut self, definition: &AdapterDefinition) -> Result<Arc<AdapterWrapper>, HostError> {
        Ok(self.registry.register_definition(definition, &self.ctx)?)
    }

    /// Hide `group` on `architecture` and drop stale tables.
    pub fn disable_feature_group(&self, group: &str, architecture: &str) {
        self.ctx.feature_groups().disable(group, architecture);
        self.registry.invalidate();
    }

    /// Expose `group` on `architecture` again and drop stale tables.
    pub fn enable_feature_group(&self, group: &str, architecture: &str) {
        self.ctx.feature_groups().enable(group, architecture);
        self.registry.invalidate();
    }

    /// Call environment for `architecture`.
    pub fn env(&self, architecture: &str) -> Result<HostEnv, HostError> {
        self.ctx
            .host_env(architecture)
            .ok_or_else(|| HostError::UnknownArchitecture(architecture.to_string()))
    }

    /// The method table `architecture` sees for `object`.
    pub fn method_table(&self, object: &NativeObject, architecture: &str) -> Result<Arc<AdaptedClass>, HostError> {
        if self.ctx.converter(architecture).is_none() {
            return Err(HostError::UnknownArchitecture(architecture.to_string()));
        }
        Ok(self.registry.adapted_class(object.class(), architecture, &self.ctx)?)
    }

    /// Call `name` on `object` with the default environment of `architecture`.
    pub fn call(
        &self,
        object: &NativeObject,
        architecture: &str,
        name: &str,
        args: &[ScriptValue],
    ) -> Result<Vec<ScriptValue>, HostError> {
        let env = self.env(architecture)?;
        self.call_with(&env, object, name, args)
    }

    /// Call `name` on `object` with a caller-supplied environment.
    pub fn call_with(
        &self,
        env: &HostEnv,
        object: &NativeObject,
        name: &str,
        args: &[ScriptValue],
    ) -> Result<Vec<ScriptValue>, HostError> {
        let table = self.method_table(object, env.architecture())?;
        let target = NativeValue::Object(object.clone());
        Ok(table.call(name, env, &target, args)?)
    }
}
