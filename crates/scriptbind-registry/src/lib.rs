//! Scriptbind registry crate.
//!
//! Turns adapter definitions into callable method tables for scripting
//! hosts: wraps and validates methods against a host environment, gates
//! them per architecture and feature group, and dispatches script calls.
//!
//! Declarations and values live in `scriptbind-core` and are re-exported
//! here for convenience.

pub mod adapted_class;
pub mod adapter;
pub mod context;
pub mod env;
pub mod executor;
pub mod feature_group;
pub mod lister;
pub mod native_fn;
pub mod property;
pub mod registry;

pub use adapted_class::AdaptedClass;
pub use adapter::{AdapterDefinition, AdapterKind, AdapterWrapper, MethodSpec};
pub use context::AdapterContext;
pub use env::HostEnv;
pub use executor::{MethodExecutor, MethodFlags};
pub use feature_group::FeatureGroups;
pub use native_fn::{NativeArgs, NativeMethod};
pub use property::PropertySpec;
pub use registry::AdapterRegistry;

// Re-export from core
pub use scriptbind_core::{
    // Declarations
    MethodDeclaration, MethodSignature, ParamSpec,
    // Errors
    CallError, RegistrationError,
    // Values
    NativeType, NativeValue, ScriptValue,
};
