//! Scriptbind: expose host objects to embedded scripting runtimes.
//!
//! Adapters declare script-callable methods on host types. The registry
//! validates every declaration against the environment its adapter kind
//! provides, then builds one method table per (type, architecture) that a
//! scripting host dispatches into.
//!
//! # Example
//!
//! ```
//! use scriptbind::prelude::*;
//!
//! struct Tank {
//!     level: i64,
//! }
//!
//! let tank = ClassRef::new("Tank");
//! let mut host = ScriptHost::new(AdapterContext::new());
//! host.register(
//!     &AdapterDefinition::new("TankAdapter", &tank, AdapterKind::Peripheral).method(MethodSpec::new(
//!         MethodSignature::new("getLevel")
//!             .param(ParamSpec::positional(NativeType::class(&tank)))
//!             .returns(NativeType::Int)
//!             .return_type(ReturnType::Number),
//!         |args| Ok(args.target::<Tank>()?.level.into_native()),
//!     )),
//! )
//! .unwrap();
//!
//! let object = NativeObject::new(tank, Tank { level: 7 });
//! let result = host.call(&object, "computercraft", "getLevel", &[]).unwrap();
//! assert_eq!(result, vec![ScriptValue::Number(7.0)]);
//! ```

pub mod host;

pub use scriptbind_core;
pub use scriptbind_registry;

pub use host::{HostError, ScriptHost};

pub mod prelude {
    pub use crate::host::{HostError, ScriptHost};
    pub use scriptbind_core::{
        AdapterError, ArgType, ArgumentError, CallError, ClassRef, DefinitionError,
        EnvironmentError, FromNative, IntoNative, MethodDeclaration, MethodSignature,
        NamedTupleType, NativeError, NativeObject, NativeType, NativeValue, ParamSpec,
        RegistrationError, ReturnType, ScriptTable, ScriptType, ScriptValue, StandardConverter,
        StructuredClassifier, TypeBindings, TypeConverter,
    };
    pub use scriptbind_registry::{
        AdaptedClass, AdapterContext, AdapterDefinition, AdapterKind, AdapterRegistry, HostEnv,
        MethodSpec, NativeArgs, PropertySpec,
        env::{architectures, keys},
    };
}
