//! Scriptbind core types.
//!
//! Everything needed to describe and validate a script-callable method,
//! independent of any host or registry state.
//!
//! ## Modules
//!
//! - [`type_hash`]: deterministic identity of native types
//! - [`native_type`]: native type model ([`NativeType`], [`ClassRef`], [`TypeBindings`])
//! - [`value`]: script and native values
//! - [`convert`]: typed extraction and the per-host [`TypeConverter`]
//! - [`script_type`]: script-facing type descriptors
//! - [`classify`]: native → script type classification
//! - [`argument`]: script argument descriptors and conversion
//! - [`declaration`]: method signatures and validated declarations
//! - [`error`]: error taxonomy

pub mod argument;
pub mod classify;
pub mod convert;
pub mod declaration;
pub mod error;
pub mod native_type;
pub mod script_type;
pub mod type_hash;
pub mod value;

pub use argument::{Argument, ArgumentKind};
pub use classify::{PrimitiveClassifier, StructuredClassifier, TypeClassification, TypeClassifier};
pub use convert::{
    FromNative, IntoNative, SharedConverter, StandardConverter, TypeConverter, ValueConverter,
    converter_class, converter_object,
};
pub use declaration::{
    EnvParam, EnvTypes, MethodDeclaration, MethodSignature, ParamRole, ParamSpec,
};
pub use error::{
    AdapterError, ArgumentError, CallError, ConversionError, DefinitionError, EnumerationError,
    EnvironmentError, NativeError, RegistrationError, WrapCause,
};
pub use native_type::{ClassRef, NativeType, TypeBindings};
pub use script_type::{ArgType, NamedTupleField, NamedTupleType, ReturnType, ScriptType};
pub use type_hash::TypeHash;
pub use value::{NativeObject, NativeValue, ScriptTable, ScriptValue};
