//! Error types for every phase of adapter processing.
//!
//! ## Error Hierarchy
//!
//! ```text
//! AdapterError (top-level wrapper)
//! ├── DefinitionError   - malformed method declaration (registration time)
//! ├── EnvironmentError  - host environment incompatible with a declaration
//! ├── RegistrationError - adapter wrapping / method table construction
//! └── CallError         - a single script call failed
//!     ├── ArgumentError     - missing, null or unconvertible argument
//!     ├── NativeError       - the bound native function failed
//!     └── ConversionError   - result could not be converted back
//! ```
//!
//! [`EnumerationError`] is deliberately not part of the hierarchy: it is
//! logged and degrades the adapter to zero methods instead of propagating.

use thiserror::Error;

// ============================================================================
// Definition Errors
// ============================================================================

/// A method declaration violates the argument layout rules.
///
/// Raised while parsing a declaration, never during a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// An unnamed positional argument follows an environment or script argument.
    #[error("method '{method}': positional argument {index} must precede all named arguments")]
    PositionalAfterNamed { method: String, index: usize },

    /// An environment argument follows a script argument.
    #[error("method '{method}': environment argument '{name}' follows a script argument")]
    EnvAfterScript { method: String, name: String },

    /// Two environment arguments share a name.
    #[error("method '{method}': duplicate environment argument '{name}'")]
    DuplicateEnv { method: String, name: String },

    /// A required script argument follows an optional one.
    #[error("method '{method}': required argument '{name}' follows an optional argument")]
    RequiredAfterOptional { method: String, name: String },

    /// `optional` was applied to a positional or environment argument.
    #[error("method '{method}': argument {index} cannot be optional, only script arguments can")]
    OptionalNotScript { method: String, index: usize },

    /// `variadic` was applied to a positional or environment argument.
    #[error("method '{method}': argument {index} cannot be variadic, only script arguments can")]
    VariadicNotScript { method: String, index: usize },

    /// A variadic argument is not the last argument.
    #[error("method '{method}': variadic argument '{name}' must be the last argument")]
    VariadicNotLast { method: String, name: String },

    /// A variadic argument's native type is not an array.
    #[error("method '{method}': variadic argument '{name}' must have an array type, got '{native}'")]
    VariadicNotArray {
        method: String,
        name: String,
        native: String,
    },

    /// Multi-value result with no declared return types.
    #[error("method '{method}': multiple return values require at least one declared return type")]
    MissingReturnTypes { method: String },

    /// More return types declared than the result type can carry.
    #[error("method '{method}': result type '{native}' cannot carry {count} return values")]
    TooManyReturnTypes {
        method: String,
        native: String,
        count: usize,
    },

    /// The multiple-return marker was placed on a result that is not ordered.
    #[error("method '{method}': result type '{native}' cannot be split into multiple return values")]
    MultipleReturnNotSupported { method: String, native: String },

    /// A generic type variable has no concrete binding.
    #[error("method '{method}': unresolved type variable '{variable}'")]
    UnresolvedTypeVariable { method: String, variable: String },
}

// ============================================================================
// Environment (compatibility) Errors
// ============================================================================

/// A host-supplied environment does not satisfy a declaration's needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    /// Wrong number of positional environment values.
    #[error("method '{method}': expected {expected} positional argument(s), host provides {got}")]
    PositionalArity {
        method: String,
        expected: usize,
        got: usize,
    },

    /// A positional environment value has an incompatible type.
    #[error("method '{method}': positional argument {index} of type '{expected}' cannot accept '{got}'")]
    PositionalType {
        method: String,
        index: usize,
        expected: String,
        got: String,
    },

    /// A named environment value is not provided by the host.
    #[error("method '{method}': environment argument '{name}' is not provided by the host")]
    MissingEnv { method: String, name: String },

    /// A named environment value has an incompatible type.
    #[error("method '{method}': environment argument '{name}' of type '{expected}' cannot accept '{got}'")]
    EnvType {
        method: String,
        name: String,
        expected: String,
        got: String,
    },
}

// ============================================================================
// Call-time Errors
// ============================================================================

/// A script argument could not be turned into its native parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// The argument list ended before a required argument.
    #[error("Not enough arguments, first missing: {name}")]
    NotEnoughArguments { name: String },

    /// A required argument received nil.
    #[error("Argument {name} cannot be null")]
    NullArgument { name: String },

    /// The converter could not produce the native type.
    #[error("Failed to convert arg '{name}' value '{value}' to '{target}'")]
    ConversionFailed {
        name: String,
        value: String,
        target: String,
    },

    /// More script arguments than declared parameters.
    #[error("Too many arguments, expected at most {expected}, got {got}")]
    TooManyArguments { expected: usize, got: usize },
}

/// Errors converting between script and native values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Value has a different type than expected.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Integer value out of range for the target type.
    #[error("integer overflow: {value} doesn't fit in {target_type}")]
    IntegerOverflow {
        value: i64,
        target_type: &'static str,
    },

    /// Null cannot be converted to a non-optional type.
    #[error("null cannot be converted to {target_type}")]
    NullValue { target_type: &'static str },

    /// No converter knows how to represent the value in scripts.
    #[error("no script representation for native value of type '{type_name}'")]
    Unrepresentable { type_name: String },
}

/// Failure raised by a bound native function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NativeError {
    /// A typed argument could not be extracted.
    #[error("argument {index}: {source}")]
    Conversion {
        index: usize,
        #[source]
        source: ConversionError,
    },

    /// Argument index out of bounds.
    #[error("argument index {index} out of bounds (count: {count})")]
    ArgumentIndexOutOfBounds { index: usize, count: usize },

    /// An object argument is not of the requested Rust type.
    #[error("argument {index}: expected {expected}")]
    InvalidObject { index: usize, expected: &'static str },

    /// Domain-level failure reported by the function itself.
    #[error("{0}")]
    Failed(String),
}

impl NativeError {
    /// Create a domain-level failure.
    pub fn failed(message: impl Into<String>) -> Self {
        NativeError::Failed(message.into())
    }
}

/// A single script call failed.
///
/// The display string is what the calling script sees: it always names the
/// method, and the argument when one is at fault.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// A script argument was missing or invalid.
    #[error("{method}: {source}")]
    Argument {
        method: String,
        #[source]
        source: ArgumentError,
    },

    /// A required environment value is absent from the host context.
    #[error("{method}: missing environment value '{name}'")]
    MissingEnvironment { method: String, name: String },

    /// The native function failed.
    #[error("{method}: {source}")]
    Invocation {
        method: String,
        #[source]
        source: NativeError,
    },

    /// A multi-value result did not supply the declared number of values.
    #[error("{method}: expected {expected} return value(s), got {got}")]
    ReturnArity {
        method: String,
        expected: usize,
        got: usize,
    },

    /// The result could not be converted to script values.
    #[error("{method}: invalid result: {source}")]
    Result {
        method: String,
        #[source]
        source: ConversionError,
    },

    /// No method at the requested index or name.
    #[error("no such method: {0}")]
    NoSuchMethod(String),
}

impl CallError {
    /// Name of the method that failed, if known.
    pub fn method(&self) -> Option<&str> {
        match self {
            CallError::Argument { method, .. }
            | CallError::MissingEnvironment { method, .. }
            | CallError::Invocation { method, .. }
            | CallError::ReturnArity { method, .. }
            | CallError::Result { method, .. } => Some(method),
            CallError::NoSuchMethod(_) => None,
        }
    }
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Why a single method could not be wrapped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WrapCause {
    /// The declaration itself is malformed.
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// The declaration does not fit the adapter kind's environment.
    #[error(transparent)]
    Environment(#[from] EnvironmentError),
}

/// Errors building adapters and method tables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// A method failed to wrap; the whole adapter is rejected.
    #[error("Failed to wrap method '{method}' of adapter '{adapter}': {cause}")]
    MethodWrap {
        adapter: String,
        method: String,
        #[source]
        cause: WrapCause,
    },

    /// Two different declarations expose the same name.
    #[error("duplicate method name '{name}': provided by '{first}' and '{second}'")]
    DuplicateMethod {
        name: String,
        first: String,
        second: String,
    },
}

/// Listing an adapter's methods failed.
///
/// Logged by the adapter builder; the adapter is installed with no methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot enumerate methods: {0}")]
pub struct EnumerationError(pub String);

impl EnumerationError {
    /// Create an enumeration error.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

// ============================================================================
// Unified Error
// ============================================================================

/// Top-level error for unified handling.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Call(#[from] CallError),
}
