//! Bound native functions and their argument view.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use scriptbind_core::{FromNative, NativeError, NativeValue};

/// Arguments handed to a bound native function.
///
/// Values are in native parameter order: positional environment values
/// (target first), named environment values, then converted script
/// arguments.
///
/// ## Typed Argument Access
///
/// ```ignore
/// let tank: &Tank = args.target()?;
/// let amount: i32 = args.arg(1)?;
/// let simulate: Option<bool> = args.arg(2)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct NativeArgs {
    values: Vec<NativeValue>,
}

impl NativeArgs {
    pub fn new(values: Vec<NativeValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[NativeValue] {
        &self.values
    }

    /// Get a raw argument.
    pub fn get(&self, index: usize) -> Result<&NativeValue, NativeError> {
        self.values
            .get(index)
            .ok_or(NativeError::ArgumentIndexOutOfBounds {
                index,
                count: self.values.len(),
            })
    }

    /// Get a typed argument.
    pub fn arg<T: FromNative>(&self, index: usize) -> Result<T, NativeError> {
        T::from_native(self.get(index)?).map_err(|source| NativeError::Conversion { index, source })
    }

    /// Borrow the payload of an object argument as `T`.
    pub fn object<T: Any>(&self, index: usize) -> Result<&T, NativeError> {
        self.get(index)?
            .as_object()
            .and_then(|o| o.downcast_ref::<T>())
            .ok_or(NativeError::InvalidObject {
                index,
                expected: std::any::type_name::<T>(),
            })
    }

    /// Borrow the call target (argument 0) as `T`.
    pub fn target<T: Any>(&self) -> Result<&T, NativeError> {
        self.object(0)
    }
}

type NativeFnInner = dyn Fn(&NativeArgs) -> Result<NativeValue, NativeError> + Send + Sync;

/// Type-erased native function bound to a method declaration.
///
/// The callable is shared through `Arc`, so cloning is cheap.
#[derive(Clone)]
pub struct NativeMethod {
    inner: Arc<NativeFnInner>,
}

impl NativeMethod {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&NativeArgs) -> Result<NativeValue, NativeError> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Call with the given arguments.
    pub fn call(&self, args: &NativeArgs) -> Result<NativeValue, NativeError> {
        (self.inner)(args)
    }
}

impl fmt::Debug for NativeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeMethod").finish_non_exhaustive()
    }
}
