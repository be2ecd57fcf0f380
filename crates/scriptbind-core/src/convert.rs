//! Conversion between script values and native values.
//!
//! Two layers live here:
//! - [`FromNative`] / [`IntoNative`]: typed extraction used by bound native
//!   functions to read their parameters and build their results.
//! - [`TypeConverter`]: the per-host bridge between [`ScriptValue`] and
//!   [`NativeValue`] consumed by argument conversion and result conversion.
//!
//! ## Supported Primitive Types
//!
//! - Integers: `i8`..`i64`, `u8`..`u64`, `isize`, `usize` (bounds-checked)
//! - Floats: `f32`, `f64` (integers widen)
//! - `bool`, `String`, `()`
//! - `Option<T>` (null maps to `None`), `Vec<T>` (arrays, lists, multi values)
//!
//! ## Example
//!
//! ```
//! use scriptbind_core::{FromNative, IntoNative, NativeValue};
//!
//! let value = 42i32.into_native();
//! assert_eq!(i32::from_native(&value).unwrap(), 42);
//! assert!(u8::from_native(&NativeValue::Int(300)).is_err());
//! ```

use std::sync::Arc;

use crate::error::ConversionError;
use crate::{ClassRef, NativeObject, NativeType, NativeValue, ScriptTable, ScriptValue};

/// Extract a Rust value from a [`NativeValue`].
pub trait FromNative: Sized {
    /// Extract a value, failing with a [`ConversionError`] on incompatible input.
    fn from_native(value: &NativeValue) -> Result<Self, ConversionError>;
}

/// Convert a Rust value into a [`NativeValue`].
pub trait IntoNative {
    /// Convert this value.
    fn into_native(self) -> NativeValue;
}

// ============================================================================
// Integer implementations
// ============================================================================

macro_rules! impl_native_int {
    ($($ty:ty),*) => {
        $(
            impl FromNative for $ty {
                fn from_native(value: &NativeValue) -> Result<Self, ConversionError> {
                    match value {
                        NativeValue::Int(v) => <$ty>::try_from(*v).map_err(|_| {
                            ConversionError::IntegerOverflow {
                                value: *v,
                                target_type: stringify!($ty),
                            }
                        }),
                        NativeValue::Null => Err(ConversionError::NullValue {
                            target_type: stringify!($ty),
                        }),
                        _ => Err(ConversionError::TypeMismatch {
                            expected: "int",
                            actual: value.type_name(),
                        }),
                    }
                }
            }

            impl IntoNative for $ty {
                // Unsigned values past `i64::MAX` keep their magnitude as a float.
                fn into_native(self) -> NativeValue {
                    i64::try_from(self).map_or(NativeValue::Float(self as f64), NativeValue::Int)
                }
            }
        )*
    };
}

impl_native_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

// ============================================================================
// Float implementations
// ============================================================================

macro_rules! impl_native_float {
    ($($ty:ty),*) => {
        $(
            impl FromNative for $ty {
                fn from_native(value: &NativeValue) -> Result<Self, ConversionError> {
                    match value {
                        NativeValue::Float(v) => Ok(*v as $ty),
                        NativeValue::Int(v) => Ok(*v as $ty),
                        NativeValue::Null => Err(ConversionError::NullValue {
                            target_type: stringify!($ty),
                        }),
                        _ => Err(ConversionError::TypeMismatch {
                            expected: "float",
                            actual: value.type_name(),
                        }),
                    }
                }
            }

            impl IntoNative for $ty {
                fn into_native(self) -> NativeValue {
                    NativeValue::Float(self as f64)
                }
            }
        )*
    };
}

impl_native_float!(f32, f64);

// ============================================================================
// Other primitives
// ============================================================================

impl FromNative for bool {
    fn from_native(value: &NativeValue) -> Result<Self, ConversionError> {
        match value {
            NativeValue::Bool(v) => Ok(*v),
            NativeValue::Null => Err(ConversionError::NullValue { target_type: "bool" }),
            _ => Err(ConversionError::TypeMismatch {
                expected: "bool",
                actual: value.type_name(),
            }),
        }
    }
}

impl IntoNative for bool {
    fn into_native(self) -> NativeValue {
        NativeValue::Bool(self)
    }
}

impl FromNative for String {
    fn from_native(value: &NativeValue) -> Result<Self, ConversionError> {
        match value {
            NativeValue::String(v) => Ok(v.clone()),
            NativeValue::Null => Err(ConversionError::NullValue { target_type: "String" }),
            _ => Err(ConversionError::TypeMismatch {
                expected: "string",
                actual: value.type_name(),
            }),
        }
    }
}

impl IntoNative for String {
    fn into_native(self) -> NativeValue {
        NativeValue::String(self)
    }
}

impl IntoNative for &str {
    fn into_native(self) -> NativeValue {
        NativeValue::String(self.to_string())
    }
}

impl IntoNative for () {
    fn into_native(self) -> NativeValue {
        NativeValue::Null
    }
}

impl FromNative for NativeValue {
    fn from_native(value: &NativeValue) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl IntoNative for NativeValue {
    fn into_native(self) -> NativeValue {
        self
    }
}

impl FromNative for NativeObject {
    fn from_native(value: &NativeValue) -> Result<Self, ConversionError> {
        match value {
            NativeValue::Object(o) => Ok(o.clone()),
            NativeValue::Null => Err(ConversionError::NullValue { target_type: "object" }),
            _ => Err(ConversionError::TypeMismatch {
                expected: "object",
                actual: value.type_name(),
            }),
        }
    }
}

impl IntoNative for NativeObject {
    fn into_native(self) -> NativeValue {
        NativeValue::Object(self)
    }
}

// ============================================================================
// Containers
// ============================================================================

impl<T: FromNative> FromNative for Option<T> {
    fn from_native(value: &NativeValue) -> Result<Self, ConversionError> {
        match value {
            NativeValue::Null => Ok(None),
            other => T::from_native(other).map(Some),
        }
    }
}

impl<T: IntoNative> IntoNative for Option<T> {
    fn into_native(self) -> NativeValue {
        match self {
            Some(v) => v.into_native(),
            None => NativeValue::Null,
        }
    }
}

impl<T: FromNative> FromNative for Vec<T> {
    fn from_native(value: &NativeValue) -> Result<Self, ConversionError> {
        match value {
            NativeValue::Array(items) | NativeValue::List(items) | NativeValue::Multi(items) => {
                items.iter().map(T::from_native).collect()
            }
            NativeValue::Null => Err(ConversionError::NullValue { target_type: "array" }),
            _ => Err(ConversionError::TypeMismatch {
                expected: "array",
                actual: value.type_name(),
            }),
        }
    }
}

impl<T: IntoNative> IntoNative for Vec<T> {
    fn into_native(self) -> NativeValue {
        NativeValue::Array(self.into_iter().map(IntoNative::into_native).collect())
    }
}

// ============================================================================
// Script <-> native bridge
// ============================================================================

/// Bidirectional conversion between script values and native values.
///
/// One converter is installed per host architecture. `to_native` returning
/// `None` is the failure signal; the argument layer turns it into an
/// [`ArgumentError`](crate::ArgumentError) naming the argument.
pub trait TypeConverter: Send + Sync {
    /// Convert a script value to the requested native type.
    fn to_native(&self, value: &ScriptValue, target: &NativeType) -> Option<NativeValue>;

    /// Convert a native value to its script representation.
    fn from_native(&self, value: &NativeValue) -> Result<ScriptValue, ConversionError>;
}

/// Shared handle to a host converter.
pub type SharedConverter = Arc<dyn TypeConverter>;

/// Class under which a converter is exposed as a named environment value.
pub fn converter_class() -> ClassRef {
    ClassRef::new("TypeConverter")
}

/// Wrap a converter as a native object so it can be injected as an environment value.
pub fn converter_object(converter: SharedConverter) -> NativeObject {
    NativeObject::new(converter_class(), converter)
}

/// Pluggable conversion rule consulted by [`StandardConverter`] before the
/// built-in primitive rules.
///
/// `parent` is the full converter, for converting nested values.
pub trait ValueConverter: Send + Sync {
    /// Convert toward native, or `None` if this rule does not apply.
    fn to_native(
        &self,
        parent: &dyn TypeConverter,
        value: &ScriptValue,
        target: &NativeType,
    ) -> Option<NativeValue>;

    /// Convert toward script, or `None` if this rule does not apply.
    fn from_native(
        &self,
        parent: &dyn TypeConverter,
        value: &NativeValue,
    ) -> Option<Result<ScriptValue, ConversionError>>;
}

/// Converter with the primitive rules of the scripting value model.
///
/// Custom rules are tried in registration order before the built-in ones.
#[derive(Default, Clone)]
pub struct StandardConverter {
    custom: Vec<Arc<dyn ValueConverter>>,
}

impl StandardConverter {
    /// Create a converter with only the primitive rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom rule.
    pub fn with_converter(mut self, converter: impl ValueConverter + 'static) -> Self {
        self.custom.push(Arc::new(converter));
        self
    }

    fn sequence_to_native(&self, table: &ScriptTable, element: &NativeType) -> Option<Vec<NativeValue>> {
        table
            .sequence()?
            .into_iter()
            .map(|v| self.to_native(v, element))
            .collect()
    }

    fn natural(&self, value: &ScriptValue) -> Option<NativeValue> {
        Some(match value {
            ScriptValue::Nil => return None,
            ScriptValue::Boolean(b) => NativeValue::Bool(*b),
            ScriptValue::Number(n) => NativeValue::Float(*n),
            ScriptValue::String(s) => NativeValue::String(s.clone()),
            ScriptValue::Table(t) => match self.sequence_to_native(t, &NativeType::Any) {
                Some(items) => NativeValue::List(items),
                None => NativeValue::Map(
                    t.iter()
                        .map(|(k, v)| Some((self.natural(k)?, self.natural(v)?)))
                        .collect::<Option<Vec<_>>>()?,
                ),
            },
        })
    }
}

impl TypeConverter for StandardConverter {
    fn to_native(&self, value: &ScriptValue, target: &NativeType) -> Option<NativeValue> {
        if let Some(converted) = self
            .custom
            .iter()
            .find_map(|c| c.to_native(self, value, target))
        {
            return Some(converted);
        }

        match (target, value) {
            (_, ScriptValue::Nil) => None,
            (NativeType::Bool, ScriptValue::Boolean(b)) => Some(NativeValue::Bool(*b)),
            (NativeType::Int, ScriptValue::Number(n))
                if (i64::MIN as f64..i64::MAX as f64).contains(&n.trunc()) =>
            {
                Some(NativeValue::Int(n.trunc() as i64))
            }
            (NativeType::Float, ScriptValue::Number(n)) => Some(NativeValue::Float(*n)),
            (NativeType::String, ScriptValue::String(s)) => Some(NativeValue::String(s.clone())),
            (NativeType::String, ScriptValue::Number(_)) => {
                Some(NativeValue::String(value.to_string()))
            }
            (NativeType::Array(e), ScriptValue::Table(t)) => {
                self.sequence_to_native(t, e).map(NativeValue::Array)
            }
            (NativeType::List(e) | NativeType::Set(e), ScriptValue::Table(t)) => {
                self.sequence_to_native(t, e).map(NativeValue::List)
            }
            (NativeType::Map(k, v), ScriptValue::Table(t)) => t
                .iter()
                .map(|(key, val)| Some((self.to_native(key, k)?, self.to_native(val, v)?)))
                .collect::<Option<Vec<_>>>()
                .map(NativeValue::Map),
            (NativeType::Any, _) => self.natural(value),
            _ => None,
        }
    }

    fn from_native(&self, value: &NativeValue) -> Result<ScriptValue, ConversionError> {
        if let Some(converted) = self.custom.iter().find_map(|c| c.from_native(self, value)) {
            return converted;
        }

        Ok(match value {
            NativeValue::Null => ScriptValue::Nil,
            NativeValue::Bool(b) => ScriptValue::Boolean(*b),
            NativeValue::Int(i) => ScriptValue::Number(*i as f64),
            NativeValue::Float(f) => ScriptValue::Number(*f),
            NativeValue::String(s) => ScriptValue::String(s.clone()),
            NativeValue::Array(items) | NativeValue::List(items) | NativeValue::Multi(items) => {
                ScriptValue::Table(ScriptTable::from_sequence(
                    items
                        .iter()
                        .map(|v| self.from_native(v))
                        .collect::<Result<Vec<_>, _>>()?,
                ))
            }
            NativeValue::Map(entries) => {
                let mut table = ScriptTable::new();
                for (k, v) in entries {
                    table.insert(self.from_native(k)?, self.from_native(v)?);
                }
                ScriptValue::Table(table)
            }
            NativeValue::Object(o) => {
                return Err(ConversionError::Unrepresentable {
                    type_name: o.class().name().to_string(),
                });
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_narrowing_is_bounds_checked() {
        assert_eq!(u8::from_native(&NativeValue::Int(255)).unwrap(), 255);
        assert!(matches!(
            u8::from_native(&NativeValue::Int(256)),
            Err(ConversionError::IntegerOverflow { value: 256, target_type: "u8" })
        ));
        assert!(u32::from_native(&NativeValue::Int(-1)).is_err());
        assert!(matches!(
            i32::from_native(&NativeValue::Null),
            Err(ConversionError::NullValue { .. })
        ));
    }

    #[test]
    fn floats_accept_integers() {
        assert_eq!(f64::from_native(&NativeValue::Int(3)).unwrap(), 3.0);
        assert!(f32::from_native(&NativeValue::Bool(true)).is_err());
    }

    #[test]
    fn option_maps_null_to_none() {
        assert_eq!(Option::<i32>::from_native(&NativeValue::Null).unwrap(), None);
        assert_eq!(Option::<i32>::from_native(&NativeValue::Int(5)).unwrap(), Some(5));
        assert_eq!(None::<i32>.into_native(), NativeValue::Null);
    }

    #[test]
    fn vec_extracts_arrays_and_lists() {
        let arr = NativeValue::Array(vec![NativeValue::Int(1), NativeValue::Int(2)]);
        assert_eq!(Vec::<i64>::from_native(&arr).unwrap(), vec![1, 2]);
        assert_eq!(vec![1u8, 2u8].into_native(), arr);
    }

    #[test]
    fn standard_number_to_int_truncates() {
        let c = StandardConverter::new();
        assert_eq!(
            c.to_native(&ScriptValue::Number(2.9), &NativeType::Int),
            Some(NativeValue::Int(2))
        );
        assert_eq!(
            c.to_native(&ScriptValue::Number(-2.9), &NativeType::Int),
            Some(NativeValue::Int(-2))
        );
        assert_eq!(c.to_native(&ScriptValue::Number(f64::NAN), &NativeType::Int), None);
        assert_eq!(c.to_native(&ScriptValue::from("3"), &NativeType::Int), None);
    }

    #[test]
    fn standard_number_to_int_rejects_out_of_range() {
        let c = StandardConverter::new();
        assert_eq!(c.to_native(&ScriptValue::Number(1e30), &NativeType::Int), None);
        assert_eq!(c.to_native(&ScriptValue::Number(-1e30), &NativeType::Int), None);
        assert_eq!(c.to_native(&ScriptValue::Number(f64::INFINITY), &NativeType::Int), None);
        assert_eq!(
            c.to_native(&ScriptValue::Number(-9.2e18), &NativeType::Int),
            Some(NativeValue::Int(-9_200_000_000_000_000_000))
        );
    }

    #[test]
    fn standard_large_number_to_string() {
        let c = StandardConverter::new();
        assert_eq!(
            c.to_native(&ScriptValue::Number(1e20), &NativeType::String),
            Some(NativeValue::String("100000000000000000000".into()))
        );
    }

    #[test]
    fn unsigned_past_i64_range_becomes_float() {
        assert_eq!(u64::MAX.into_native(), NativeValue::Float(u64::MAX as f64));
        assert_eq!((i64::MAX as u64).into_native(), NativeValue::Int(i64::MAX));
        assert_eq!(7usize.into_native(), NativeValue::Int(7));
    }

    #[test]
    fn standard_numbers_coerce_to_strings() {
        let c = StandardConverter::new();
        assert_eq!(
            c.to_native(&ScriptValue::Number(4.0), &NativeType::String),
            Some(NativeValue::String("4".into()))
        );
    }

    #[test]
    fn standard_nil_never_converts() {
        let c = StandardConverter::new();
        assert_eq!(c.to_native(&ScriptValue::Nil, &NativeType::Any), None);
        assert_eq!(c.to_native(&ScriptValue::Nil, &NativeType::String), None);
    }

    #[test]
    fn standard_tables_to_collections() {
        let c = StandardConverter::new();
        let seq = ScriptValue::Table(ScriptTable::from_sequence([
            ScriptValue::Number(1.0),
            ScriptValue::Number(2.0),
        ]));
        assert_eq!(
            c.to_native(&seq, &NativeType::array(NativeType::Int)),
            Some(NativeValue::Array(vec![NativeValue::Int(1), NativeValue::Int(2)]))
        );
        assert_eq!(c.to_native(&seq, &NativeType::array(NativeType::Bool)), None);

        let map = ScriptValue::Table(ScriptTable::new().with("a", true));
        assert_eq!(
            c.to_native(&map, &NativeType::map(NativeType::String, NativeType::Bool)),
            Some(NativeValue::Map(vec![(
                NativeValue::String("a".into()),
                NativeValue::Bool(true)
            )]))
        );
        assert_eq!(c.to_native(&map, &NativeType::list(NativeType::Bool)), None);
    }

    #[test]
    fn standard_any_uses_natural_form() {
        let c = StandardConverter::new();
        let seq = ScriptValue::Table(ScriptTable::from_sequence([ScriptValue::from("x")]));
        assert_eq!(
            c.to_native(&seq, &NativeType::Any),
            Some(NativeValue::List(vec![NativeValue::String("x".into())]))
        );
        assert_eq!(
            c.to_native(&ScriptValue::Number(1.5), &NativeType::Any),
            Some(NativeValue::Float(1.5))
        );
    }

    #[test]
    fn standard_from_native() {
        let c = StandardConverter::new();
        let v = c
            .from_native(&NativeValue::List(vec![NativeValue::Int(7), NativeValue::Bool(false)]))
            .unwrap();
        let table = v.as_table().unwrap();
        assert_eq!(table.get(&ScriptValue::Number(1.0)), Some(&ScriptValue::Number(7.0)));
        assert_eq!(table.get(&ScriptValue::Number(2.0)), Some(&ScriptValue::Boolean(false)));

        let obj = NativeValue::Object(NativeObject::new(ClassRef::new("Tank"), ()));
        assert!(matches!(
            c.from_native(&obj),
            Err(ConversionError::Unrepresentable { type_name }) if type_name == "Tank"
        ));
    }

    struct Fluid;

    impl ValueConverter for Fluid {
        fn to_native(
            &self,
            _parent: &dyn TypeConverter,
            value: &ScriptValue,
            target: &NativeType,
        ) -> Option<NativeValue> {
            match target {
                NativeType::Class(c) if c.name() == "Fluid" => {
                    let name = value.as_str()?;
                    Some(NativeValue::Object(NativeObject::new(c.clone(), name.to_string())))
                }
                _ => None,
            }
        }

        fn from_native(
            &self,
            _parent: &dyn TypeConverter,
            value: &NativeValue,
        ) -> Option<Result<ScriptValue, ConversionError>> {
            let obj = value.as_object()?;
            let name = obj.downcast_ref::<String>()?;
            Some(Ok(ScriptValue::Table(ScriptTable::new().with("name", name.as_str()))))
        }
    }

    #[test]
    fn custom_converters_take_precedence() {
        let c = StandardConverter::new().with_converter(Fluid);
        let fluid = ClassRef::new("Fluid");
        let native = c
            .to_native(&ScriptValue::from("water"), &NativeType::class(&fluid))
            .unwrap();
        assert_eq!(native.as_object().unwrap().downcast_ref::<String>().unwrap(), "water");

        let back = c.from_native(&native).unwrap();
        assert_eq!(
            back.as_table().unwrap().get_str("name"),
            Some(&ScriptValue::from("water"))
        );
    }

    #[test]
    fn converter_is_exposed_as_object() {
        let shared: SharedConverter = Arc::new(StandardConverter::new());
        let obj = converter_object(shared);
        assert_eq!(obj.class(), &converter_class());
        assert!(obj.downcast_ref::<SharedConverter>().is_some());
    }
}
