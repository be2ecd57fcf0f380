//! Native type model.
//!
//! [`NativeType`] describes the host-side type of a parameter or result. It
//! plays the part runtime reflection would play in a managed host: adapters
//! declare their parameter types explicitly, and assignability checks are
//! pure value comparisons over [`ClassRef`] supertype lists.
//!
//! Generic adapter definitions use [`NativeType::Var`] placeholders that are
//! substituted through a [`TypeBindings`] map when a concrete adapter is
//! registered.
//!
//! # Example
//!
//! ```
//! use scriptbind_core::{ClassRef, NativeType, TypeBindings};
//!
//! let machine = ClassRef::new("Machine");
//! let furnace = ClassRef::new("Furnace").extends(&machine);
//!
//! let param = NativeType::Class(machine.clone());
//! assert!(param.is_assignable_from(&NativeType::Class(furnace.clone())));
//!
//! let bindings = TypeBindings::new().bind("T", NativeType::Class(furnace));
//! let resolved = NativeType::var("T").resolve(&bindings).unwrap();
//! assert_eq!(resolved.to_string(), "Furnace");
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::TypeHash;

/// A named host class together with the identities of all its supertypes.
#[derive(Clone)]
pub struct ClassRef {
    name: Arc<str>,
    hash: TypeHash,
    supertypes: Arc<[TypeHash]>,
}

impl ClassRef {
    /// Create a class with no supertypes.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::from_name(&name),
            name,
            supertypes: Arc::from([]),
        }
    }

    /// Derive a class from `parent`, inheriting all of its supertypes.
    pub fn extends(self, parent: &ClassRef) -> Self {
        self.implements(std::slice::from_ref(parent))
    }

    /// Add several supertypes (base class and interfaces) at once.
    pub fn implements(mut self, parents: &[ClassRef]) -> Self {
        let mut supertypes: Vec<TypeHash> = self.supertypes.to_vec();
        for parent in parents {
            for hash in std::iter::once(parent.hash).chain(parent.supertypes.iter().copied()) {
                if !supertypes.contains(&hash) {
                    supertypes.push(hash);
                }
            }
        }
        self.supertypes = supertypes.into();
        self
    }

    /// The class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The class identity.
    pub fn hash(&self) -> TypeHash {
        self.hash
    }

    /// Identities of every supertype, nearest first.
    pub fn supertypes(&self) -> &[TypeHash] {
        &self.supertypes
    }

    /// Check whether `self` is `other` or one of its subclasses.
    pub fn is_subclass_of(&self, other: &ClassRef) -> bool {
        self.hash == other.hash || self.supertypes.contains(&other.hash)
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for ClassRef {}

impl Hash for ClassRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassRef({})", self.name)
    }
}

/// The host-side type of a parameter, environment value or result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeType {
    /// No value.
    Void,
    /// Boolean.
    Bool,
    /// Integral number (all widths).
    Int,
    /// Floating point number.
    Float,
    /// Text.
    String,
    /// Accepts any value; the root of the class hierarchy.
    Any,
    /// A host class.
    Class(ClassRef),
    /// Fixed element array; the native shape of a variadic parameter.
    Array(Box<NativeType>),
    /// Ordered collection.
    List(Box<NativeType>),
    /// Unordered collection.
    Set(Box<NativeType>),
    /// Key/value mapping.
    Map(Box<NativeType>, Box<NativeType>),
    /// Explicit ordered multi-value result wrapper.
    MultiReturn,
    /// Unresolved type variable of a generic adapter definition.
    Var(Arc<str>),
}

impl NativeType {
    /// Shorthand for a class type.
    pub fn class(class: &ClassRef) -> Self {
        NativeType::Class(class.clone())
    }

    /// Shorthand for an array type.
    pub fn array(element: NativeType) -> Self {
        NativeType::Array(Box::new(element))
    }

    /// Shorthand for a list type.
    pub fn list(element: NativeType) -> Self {
        NativeType::List(Box::new(element))
    }

    /// Shorthand for a set type.
    pub fn set(element: NativeType) -> Self {
        NativeType::Set(Box::new(element))
    }

    /// Shorthand for a map type.
    pub fn map(key: NativeType, value: NativeType) -> Self {
        NativeType::Map(Box::new(key), Box::new(value))
    }

    /// Shorthand for a type variable.
    pub fn var(name: impl Into<Arc<str>>) -> Self {
        NativeType::Var(name.into())
    }

    /// Deterministic identity of this type.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            NativeType::Class(class) => class.hash(),
            NativeType::Array(e) => TypeHash::from_composite("Array", &[e.type_hash()]),
            NativeType::List(e) => TypeHash::from_composite("List", &[e.type_hash()]),
            NativeType::Set(e) => TypeHash::from_composite("Set", &[e.type_hash()]),
            NativeType::Map(k, v) => {
                TypeHash::from_composite("Map", &[k.type_hash(), v.type_hash()])
            }
            NativeType::Var(name) => TypeHash::from_composite("Var", &[TypeHash::from_name(name)]),
            other => TypeHash::from_name(other.primitive_name()),
        }
    }

    fn primitive_name(&self) -> &'static str {
        match self {
            NativeType::Void => "void",
            NativeType::Bool => "boolean",
            NativeType::Int => "int",
            NativeType::Float => "double",
            NativeType::String => "String",
            NativeType::Any => "Object",
            NativeType::MultiReturn => "MultiReturn",
            _ => "composite",
        }
    }

    /// Element type of arrays and collections.
    pub fn element(&self) -> Option<&NativeType> {
        match self {
            NativeType::Array(e) | NativeType::List(e) | NativeType::Set(e) => Some(e),
            _ => None,
        }
    }

    /// Whether a value of this type may be split into several script results
    /// when the method carries the multiple-return marker.
    pub fn is_ordered_collection(&self) -> bool {
        matches!(self, NativeType::Array(_) | NativeType::List(_))
    }

    /// Whether this type, or any type nested in it, is an unresolved variable.
    pub fn has_variables(&self) -> bool {
        match self {
            NativeType::Var(_) => true,
            NativeType::Array(e) | NativeType::List(e) | NativeType::Set(e) => e.has_variables(),
            NativeType::Map(k, v) => k.has_variables() || v.has_variables(),
            _ => false,
        }
    }

    /// Check whether a value of type `other` can be passed where `self` is expected.
    pub fn is_assignable_from(&self, other: &NativeType) -> bool {
        match (self, other) {
            (NativeType::Any, _) => !matches!(other, NativeType::Void),
            (NativeType::Class(target), NativeType::Class(source)) => source.is_subclass_of(target),
            (NativeType::Array(target), NativeType::Array(source)) => {
                target.is_assignable_from(source)
            }
            (NativeType::Float, NativeType::Int) => true,
            _ => self == other,
        }
    }

    /// Substitute type variables through `bindings`.
    ///
    /// Returns the name of the first variable without a binding.
    pub fn resolve(&self, bindings: &TypeBindings) -> Result<NativeType, Arc<str>> {
        Ok(match self {
            NativeType::Var(name) => match bindings.get(name) {
                // Bound types must themselves be concrete.
                Some(bound) if !bound.has_variables() => bound.clone(),
                _ => return Err(name.clone()),
            },
            NativeType::Array(e) => NativeType::array(e.resolve(bindings)?),
            NativeType::List(e) => NativeType::list(e.resolve(bindings)?),
            NativeType::Set(e) => NativeType::set(e.resolve(bindings)?),
            NativeType::Map(k, v) => NativeType::map(k.resolve(bindings)?, v.resolve(bindings)?),
            other => other.clone(),
        })
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Class(class) => f.write_str(class.name()),
            NativeType::Array(e) => write!(f, "{}[]", e),
            NativeType::List(e) => write!(f, "List<{}>", e),
            NativeType::Set(e) => write!(f, "Set<{}>", e),
            NativeType::Map(k, v) => write!(f, "Map<{}, {}>", k, v),
            NativeType::Var(name) => f.write_str(name),
            other => f.write_str(other.primitive_name()),
        }
    }
}

/// Substitution map from type-variable names to concrete types.
///
/// Supplied when a concrete adapter of a generic definition is registered.
#[derive(Debug, Clone, Default)]
pub struct TypeBindings {
    bindings: FxHashMap<Arc<str>, NativeType>,
}

impl TypeBindings {
    /// Create an empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `ty`, replacing any previous binding.
    pub fn bind(mut self, name: impl Into<Arc<str>>, ty: NativeType) -> Self {
        self.bindings.insert(name.into(), ty);
        self
    }

    /// Look up a binding.
    pub fn get(&self, name: &str) -> Option<&NativeType> {
        self.bindings.get(name)
    }

    /// Check if there are no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hierarchy() -> (ClassRef, ClassRef, ClassRef) {
        let a = ClassRef::new("A");
        let b = ClassRef::new("B").extends(&a);
        let c = ClassRef::new("C");
        (a, b, c)
    }

    #[test]
    fn subclass_is_assignable_to_parent() {
        let (a, b, c) = hierarchy();
        assert!(NativeType::class(&a).is_assignable_from(&NativeType::class(&b)));
        assert!(!NativeType::class(&b).is_assignable_from(&NativeType::class(&a)));
        assert!(!NativeType::class(&a).is_assignable_from(&NativeType::class(&c)));
    }

    #[test]
    fn supertypes_are_transitive() {
        let (a, b, _) = hierarchy();
        let d = ClassRef::new("D").extends(&b);
        assert!(d.is_subclass_of(&a));
        assert_eq!(d.supertypes(), &[b.hash(), a.hash()]);
    }

    #[test]
    fn any_accepts_everything_but_void() {
        let (a, _, _) = hierarchy();
        assert!(NativeType::Any.is_assignable_from(&NativeType::class(&a)));
        assert!(NativeType::Any.is_assignable_from(&NativeType::Int));
        assert!(!NativeType::Any.is_assignable_from(&NativeType::Void));
    }

    #[test]
    fn arrays_are_covariant() {
        let (a, b, _) = hierarchy();
        let arr_a = NativeType::array(NativeType::class(&a));
        let arr_b = NativeType::array(NativeType::class(&b));
        assert!(arr_a.is_assignable_from(&arr_b));
        assert!(!arr_b.is_assignable_from(&arr_a));
    }

    #[test]
    fn lists_are_invariant() {
        let (a, b, _) = hierarchy();
        let list_a = NativeType::list(NativeType::class(&a));
        let list_b = NativeType::list(NativeType::class(&b));
        assert!(!list_a.is_assignable_from(&list_b));
        assert!(list_a.is_assignable_from(&list_a.clone()));
    }

    #[test]
    fn resolve_substitutes_nested_variables() {
        let (_, b, _) = hierarchy();
        let bindings = TypeBindings::new()
            .bind("T", NativeType::class(&b))
            .bind("P", NativeType::Float);
        let ty = NativeType::map(NativeType::var("T"), NativeType::list(NativeType::var("P")));
        assert_eq!(
            ty.resolve(&bindings).unwrap(),
            NativeType::map(NativeType::class(&b), NativeType::list(NativeType::Float))
        );
    }

    #[test]
    fn resolve_reports_unbound_variable() {
        let err = NativeType::array(NativeType::var("E"))
            .resolve(&TypeBindings::new())
            .unwrap_err();
        assert_eq!(&*err, "E");
    }

    #[test]
    fn type_hash_distinguishes_composites() {
        assert_ne!(
            NativeType::list(NativeType::Int).type_hash(),
            NativeType::set(NativeType::Int).type_hash()
        );
        assert_eq!(
            NativeType::array(NativeType::String).type_hash(),
            NativeType::array(NativeType::String).type_hash()
        );
    }

    #[test]
    fn display_spelling() {
        let (a, _, _) = hierarchy();
        assert_eq!(NativeType::array(NativeType::Int).to_string(), "int[]");
        assert_eq!(
            NativeType::map(NativeType::String, NativeType::class(&a)).to_string(),
            "Map<String, A>"
        );
    }
}
