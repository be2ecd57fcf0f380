//! Native type → script type classification.
//!
//! [`TypeClassification`] runs an ordered chain of [`TypeClassifier`]s; the
//! first one that recognizes a type wins and unrecognized types fall back to
//! [`ScriptType::OBJECT`]. Results are cached per native type.
//!
//! Structured mappings are data: a [`StructuredClassifier`] is a table from
//! class to [`ScriptType`], so new item/fluid/... encodings need no new code.
//!
//! # Thread Safety
//!
//! The cache is guarded by a `parking_lot::RwLock`. Classification happens at
//! registration time, so contention is not a concern.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::{ArgType, ClassRef, NativeType, ScriptType, TypeHash};

/// A single link of the classification chain.
pub trait TypeClassifier: Send + Sync {
    /// Classify `ty`, or return `None` to defer to the next classifier.
    fn classify(&self, ty: &NativeType) -> Option<ScriptType>;
}

/// Maps primitive and collection types.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimitiveClassifier;

impl TypeClassifier for PrimitiveClassifier {
    fn classify(&self, ty: &NativeType) -> Option<ScriptType> {
        let tag = match ty {
            NativeType::Void => ArgType::Void,
            NativeType::Bool => ArgType::Boolean,
            NativeType::Int | NativeType::Float => ArgType::Number,
            NativeType::String => ArgType::String,
            NativeType::Array(_)
            | NativeType::List(_)
            | NativeType::Set(_)
            | NativeType::Map(_, _) => ArgType::Table,
            NativeType::MultiReturn => ArgType::Unknown,
            NativeType::Any => ArgType::Object,
            NativeType::Class(_) | NativeType::Var(_) => return None,
        };
        Some(ScriptType::Single(tag))
    }
}

/// Data-driven mapping from host classes to structured script types.
///
/// Subclasses inherit the mapping of their nearest mapped supertype.
#[derive(Debug, Default, Clone)]
pub struct StructuredClassifier {
    types: FxHashMap<TypeHash, ScriptType>,
}

impl StructuredClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `class` (and its subclasses) to `ty`.
    pub fn with(mut self, class: &ClassRef, ty: impl Into<ScriptType>) -> Self {
        self.types.insert(class.hash(), ty.into());
        self
    }
}

impl TypeClassifier for StructuredClassifier {
    fn classify(&self, ty: &NativeType) -> Option<ScriptType> {
        let NativeType::Class(class) = ty else {
            return None;
        };
        std::iter::once(class.hash())
            .chain(class.supertypes().iter().copied())
            .find_map(|hash| self.types.get(&hash).cloned())
    }
}

/// Ordered classifier chain with a result cache.
pub struct TypeClassification {
    classifiers: Vec<Arc<dyn TypeClassifier>>,
    cache: RwLock<FxHashMap<NativeType, Arc<ScriptType>>>,
}

impl Default for TypeClassification {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeClassification {
    /// Create a chain holding only the [`PrimitiveClassifier`].
    pub fn new() -> Self {
        Self {
            classifiers: vec![Arc::new(PrimitiveClassifier)],
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// Add a classifier. Classifiers added later are consulted after earlier
    /// ones but before the primitive rules.
    pub fn register(&mut self, classifier: impl TypeClassifier + 'static) {
        let at = self.classifiers.len() - 1;
        self.classifiers.insert(at, Arc::new(classifier));
        self.cache.get_mut().clear();
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, classifier: impl TypeClassifier + 'static) -> Self {
        self.register(classifier);
        self
    }

    /// Classify a concrete native type.
    pub fn classify(&self, ty: &NativeType) -> Arc<ScriptType> {
        if let Some(cached) = self.cache.read().get(ty) {
            return Arc::clone(cached);
        }

        let classified = Arc::new(
            self.classifiers
                .iter()
                .find_map(|c| c.classify(ty))
                .unwrap_or(ScriptType::OBJECT),
        );
        self.cache
            .write()
            .entry(ty.clone())
            .or_insert(classified)
            .clone()
    }

    /// Number of cached classifications.
    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }
}
