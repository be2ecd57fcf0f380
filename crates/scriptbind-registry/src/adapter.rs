//! Adapter definitions and their wrapped executors.
//!
//! An [`AdapterDefinition`] is the registration-time description of one
//! adapter: what it targets, which kind of host environment its methods
//! expect, and how to enumerate its methods. [`AdapterWrapper::build`]
//! turns it into immutable [`MethodExecutor`]s.
//!
//! # Failure policy
//!
//! - A single method failing to parse or verify aborts the whole adapter
//!   with [`RegistrationError::MethodWrap`]. Partial adapters are never
//!   installed.
//! - Enumeration itself failing is logged and yields an adapter with zero
//!   methods.

use std::fmt;
use std::sync::Arc;

use scriptbind_core::{
    ClassRef, EnumerationError, EnvTypes, EnvironmentError, MethodDeclaration, MethodSignature,
    NativeError, NativeType, NativeValue, RegistrationError, TypeBindings, WrapCause,
    converter_class,
};

use crate::context::AdapterContext;
use crate::env::keys;
use crate::executor::{MethodExecutor, MethodFlags};
use crate::native_fn::{NativeArgs, NativeMethod};
use crate::property::PropertySpec;

// ============================================================================
// Adapter kinds
// ============================================================================

/// The closed set of adapter styles, each with its own environment contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// Methods of a peripheral: called on a target with the full host environment.
    Peripheral,
    /// Generated or hand-written property accessors on a target.
    Property,
    /// Methods of the composed table itself; no target.
    Composed,
}

impl AdapterKind {
    pub const ALL: [AdapterKind; 3] = [AdapterKind::Peripheral, AdapterKind::Property, AdapterKind::Composed];

    pub(crate) fn index(self) -> usize {
        match self {
            AdapterKind::Peripheral => 0,
            AdapterKind::Property => 1,
            AdapterKind::Composed => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AdapterKind::Peripheral => "peripheral",
            AdapterKind::Property => "property",
            AdapterKind::Composed => "composed",
        }
    }

    /// Named environment available to this kind unless the context overrides it.
    pub fn default_env_types(self) -> EnvTypes {
        let mut env = EnvTypes::default();
        env.insert(keys::CONVERTER.to_string(), NativeType::class(&converter_class()));
        match self {
            AdapterKind::Peripheral => {
                env.insert(keys::CONTEXT.to_string(), NativeType::Any);
                env.insert(keys::ACCESS.to_string(), NativeType::Any);
                env.insert(keys::COMPUTER.to_string(), NativeType::Any);
                env.insert(keys::ARCHITECTURE.to_string(), NativeType::String);
            }
            AdapterKind::Property => {}
            AdapterKind::Composed => {
                env.insert(keys::CONTEXT.to_string(), NativeType::Any);
            }
        }
        env
    }

    /// Check a parsed declaration against this kind's environment.
    pub fn verify(
        self,
        decl: &MethodDeclaration,
        target: &ClassRef,
        ctx: &AdapterContext,
    ) -> Result<(), EnvironmentError> {
        match self {
            AdapterKind::Peripheral | AdapterKind::Property => {
                decl.validate_unnamed_env_args(&[NativeType::class(target)])?
            }
            AdapterKind::Composed => decl.validate_unnamed_env_args(&[])?,
        }
        decl.validate_env_args(ctx.env_types(self))
    }

    fn base_flags(self) -> MethodFlags {
        match self {
            AdapterKind::Composed => MethodFlags::COMPOSED,
            _ => MethodFlags::empty(),
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Method specs
// ============================================================================

/// One method as registered: signature, native function and gating.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    signature: MethodSignature,
    method: NativeMethod,
    asynchronous: Option<bool>,
    feature_group: Option<String>,
    excluded_architectures: Vec<String>,
    flags: MethodFlags,
}

impl MethodSpec {
    pub fn new<F>(signature: MethodSignature, f: F) -> Self
    where
        F: Fn(&NativeArgs) -> Result<NativeValue, NativeError> + Send + Sync + 'static,
    {
        Self::from_method(signature, NativeMethod::new(f))
    }

    pub fn from_method(signature: MethodSignature, method: NativeMethod) -> Self {
        Self {
            signature,
            method,
            asynchronous: None,
            feature_group: None,
            excluded_architectures: Vec::new(),
            flags: MethodFlags::empty(),
        }
    }

    /// Override the adapter's asynchronous default for this method.
    pub fn asynchronous(mut self, asynchronous: bool) -> Self {
        self.asynchronous = Some(asynchronous);
        self
    }

    /// Override the adapter's feature group for this method.
    pub fn feature_group(mut self, group: impl Into<String>) -> Self {
        self.feature_group = Some(group.into());
        self
    }

    /// Hide this method on `architecture`, in addition to the adapter's exclusions.
    pub fn exclude_architecture(mut self, architecture: impl Into<String>) -> Self {
        self.excluded_architectures.push(architecture.into());
        self
    }

    pub(crate) fn with_flags(mut self, flags: MethodFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }
}

type MethodProvider = Arc<dyn Fn() -> Result<Vec<MethodSpec>, EnumerationError> + Send + Sync>;

// ============================================================================
// Adapter definitions
// ============================================================================

/// Registration-time description of one adapter.
///
/// ```
/// use scriptbind_core::{ClassRef, MethodSignature, NativeType, NativeValue, ParamSpec};
/// use scriptbind_registry::{AdapterDefinition, AdapterKind, MethodSpec};
///
/// let tank = ClassRef::new("Tank");
/// let def = AdapterDefinition::new("TankAdapter", &tank, AdapterKind::Peripheral)
///     .source("tank")
///     .method(MethodSpec::new(
///         MethodSignature::new("reset").param(ParamSpec::positional(NativeType::class(&tank))),
///         |_| Ok(NativeValue::Null),
///     ));
/// assert_eq!(def.name(), "TankAdapter");
/// ```
#[derive(Clone)]
pub struct AdapterDefinition {
    name: String,
    target: ClassRef,
    kind: AdapterKind,
    source: Option<String>,
    bindings: TypeBindings,
    asynchronous: bool,
    feature_group: Option<String>,
    excluded_architectures: Vec<String>,
    methods: Vec<MethodSpec>,
    provider: Option<MethodProvider>,
    properties: Vec<PropertySpec>,
}

impl AdapterDefinition {
    pub fn new(name: impl Into<String>, target: &ClassRef, kind: AdapterKind) -> Self {
        Self {
            name: name.into(),
            target: target.clone(),
            kind,
            source: None,
            bindings: TypeBindings::new(),
            asynchronous: false,
            feature_group: None,
            excluded_architectures: Vec::new(),
            methods: Vec::new(),
            provider: None,
            properties: Vec::new(),
        }
    }

    /// Source tag reported by `listSources`; defaults to the adapter name.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Type variable bindings for a generic method set.
    pub fn bindings(mut self, bindings: TypeBindings) -> Self {
        self.bindings = bindings;
        self
    }

    /// Make methods asynchronous unless they say otherwise.
    pub fn asynchronous(mut self) -> Self {
        self.asynchronous = true;
        self
    }

    /// Gate every method behind `group` unless it names its own.
    pub fn feature_group(mut self, group: impl Into<String>) -> Self {
        self.feature_group = Some(group.into());
        self
    }

    /// Hide every method on `architecture`.
    pub fn exclude_architecture(mut self, architecture: impl Into<String>) -> Self {
        self.excluded_architectures.push(architecture.into());
        self
    }

    /// Add a statically known method.
    pub fn method(mut self, spec: MethodSpec) -> Self {
        self.methods.push(spec);
        self
    }

    /// Enumerate further methods lazily when the adapter is built.
    pub fn methods_from<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> Result<Vec<MethodSpec>, EnumerationError> + Send + Sync + 'static,
    {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Add a property; it generates getter and setter methods.
    pub fn property(mut self, property: PropertySpec) -> Self {
        self.properties.push(property);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &ClassRef {
        &self.target
    }

    pub fn kind(&self) -> AdapterKind {
        self.kind
    }

    pub fn source_tag(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.name)
    }

    /// Every method spec of this adapter, generated properties included.
    pub fn enumerate(&self, ctx: &AdapterContext) -> Result<Vec<MethodSpec>, EnumerationError> {
        let mut specs = self.methods.clone();
        if let Some(provider) = &self.provider {
            specs.extend(provider()?);
        }
        for property in &self.properties {
            specs.extend(property.method_specs(&self.target, &self.bindings, ctx));
        }
        Ok(specs)
    }
}

impl fmt::Debug for AdapterDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterDefinition")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("kind", &self.kind)
            .field("methods", &self.methods.len())
            .field("properties", &self.properties.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Wrappers
// ============================================================================

/// The validated executors of one adapter bound to its target type.
#[derive(Debug)]
pub struct AdapterWrapper {
    name: String,
    source: String,
    target: ClassRef,
    kind: AdapterKind,
    executors: Vec<Arc<MethodExecutor>>,
}

impl AdapterWrapper {
    /// Wrap every method of `definition`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(definition: &AdapterDefinition, ctx: &AdapterContext) -> Result<Self, RegistrationError> {
        let source = definition.source_tag().to_string();

        let specs = match definition.enumerate(ctx) {
            Ok(specs) => specs,
            Err(e) => {
                log::error!(
                    "can't get methods of adapter '{}' for '{}', bailing out: {}",
                    definition.name,
                    definition.target.name(),
                    e
                );
                Vec::new()
            }
        };

        let mut executors = Vec::with_capacity(specs.len());
        for spec in specs {
            let wrap_error = |cause: WrapCause| RegistrationError::MethodWrap {
                adapter: definition.name.clone(),
                method: spec.signature.name().to_string(),
                cause,
            };

            let decl = MethodDeclaration::parse(
                &spec.signature,
                &definition.bindings,
                ctx.classification(),
                source.as_str(),
            )
            .map_err(|e| wrap_error(e.into()))?;
            definition
                .kind
                .verify(&decl, &definition.target, ctx)
                .map_err(|e| wrap_error(e.into()))?;

            let mut flags = definition.kind.base_flags() | spec.flags;
            if spec.asynchronous.unwrap_or(definition.asynchronous) {
                flags |= MethodFlags::ASYNCHRONOUS;
            }

            let feature_group = spec
                .feature_group
                .clone()
                .or_else(|| definition.feature_group.clone());
            if let Some(group) = &feature_group {
                ctx.feature_groups().ensure_exists(group);
            }

            let executor = MethodExecutor::new(decl, spec.method.clone(), flags)
                .with_feature_group(feature_group)
                .with_excluded_architectures(
                    definition
                        .excluded_architectures
                        .iter()
                        .chain(&spec.excluded_architectures)
                        .cloned(),
                );
            log::trace!("wrapped '{}' of adapter '{}'", executor.name(), definition.name);
            executors.push(Arc::new(executor));
        }

        log::debug!(
            "built {} adapter '{}' for '{}' with {} method(s)",
            definition.kind,
            definition.name,
            definition.target.name(),
            executors.len()
        );

        Ok(Self {
            name: definition.name.clone(),
            source,
            target: definition.target.clone(),
            kind: definition.kind,
            executors,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &ClassRef {
        &self.target
    }

    pub fn kind(&self) -> AdapterKind {
        self.kind
    }

    pub fn executors(&self) -> &[Arc<MethodExecutor>] {
        &self.executors
    }

    /// Whether this adapter applies to instances of `class`.
    pub fn can_use(&self, class: &ClassRef) -> bool {
        class.is_subclass_of(&self.target)
    }

    /// Short human-readable summary.
    pub fn describe(&self) -> String {
        format!(
            "{} adapter '{}' (source: {}) for {}",
            self.kind,
            self.name,
            self.source,
            self.target.name()
        )
    }

    /// Re-run environment validation of every method against `ctx`.
    pub fn revalidate(&self, ctx: &AdapterContext) -> Result<(), RegistrationError> {
        for executor in &self.executors {
            self.kind
                .verify(executor.declaration(), &self.target, ctx)
                .map_err(|e| RegistrationError::MethodWrap {
                    adapter: self.name.clone(),
                    method: executor.name().to_string(),
                    cause: e.into(),
                })?;
        }
        Ok(())
    }
}
