//! Properties exposed as generated getter/setter methods.
//!
//! A field property `level` becomes `getLevel(target)` and, when writable,
//! `setLevel(target, value)`. An indexed property additionally takes an
//! `index` argument converted to the key type, so an unconvertible index is
//! reported as a conversion failure of `index`.

use scriptbind_core::{
    ClassRef, MethodSignature, NativeError, NativeType, NativeValue, ParamSpec, ReturnType,
    TypeBindings,
};

use crate::adapter::MethodSpec;
use crate::context::AdapterContext;
use crate::executor::MethodFlags;
use crate::native_fn::{NativeArgs, NativeMethod};

/// A property of the adapted target.
///
/// Getter arguments are `[target]` or `[target, index]`; setter arguments
/// append the new value.
#[derive(Debug, Clone)]
pub struct PropertySpec {
    name: String,
    description: String,
    value_type: NativeType,
    index_type: Option<NativeType>,
    getter: NativeMethod,
    setter: Option<NativeMethod>,
    feature_group: Option<String>,
}

impl PropertySpec {
    /// A plain property, read-only until a setter is added.
    pub fn field<F>(name: impl Into<String>, value_type: NativeType, getter: F) -> Self
    where
        F: Fn(&NativeArgs) -> Result<NativeValue, NativeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            value_type,
            index_type: None,
            getter: NativeMethod::new(getter),
            setter: None,
            feature_group: None,
        }
    }

    /// A property addressed by an index of `index_type`.
    pub fn indexed<F>(
        name: impl Into<String>,
        index_type: NativeType,
        value_type: NativeType,
        getter: F,
    ) -> Self
    where
        F: Fn(&NativeArgs) -> Result<NativeValue, NativeError> + Send + Sync + 'static,
    {
        Self {
            index_type: Some(index_type),
            ..Self::field(name, value_type, getter)
        }
    }

    /// Make the property writable.
    pub fn setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(&NativeArgs) -> Result<NativeValue, NativeError> + Send + Sync + 'static,
    {
        self.setter = Some(NativeMethod::new(setter));
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn feature_group(mut self, group: impl Into<String>) -> Self {
        self.feature_group = Some(group.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn getter_name(&self) -> String {
        format!("get{}", capitalize(&self.name))
    }

    pub fn setter_name(&self) -> String {
        format!("set{}", capitalize(&self.name))
    }

    fn signature(&self, name: String, target: &ClassRef) -> MethodSignature {
        let mut sig = MethodSignature::new(name).param(ParamSpec::positional(NativeType::class(target)));
        if let Some(index_type) = &self.index_type {
            sig = sig.param(ParamSpec::arg("index", index_type.clone()).description("Property index"));
        }
        sig
    }

    /// Generated getter and setter methods.
    pub(crate) fn method_specs(
        &self,
        target: &ClassRef,
        bindings: &TypeBindings,
        ctx: &AdapterContext,
    ) -> Vec<MethodSpec> {
        // Unbound variables surface as a definition error when the getter is parsed.
        let return_type = self
            .value_type
            .resolve(bindings)
            .map(|ty| ReturnType::from(ctx.classification().classify(&ty).arg_type()))
            .unwrap_or(ReturnType::Object);

        let describe = |verb: &str| match self.description.as_str() {
            "" => format!("{verb} the value of property {}", self.name),
            text => text.to_string(),
        };

        let getter = self
            .signature(self.getter_name(), target)
            .description(describe("Get"))
            .returns(self.value_type.clone())
            .return_type(return_type);
        let mut specs = vec![MethodSpec::from_method(getter, self.getter.clone())];

        if let Some(setter) = &self.setter {
            let sig = self
                .signature(self.setter_name(), target)
                .description(describe("Set"))
                .param(ParamSpec::arg("value", self.value_type.clone()).description("New value"));
            specs.push(MethodSpec::from_method(sig, setter.clone()));
        }

        specs
            .into_iter()
            .map(|spec| {
                let spec = spec.with_flags(MethodFlags::PROPERTY);
                match &self.feature_group {
                    Some(group) => spec.feature_group(group.clone()),
                    None => spec,
                }
            })
            .collect()
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
