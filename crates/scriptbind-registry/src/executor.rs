//! Method executors: a validated declaration bound to a native function.
//!
//! An executor is built once per (adapter, method) when the adapter is
//! wrapped, is immutable afterwards, and is shared through `Arc` by every
//! method table that exposes it.

use std::sync::Arc;

use bitflags::bitflags;
use rustc_hash::FxHashSet;

use scriptbind_core::{
    CallError, MethodDeclaration, NativeType, NativeValue, ScriptValue,
};

use crate::env::HostEnv;
use crate::feature_group::FeatureGroups;
use crate::native_fn::{NativeArgs, NativeMethod};

bitflags! {
    /// Per-executor behavior flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodFlags: u8 {
        /// The host may suspend the caller and deliver the result later.
        const ASYNCHRONOUS = 1 << 0;
        /// The result is split into several script values.
        const MULTIPLE_RETURN = 1 << 1;
        /// Generated from a property.
        const PROPERTY = 1 << 2;
        /// Provided by the composed method table itself.
        const COMPOSED = 1 << 3;
    }
}

/// A callable entry of a method table.
#[derive(Debug)]
pub struct MethodExecutor {
    declaration: Arc<MethodDeclaration>,
    method: NativeMethod,
    flags: MethodFlags,
    feature_group: Option<String>,
    excluded_architectures: FxHashSet<String>,
}

impl MethodExecutor {
    /// Bind `declaration` to `method`.
    pub fn new(declaration: MethodDeclaration, method: NativeMethod, mut flags: MethodFlags) -> Self {
        flags.set(MethodFlags::MULTIPLE_RETURN, declaration.is_multiple_return());
        Self {
            declaration: Arc::new(declaration),
            method,
            flags,
            feature_group: None,
            excluded_architectures: FxHashSet::default(),
        }
    }

    /// Gate this executor behind a feature group.
    pub fn with_feature_group(mut self, group: Option<String>) -> Self {
        self.feature_group = group;
        self
    }

    /// Hide this executor on the given architectures.
    pub fn with_excluded_architectures(mut self, architectures: impl IntoIterator<Item = String>) -> Self {
        self.excluded_architectures.extend(architectures);
        self
    }

    pub fn declaration(&self) -> &MethodDeclaration {
        &self.declaration
    }

    pub fn name(&self) -> &str {
        self.declaration.name()
    }

    pub fn flags(&self) -> MethodFlags {
        self.flags
    }

    /// Whether the host should run this call asynchronously.
    pub fn is_asynchronous(&self) -> bool {
        self.flags.contains(MethodFlags::ASYNCHRONOUS)
    }

    pub fn feature_group(&self) -> Option<&str> {
        self.feature_group.as_deref()
    }

    pub fn excluded_architectures(&self) -> &FxHashSet<String> {
        &self.excluded_architectures
    }

    /// Whether this executor is exposed on `architecture`.
    pub fn is_visible_on(&self, architecture: &str, feature_groups: &FeatureGroups) -> bool {
        if self.excluded_architectures.contains(architecture) {
            return false;
        }
        match &self.feature_group {
            Some(group) => feature_groups.is_enabled(group, architecture),
            None => true,
        }
    }

    /// Run one script call.
    ///
    /// `target` fills positional slot 0; later positional slots and named
    /// environment values come from `env`. Script arguments are converted
    /// with the host's converter.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn execute(
        &self,
        env: &HostEnv,
        target: &NativeValue,
        args: &[ScriptValue],
    ) -> Result<Vec<ScriptValue>, CallError> {
        let decl = &*self.declaration;
        let mut values = Vec::with_capacity(decl.native_arity());

        for index in 0..decl.positional_types().len() {
            let value = match index {
                0 => Some(target),
                _ => env.positional(index - 1),
            };
            let value = value.ok_or_else(|| CallError::MissingEnvironment {
                method: decl.name().to_string(),
                name: format!("#{index}"),
            })?;
            values.push(value.clone());
        }

        for param in decl.env_params() {
            let value = env
                .named(&param.name)
                .ok_or_else(|| CallError::MissingEnvironment {
                    method: decl.name().to_string(),
                    name: param.name.clone(),
                })?;
            values.push(value.clone());
        }

        let converted = decl
            .convert_arguments(env.converter(), args)
            .map_err(|source| CallError::Argument {
                method: decl.name().to_string(),
                source,
            })?;
        values.extend(converted);

        let result = self
            .method
            .call(&NativeArgs::new(values))
            .map_err(|source| CallError::Invocation {
                method: decl.name().to_string(),
                source,
            })?;

        self.convert_result(env, result)
    }

    fn convert_result(&self, env: &HostEnv, result: NativeValue) -> Result<Vec<ScriptValue>, CallError> {
        let decl = &*self.declaration;
        let convert = |value: &NativeValue| {
            env.converter()
                .from_native(value)
                .map_err(|source| CallError::Result {
                    method: decl.name().to_string(),
                    source,
                })
        };

        if !decl.is_multiple_return() {
            if matches!(decl.returns(), NativeType::Void) {
                return Ok(Vec::new());
            }
            return Ok(vec![convert(&result)?]);
        }

        let expected = decl.return_types().len();
        let items: &[NativeValue] = match &result {
            NativeValue::Multi(items) | NativeValue::Array(items) | NativeValue::List(items) => {
                items.as_slice()
            }
            NativeValue::Null => &[],
            other => std::slice::from_ref(other),
        };
        if items.len() != expected {
            return Err(CallError::ReturnArity {
                method: decl.name().to_string(),
                expected,
                got: items.len(),
            });
        }
        items.iter().map(convert).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptbind_core::{
        ArgumentError, ClassRef, IntoNative, MethodSignature, NativeError, NativeObject, ParamSpec,
        ReturnType, StandardConverter, TypeBindings, TypeClassification,
    };

    use crate::env::{architectures, keys};

    struct Tank {
        level: i64,
    }

    fn tank_class() -> ClassRef {
        ClassRef::new("Tank")
    }

    fn executor(sig: MethodSignature, method: NativeMethod) -> MethodExecutor {
        let decl =
            MethodDeclaration::parse(&sig, &TypeBindings::new(), &TypeClassification::new(), "tank")
                .unwrap();
        MethodExecutor::new(decl, method, MethodFlags::empty())
    }

    fn env() -> HostEnv {
        HostEnv::new(architectures::COMPUTERCRAFT, Arc::new(StandardConverter::new()))
    }

    fn target() -> NativeValue {
        NativeValue::Object(NativeObject::new(tank_class(), Tank { level: 10 }))
    }

    fn add_level() -> MethodExecutor {
        executor(
            MethodSignature::new("addLevel")
                .param(ParamSpec::positional(NativeType::class(&tank_class())))
                .param(ParamSpec::arg("amount", NativeType::Int))
                .returns(NativeType::Int)
                .return_type(ReturnType::Number),
            NativeMethod::new(|args| {
                let tank: &Tank = args.target()?;
                let amount: i64 = args.arg(1)?;
                Ok((tank.level + amount).into_native())
            }),
        )
    }

    #[test]
    fn target_and_argument_reach_native_function() {
        let result = add_level().execute(&env(), &target(), &[ScriptValue::Number(5.0)]).unwrap();
        assert_eq!(result, vec![ScriptValue::Number(15.0)]);
    }

    #[test]
    fn missing_argument_names_the_argument() {
        let err = add_level().execute(&env(), &target(), &[]).unwrap_err();
        assert_eq!(
            err,
            CallError::Argument {
                method: "addLevel".into(),
                source: ArgumentError::NotEnoughArguments { name: "amount".into() },
            }
        );
        assert_eq!(err.to_string(), "addLevel: Not enough arguments, first missing: amount");
    }

    #[test]
    fn native_failure_carries_method_identity() {
        let exec = executor(
            MethodSignature::new("explode"),
            NativeMethod::new(|_| Err(NativeError::failed("boom"))),
        );
        let err = exec.execute(&env(), &NativeValue::Null, &[]).unwrap_err();
        assert_eq!(err.to_string(), "explode: boom");
        assert_eq!(err.method(), Some("explode"));
    }

    #[test]
    fn void_result_yields_no_values() {
        let exec = executor(MethodSignature::new("noop"), NativeMethod::new(|_| Ok(NativeValue::Null)));
        assert!(exec.execute(&env(), &NativeValue::Null, &[]).unwrap().is_empty());
    }

    #[test]
    fn named_environment_is_injected() {
        let exec = executor(
            MethodSignature::new("whereAmI")
                .param(ParamSpec::env(keys::ARCHITECTURE, NativeType::String))
                .returns(NativeType::String)
                .return_type(ReturnType::String),
            NativeMethod::new(|args| Ok(NativeValue::String(args.arg::<String>(0)?))),
        );
        let result = exec.execute(&env(), &NativeValue::Null, &[]).unwrap();
        assert_eq!(result, vec![ScriptValue::from("computercraft")]);
    }

    #[test]
    fn missing_named_environment() {
        let exec = executor(
            MethodSignature::new("ctx").param(ParamSpec::env(keys::CONTEXT, NativeType::Any)),
            NativeMethod::new(|_| Ok(NativeValue::Null)),
        );
        let err = exec.execute(&env(), &NativeValue::Null, &[]).unwrap_err();
        assert!(matches!(err, CallError::MissingEnvironment { name, .. } if name == "context"));
    }

    #[test]
    fn multi_return_splits_values() {
        let exec = executor(
            MethodSignature::new("range")
                .returns(NativeType::list(NativeType::Int))
                .return_types(&[ReturnType::Number, ReturnType::Number])
                .multiple_return(),
            NativeMethod::new(|_| Ok(vec![1i64, 2].into_native())),
        );
        assert!(exec.flags().contains(MethodFlags::MULTIPLE_RETURN));
        let result = exec.execute(&env(), &NativeValue::Null, &[]).unwrap();
        assert_eq!(result, vec![ScriptValue::Number(1.0), ScriptValue::Number(2.0)]);
    }

    #[test]
    fn multi_return_arity_is_checked() {
        let exec = executor(
            MethodSignature::new("pair")
                .returns(NativeType::MultiReturn)
                .return_types(&[ReturnType::Number, ReturnType::Number]),
            NativeMethod::new(|_| Ok(NativeValue::multi([NativeValue::Int(1)]))),
        );
        let err = exec.execute(&env(), &NativeValue::Null, &[]).unwrap_err();
        assert_eq!(
            err,
            CallError::ReturnArity {
                method: "pair".into(),
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn visibility_rules() {
        let groups = FeatureGroups::new();
        let exec = add_level()
            .with_feature_group(Some("fluids".into()))
            .with_excluded_architectures(["opencomputers".to_string()]);

        assert!(exec.is_visible_on(architectures::COMPUTERCRAFT, &groups));
        assert!(!exec.is_visible_on(architectures::OPENCOMPUTERS, &groups));

        groups.disable("fluids", architectures::COMPUTERCRAFT);
        assert!(!exec.is_visible_on(architectures::COMPUTERCRAFT, &groups));
    }
}
