//! Method signatures and their validated declarations.
//!
//! A [`MethodSignature`] is what an adapter author registers: the method
//! name, its parameters with their roles, and its result. Parsing it into a
//! [`MethodDeclaration`] resolves generic type variables, classifies script
//! arguments and enforces the parameter layout:
//!
//! ```text
//! positional env... | named env... | required script... | optional script... | variadic
//! ```
//!
//! # Example
//!
//! ```
//! use scriptbind_core::{
//!     ClassRef, MethodDeclaration, MethodSignature, NativeType, ParamSpec, ReturnType,
//!     TypeBindings, TypeClassification,
//! };
//!
//! let tank = ClassRef::new("Tank");
//! let sig = MethodSignature::new("drain")
//!     .param(ParamSpec::positional(NativeType::class(&tank)))
//!     .param(ParamSpec::arg("amount", NativeType::Int))
//!     .param(ParamSpec::arg("simulate", NativeType::Bool).optional())
//!     .returns(NativeType::Int)
//!     .return_type(ReturnType::Number);
//!
//! let decl = MethodDeclaration::parse(&sig, &TypeBindings::new(), &TypeClassification::new(), "tank")
//!     .unwrap();
//! assert_eq!(decl.signature(), "(amount,simulate?)");
//! ```

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::argument::{Argument, ArgumentKind};
use crate::error::{ArgumentError, DefinitionError, EnvironmentError};
use crate::{
    ArgType, NativeType, NativeValue, ReturnType, ScriptTable, ScriptType, ScriptValue,
    TypeBindings, TypeClassification, TypeConverter,
};

/// Named environment types a host provides, keyed by environment name.
pub type EnvTypes = FxHashMap<String, NativeType>;

/// Where a native parameter's value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamRole {
    /// Supplied by the host by position (the call target comes first).
    Positional,
    /// Supplied by the host under a name such as `"context"`.
    Env(String),
    /// Supplied by the script caller.
    Script {
        name: String,
        description: String,
        arg_type: ArgType,
    },
}

/// One native parameter of a [`MethodSignature`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    native: NativeType,
    role: ParamRole,
    optional: bool,
    variadic: bool,
}

impl ParamSpec {
    /// A host-supplied positional parameter.
    pub fn positional(native: NativeType) -> Self {
        Self::with_role(native, ParamRole::Positional)
    }

    /// A host-supplied named parameter.
    pub fn env(name: impl Into<String>, native: NativeType) -> Self {
        Self::with_role(native, ParamRole::Env(name.into()))
    }

    /// A script argument whose tag is derived from `native`.
    pub fn arg(name: impl Into<String>, native: NativeType) -> Self {
        Self::with_role(
            native,
            ParamRole::Script {
                name: name.into(),
                description: String::new(),
                arg_type: ArgType::Auto,
            },
        )
    }

    fn with_role(native: NativeType, role: ParamRole) -> Self {
        Self {
            native,
            role,
            optional: false,
            variadic: false,
        }
    }

    /// Set the description of a script argument.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        if let ParamRole::Script { description, .. } = &mut self.role {
            *description = text.into();
        }
        self
    }

    /// Override the derived tag of a script argument.
    pub fn arg_type(mut self, tag: ArgType) -> Self {
        if let ParamRole::Script { arg_type, .. } = &mut self.role {
            *arg_type = tag;
        }
        self
    }

    /// Mark the parameter optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark the parameter as the variadic tail.
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn native(&self) -> &NativeType {
        &self.native
    }

    pub fn role(&self) -> &ParamRole {
        &self.role
    }
}

/// Registration-time description of one callable method.
#[derive(Debug, Clone)]
pub struct MethodSignature {
    name: String,
    description: String,
    params: Vec<ParamSpec>,
    returns: NativeType,
    return_types: Vec<ReturnType>,
    multiple_return: bool,
    aliases: Vec<String>,
}

impl MethodSignature {
    /// Start a signature returning nothing.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            params: Vec::new(),
            returns: NativeType::Void,
            return_types: Vec::new(),
            multiple_return: false,
            aliases: Vec::new(),
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Append a parameter.
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Native result type.
    pub fn returns(mut self, native: NativeType) -> Self {
        self.returns = native;
        self
    }

    /// Append a declared return tag.
    pub fn return_type(mut self, tag: ReturnType) -> Self {
        self.return_types.push(tag);
        self
    }

    /// Replace the declared return tags.
    pub fn return_types(mut self, tags: &[ReturnType]) -> Self {
        self.return_types = tags.to_vec();
        self
    }

    /// Split an array or list result into several script values.
    pub fn multiple_return(mut self) -> Self {
        self.multiple_return = true;
        self
    }

    /// Expose the method under an additional name.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.aliases.push(name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A named environment parameter of a declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvParam {
    pub name: String,
    pub native: NativeType,
    pub native_index: usize,
}

/// A validated method declaration.
#[derive(Debug, Clone)]
pub struct MethodDeclaration {
    name: String,
    description: String,
    source: String,
    aliases: Vec<String>,
    positional: Vec<NativeType>,
    env: Vec<EnvParam>,
    args: Vec<Argument>,
    returns: NativeType,
    return_types: Vec<ReturnType>,
    multiple_return: bool,
}

/// Layout state while walking the parameter list.
#[derive(Default)]
struct LayoutState {
    seen_env: bool,
    seen_script: bool,
    seen_optional: bool,
    variadic: Option<String>,
}

impl MethodDeclaration {
    /// Validate `signature` and build the declaration.
    ///
    /// `bindings` substitutes type variables of generic definitions;
    /// `source` tags which adapter contributed the method.
    pub fn parse(
        signature: &MethodSignature,
        bindings: &TypeBindings,
        classification: &TypeClassification,
        source: impl Into<String>,
    ) -> Result<Self, DefinitionError> {
        let method = &signature.name;
        let resolve = |ty: &NativeType| {
            ty.resolve(bindings)
                .map_err(|variable| DefinitionError::UnresolvedTypeVariable {
                    method: method.clone(),
                    variable: variable.to_string(),
                })
        };

        let mut state = LayoutState::default();
        let mut positional = Vec::new();
        let mut env: Vec<EnvParam> = Vec::new();
        let mut args = Vec::new();

        for (index, param) in signature.params.iter().enumerate() {
            if let Some(name) = &state.variadic {
                return Err(DefinitionError::VariadicNotLast {
                    method: method.clone(),
                    name: name.clone(),
                });
            }

            let native = resolve(&param.native)?;

            match &param.role {
                ParamRole::Positional => {
                    if state.seen_env || state.seen_script {
                        return Err(DefinitionError::PositionalAfterNamed {
                            method: method.clone(),
                            index,
                        });
                    }
                    check_not_script_only(method, index, param)?;
                    positional.push(native);
                }
                ParamRole::Env(name) => {
                    if state.seen_script {
                        return Err(DefinitionError::EnvAfterScript {
                            method: method.clone(),
                            name: name.clone(),
                        });
                    }
                    check_not_script_only(method, index, param)?;
                    if env.iter().any(|e| e.name == *name) {
                        return Err(DefinitionError::DuplicateEnv {
                            method: method.clone(),
                            name: name.clone(),
                        });
                    }
                    state.seen_env = true;
                    env.push(EnvParam {
                        name: name.clone(),
                        native,
                        native_index: index,
                    });
                }
                ParamRole::Script {
                    name,
                    description,
                    arg_type,
                } => {
                    state.seen_script = true;
                    let kind = if param.variadic {
                        if !matches!(native, NativeType::Array(_)) {
                            return Err(DefinitionError::VariadicNotArray {
                                method: method.clone(),
                                name: name.clone(),
                                native: native.to_string(),
                            });
                        }
                        state.variadic = Some(name.clone());
                        ArgumentKind::Variadic {
                            nullable: param.optional,
                        }
                    } else if param.optional {
                        state.seen_optional = true;
                        ArgumentKind::Optional
                    } else {
                        if state.seen_optional {
                            return Err(DefinitionError::RequiredAfterOptional {
                                method: method.clone(),
                                name: name.clone(),
                            });
                        }
                        ArgumentKind::Required
                    };

                    let script_type = match arg_type {
                        ArgType::Auto => {
                            let classified = match &kind {
                                ArgumentKind::Variadic { .. } => {
                                    native.element().unwrap_or(&native)
                                }
                                _ => &native,
                            };
                            classification.classify(classified)
                        }
                        explicit => ScriptType::Single(*explicit).into(),
                    };

                    args.push(Argument::new(
                        name.clone(),
                        description.clone(),
                        script_type,
                        native,
                        index,
                        kind,
                    ));
                }
            }
        }

        let returns = resolve(&signature.returns)?;
        let multiple_return = check_returns(signature, &returns)?;

        let mut aliases: Vec<String> = Vec::new();
        for alias in &signature.aliases {
            if *alias != signature.name && !aliases.contains(alias) {
                aliases.push(alias.clone());
            }
        }

        Ok(Self {
            name: signature.name.clone(),
            description: signature.description.clone(),
            source: source.into(),
            aliases,
            positional,
            env,
            args,
            returns,
            return_types: signature.return_types.clone(),
            multiple_return,
        })
    }

    /// Canonical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Tag of the adapter that contributed this method.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Additional exposed names, without the canonical name.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Every exposed name: canonical first, then aliases. No duplicates.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Types of the host-supplied positional parameters, in order.
    pub fn positional_types(&self) -> &[NativeType] {
        &self.positional
    }

    pub fn env_params(&self) -> &[EnvParam] {
        &self.env
    }

    /// Script-visible arguments, in order.
    pub fn arguments(&self) -> &[Argument] {
        &self.args
    }

    /// Resolved native result type.
    pub fn returns(&self) -> &NativeType {
        &self.returns
    }

    pub fn return_types(&self) -> &[ReturnType] {
        &self.return_types
    }

    /// Whether the result is split into several script values.
    pub fn is_multiple_return(&self) -> bool {
        self.multiple_return
    }

    /// Total number of native parameters.
    pub fn native_arity(&self) -> usize {
        self.positional.len() + self.env.len() + self.args.len()
    }

    /// Script-facing signature, e.g. `(a,b?,var...)`.
    pub fn signature(&self) -> String {
        let args: Vec<String> = self.args.iter().map(Argument::doc).collect();
        format!("({})", args.join(","))
    }

    /// Description table for reflection and help commands.
    pub fn describe(&self) -> ScriptTable {
        let returns = ScriptTable::from_sequence(
            self.return_types
                .iter()
                .map(|t| ScriptValue::from(t.name())),
        );
        let args = ScriptTable::from_sequence(
            self.args
                .iter()
                .map(|a| ScriptValue::Table(a.describe())),
        );
        ScriptTable::new()
            .with("name", self.name.as_str())
            .with("description", self.description.as_str())
            .with("source", self.source.as_str())
            .with("returnTypes", returns)
            .with("args", args)
            .with("signature", self.signature())
    }

    /// Check the positional environment against the types a host supplies.
    ///
    /// Arity must match exactly; each declared type must accept the
    /// corresponding supplied type.
    pub fn validate_unnamed_env_args(&self, provided: &[NativeType]) -> Result<(), EnvironmentError> {
        if provided.len() != self.positional.len() {
            return Err(EnvironmentError::PositionalArity {
                method: self.name.clone(),
                expected: self.positional.len(),
                got: provided.len(),
            });
        }
        for (index, (expected, got)) in self.positional.iter().zip(provided).enumerate() {
            if !expected.is_assignable_from(got) {
                return Err(EnvironmentError::PositionalType {
                    method: self.name.clone(),
                    index,
                    expected: expected.to_string(),
                    got: got.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Check that every named environment parameter is provided with an
    /// assignable type. Extra provided names are ignored.
    pub fn validate_env_args(&self, provided: &EnvTypes) -> Result<(), EnvironmentError> {
        for param in &self.env {
            let got = provided
                .get(&param.name)
                .ok_or_else(|| EnvironmentError::MissingEnv {
                    method: self.name.clone(),
                    name: param.name.clone(),
                })?;
            if !param.native.is_assignable_from(got) {
                return Err(EnvironmentError::EnvType {
                    method: self.name.clone(),
                    name: param.name.clone(),
                    expected: param.native.to_string(),
                    got: got.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Convert script arguments into native values, one per script argument.
    pub fn convert_arguments(
        &self,
        converter: &dyn TypeConverter,
        values: &[ScriptValue],
    ) -> Result<Vec<NativeValue>, ArgumentError> {
        let mut iter = values.iter();
        let converted = self
            .args
            .iter()
            .map(|arg| arg.convert(converter, &mut iter))
            .collect::<Result<Vec<_>, _>>()?;

        if iter.next().is_some() {
            return Err(ArgumentError::TooManyArguments {
                expected: self.args.len(),
                got: values.len(),
            });
        }
        Ok(converted)
    }

    /// Exposed names as a sorted set, for order-independent comparison.
    pub fn name_set(&self) -> BTreeSet<&str> {
        self.names().collect()
    }
}

fn check_not_script_only(
    method: &str,
    index: usize,
    param: &ParamSpec,
) -> Result<(), DefinitionError> {
    if param.optional {
        return Err(DefinitionError::OptionalNotScript {
            method: method.to_string(),
            index,
        });
    }
    if param.variadic {
        return Err(DefinitionError::VariadicNotScript {
            method: method.to_string(),
            index,
        });
    }
    Ok(())
}

/// Validate return tags against the result type; returns whether the
/// result is multi-valued.
fn check_returns(signature: &MethodSignature, returns: &NativeType) -> Result<bool, DefinitionError> {
    let method = &signature.name;
    let count = signature.return_types.len();

    let multiple = if matches!(returns, NativeType::MultiReturn) {
        true
    } else if signature.multiple_return {
        if !returns.is_ordered_collection() {
            return Err(DefinitionError::MultipleReturnNotSupported {
                method: method.clone(),
                native: returns.to_string(),
            });
        }
        true
    } else {
        false
    };

    if multiple && count == 0 {
        return Err(DefinitionError::MissingReturnTypes {
            method: method.clone(),
        });
    }
    if !multiple && count > 1 {
        return Err(DefinitionError::TooManyReturnTypes {
            method: method.clone(),
            native: returns.to_string(),
            count,
        });
    }
    Ok(multiple)
}
