//! Script-visible argument descriptors.
//!
//! An [`Argument`] knows where its value sits in the native parameter list
//! and how to pull and convert it from the script argument stream. All
//! arguments of a call share one iterator, so optional and variadic tails
//! consume exactly what is left.

use std::sync::Arc;

use crate::error::ArgumentError;
use crate::{ArgType, NativeType, NativeValue, ScriptTable, ScriptType, ScriptValue, TypeConverter};

/// How an argument consumes script values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    /// Exactly one non-nil value.
    Required,
    /// One value; absent or nil becomes [`NativeValue::Null`].
    Optional,
    /// All remaining values, collected into an array.
    Variadic {
        /// Whether individual elements may be nil.
        nullable: bool,
    },
}

/// One script-visible parameter of a method declaration.
#[derive(Debug, Clone)]
pub struct Argument {
    name: String,
    description: String,
    arg_type: ArgType,
    script_type: Arc<ScriptType>,
    native_type: NativeType,
    native_index: usize,
    kind: ArgumentKind,
}

impl Argument {
    /// Create an argument descriptor.
    ///
    /// For variadic arguments `native_type` is the array type and
    /// `script_type` describes one element.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        script_type: Arc<ScriptType>,
        native_type: NativeType,
        native_index: usize,
        kind: ArgumentKind,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            arg_type: script_type.arg_type(),
            script_type,
            native_type,
            native_index,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Script-facing tag.
    pub fn arg_type(&self) -> ArgType {
        self.arg_type
    }

    pub fn script_type(&self) -> &ScriptType {
        &self.script_type
    }

    pub fn native_type(&self) -> &NativeType {
        &self.native_type
    }

    /// Position in the native parameter list.
    pub fn native_index(&self) -> usize {
        self.native_index
    }

    pub fn kind(&self) -> ArgumentKind {
        self.kind
    }

    pub fn is_optional(&self) -> bool {
        matches!(
            self.kind,
            ArgumentKind::Optional | ArgumentKind::Variadic { nullable: true }
        )
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self.kind, ArgumentKind::Variadic { .. })
    }

    /// Pull this argument's value(s) from `args` and convert them.
    pub fn convert<'a>(
        &self,
        converter: &dyn TypeConverter,
        args: &mut dyn Iterator<Item = &'a ScriptValue>,
    ) -> Result<NativeValue, ArgumentError> {
        match self.kind {
            ArgumentKind::Required => {
                let value = args.next().ok_or_else(|| ArgumentError::NotEnoughArguments {
                    name: self.name.clone(),
                })?;
                if value.is_nil() {
                    return Err(ArgumentError::NullArgument {
                        name: self.name.clone(),
                    });
                }
                self.convert_single(converter, value, &self.native_type)
            }
            ArgumentKind::Optional => match args.next() {
                None | Some(ScriptValue::Nil) => Ok(NativeValue::Null),
                Some(value) => self.convert_single(converter, value, &self.native_type),
            },
            ArgumentKind::Variadic { nullable } => {
                let element = self.native_type.element().unwrap_or(&NativeType::Any);
                let items = args
                    .map(|value| match value {
                        ScriptValue::Nil if nullable => Ok(NativeValue::Null),
                        ScriptValue::Nil => Err(ArgumentError::NullArgument {
                            name: self.name.clone(),
                        }),
                        value => self.convert_single(converter, value, element),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(NativeValue::Array(items))
            }
        }
    }

    fn convert_single(
        &self,
        converter: &dyn TypeConverter,
        value: &ScriptValue,
        target: &NativeType,
    ) -> Result<NativeValue, ArgumentError> {
        converter
            .to_native(value, target)
            .ok_or_else(|| ArgumentError::ConversionFailed {
                name: self.name.clone(),
                value: value.to_string(),
                target: target.to_string(),
            })
    }

    /// Signature fragment: `name`, `name?` or `name...`.
    pub fn doc(&self) -> String {
        match self.kind {
            ArgumentKind::Required => self.name.clone(),
            ArgumentKind::Optional => format!("{}?", self.name),
            ArgumentKind::Variadic { .. } => format!("{}...", self.name),
        }
    }

    /// Description table for reflection commands.
    pub fn describe(&self) -> ScriptTable {
        ScriptTable::new()
            .with("name", self.name.as_str())
            .with("type", self.script_type.describe())
            .with("description", self.description.as_str())
            .with("optional", self.is_optional())
            .with("variadic", self.is_variadic())
    }
}
