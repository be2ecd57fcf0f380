//! Script-facing type descriptors.
//!
//! These are what documentation and `describe()` tables show to script
//! authors. They are produced by [`TypeClassification`](crate::TypeClassification)
//! or chosen explicitly on a declaration.

use std::fmt;

/// Script-facing type tag of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArgType {
    Table,
    Number,
    String,
    Boolean,
    Object,
    Void,
    Unknown,
    /// Derive the tag from the argument's native type.
    #[default]
    Auto,
}

impl ArgType {
    /// Lowercase name used in documentation.
    pub fn name(self) -> &'static str {
        match self {
            ArgType::Table => "table",
            ArgType::Number => "number",
            ArgType::String => "string",
            ArgType::Boolean => "boolean",
            ArgType::Object => "object",
            ArgType::Void => "void",
            ArgType::Unknown => "unknown",
            ArgType::Auto => "auto",
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared tag of one returned script value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnType {
    Table,
    Number,
    String,
    Boolean,
    Object,
    Void,
}

impl ReturnType {
    /// Lowercase name used in documentation.
    pub fn name(self) -> &'static str {
        match self {
            ReturnType::Table => "table",
            ReturnType::Number => "number",
            ReturnType::String => "string",
            ReturnType::Boolean => "boolean",
            ReturnType::Object => "object",
            ReturnType::Void => "void",
        }
    }
}

impl From<ArgType> for ReturnType {
    /// Tags without a return counterpart map to `object`.
    fn from(t: ArgType) -> Self {
        match t {
            ArgType::Table => ReturnType::Table,
            ArgType::Number => ReturnType::Number,
            ArgType::String => ReturnType::String,
            ArgType::Boolean => ReturnType::Boolean,
            ArgType::Void => ReturnType::Void,
            ArgType::Object | ArgType::Unknown | ArgType::Auto => ReturnType::Object,
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of classifying a native type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScriptType {
    /// A single primitive tag.
    Single(ArgType),
    /// A table with known named fields.
    NamedTuple(NamedTupleType),
}

impl ScriptType {
    /// Fallback classification for unrecognized types.
    pub const OBJECT: ScriptType = ScriptType::Single(ArgType::Object);

    /// The primitive tag scripts see for this type.
    pub fn arg_type(&self) -> ArgType {
        match self {
            ScriptType::Single(t) => *t,
            ScriptType::NamedTuple(_) => ArgType::Table,
        }
    }

    /// Documentation string, e.g. `number` or `{id:string,dmg:number?,...}`.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptType::Single(t) => t.fmt(f),
            ScriptType::NamedTuple(t) => t.fmt(f),
        }
    }
}

impl From<ArgType> for ScriptType {
    fn from(t: ArgType) -> Self {
        ScriptType::Single(t)
    }
}

/// An ordered set of named fields, some of which may be absent.
///
/// An open tuple tolerates extra fields after the known ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NamedTupleType {
    fields: Vec<NamedTupleField>,
    open: bool,
}

/// One field of a [`NamedTupleType`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedTupleField {
    pub name: String,
    pub ty: ScriptType,
    pub optional: bool,
}

impl NamedTupleType {
    /// Create a closed tuple with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a required field.
    pub fn field(mut self, name: impl Into<String>, ty: impl Into<ScriptType>) -> Self {
        self.fields.push(NamedTupleField {
            name: name.into(),
            ty: ty.into(),
            optional: false,
        });
        self
    }

    /// Append a field that may be absent.
    pub fn optional_field(mut self, name: impl Into<String>, ty: impl Into<ScriptType>) -> Self {
        self.fields.push(NamedTupleField {
            name: name.into(),
            ty: ty.into(),
            optional: true,
        });
        self
    }

    /// Allow extra trailing fields.
    pub fn open(mut self) -> Self {
        self.open = true;
        self
    }

    pub fn fields(&self) -> &[NamedTupleField] {
        &self.fields
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl fmt::Display for NamedTupleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", field.name, field.ty)?;
            if field.optional {
                f.write_str("?")?;
            }
        }
        if self.open {
            f.write_str(if self.fields.is_empty() { "..." } else { ",..." })?;
        }
        f.write_str("}")
    }
}

impl From<NamedTupleType> for ScriptType {
    fn from(t: NamedTupleType) -> Self {
        ScriptType::NamedTuple(t)
    }
}
