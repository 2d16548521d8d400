//! Kinds of document values and of the values a target type requests.

use std::fmt;

use serde_json::Value;

/// Shape of a document value.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueKind {
    /// `null`.
    Null,
    /// `true` or `false`.
    Boolean,
    /// A number without a fractional part.
    Integer,
    /// Any other number.
    Float,
    /// A string.
    String,
    /// A sequence.
    Sequence,
    /// A mapping.
    Mapping,
}

impl ValueKind {
    /// Classify `value`.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(number) => {
                if number.is_f64() {
                    Self::Float
                } else {
                    Self::Integer
                }
            }
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Sequence,
            Value::Object(_) => Self::Mapping,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of value a field's type asks the decoder for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TargetKind {
    /// `bool`.
    Boolean,
    /// Signed or unsigned integers.
    Integer,
    /// `f32` and `f64`.
    Float,
    /// `String`, `&str` and `char`.
    String,
    /// Sequences, sets, tuples and tuple structs.
    Sequence,
    /// Maps and structs.
    Mapping,
}

impl TargetKind {
    /// Whether a value of `kind` decodes into this target without help.
    #[must_use]
    pub const fn accepts(self, kind: ValueKind) -> bool {
        matches!(
            (self, kind),
            (Self::Boolean, ValueKind::Boolean)
                | (Self::Integer, ValueKind::Integer)
                | (Self::Float, ValueKind::Float | ValueKind::Integer)
                | (Self::String, ValueKind::String)
                | (Self::Sequence, ValueKind::Sequence)
                | (Self::Mapping, ValueKind::Mapping)
        )
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
        })
    }
}
