//! Typed conversions applied when a document value does not match the kind
//! a field requests.

use serde_json::{Number, Value};

use super::error::HookError;
use super::kind::{TargetKind, ValueKind};
use super::path::KeyPath;

/// Converts values of one kind into another before decoding.
///
/// A hook is consulted only for values of its [`source`](Self::source) kind
/// destined for fields requesting its [`target`](Self::target) kind, and only
/// when the two differ. Hooks run in registration order; the first to return
/// `Ok(Some(_))` wins.
pub trait DecodeHook: Send + Sync {
    /// Kind of document value the hook converts.
    fn source(&self) -> ValueKind;

    /// Kind of field the hook produces values for.
    fn target(&self) -> TargetKind;

    /// Convert `value`, found at `path`.
    ///
    /// Return `Ok(None)` to decline and let later hooks or default decoding
    /// proceed.
    ///
    /// # Errors
    ///
    /// An error aborts decoding and is reported with `path`.
    fn convert(&self, path: &KeyPath, value: &Value) -> Result<Option<Value>, HookError>;
}

/// Splits a string into a sequence of trimmed, non-empty items.
///
/// Use it to decode `"a, b,c"` into `Vec<String>`, `BTreeSet<String>` or
/// `HashSet<String>` fields.
///
/// ```
/// use layered_config::{DecodeHook, KeyPath, StringToSequenceHook};
/// use serde_json::json;
///
/// let hook = StringToSequenceHook::new(",");
/// let converted = hook.convert(&KeyPath::root(), &json!("v1, v2,v3,,,"));
/// assert_eq!(converted.ok().flatten(), Some(json!(["v1", "v2", "v3"])));
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StringToSequenceHook {
    separator: String,
}

impl StringToSequenceHook {
    /// Split on `separator`.
    #[must_use]
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl DecodeHook for StringToSequenceHook {
    fn source(&self) -> ValueKind {
        ValueKind::String
    }

    fn target(&self) -> TargetKind {
        TargetKind::Sequence
    }

    fn convert(&self, _path: &KeyPath, value: &Value) -> Result<Option<Value>, HookError> {
        let Value::String(raw) = value else {
            return Ok(None);
        };
        if self.separator.is_empty() {
            return Ok(Some(Value::Array(vec![Value::String(raw.trim().to_owned())])));
        }
        let items = raw
            .split(self.separator.as_str())
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Value::String(item.to_owned()))
            .collect();
        Ok(Some(Value::Array(items)))
    }
}

/// Parses strings into booleans or numbers.
///
/// Useful when values come from `env` lookups, which always render as text
/// in formats that do not infer scalar types.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StringToScalarHook {
    target: TargetKind,
}

impl StringToScalarHook {
    /// Parse strings destined for integer fields.
    #[must_use]
    pub const fn integer() -> Self {
        Self {
            target: TargetKind::Integer,
        }
    }

    /// Parse strings destined for floating-point fields.
    #[must_use]
    pub const fn float() -> Self {
        Self {
            target: TargetKind::Float,
        }
    }

    /// Parse `true`/`false` strings destined for boolean fields.
    #[must_use]
    pub const fn boolean() -> Self {
        Self {
            target: TargetKind::Boolean,
        }
    }
}

impl DecodeHook for StringToScalarHook {
    fn source(&self) -> ValueKind {
        ValueKind::String
    }

    fn target(&self) -> TargetKind {
        self.target
    }

    fn convert(&self, _path: &KeyPath, value: &Value) -> Result<Option<Value>, HookError> {
        let Value::String(raw) = value else {
            return Ok(None);
        };
        let text = raw.trim();
        let converted = match self.target {
            TargetKind::Boolean => Value::Bool(text.parse::<bool>()?),
            TargetKind::Integer => match text.parse::<i64>() {
                Ok(signed) => Value::from(signed),
                Err(_) => Value::from(text.parse::<u64>()?),
            },
            TargetKind::Float => {
                let number = Number::from_f64(text.parse::<f64>()?)
                    .ok_or_else(|| format!("'{text}' is not a finite number"))?;
                Value::Number(number)
            }
            TargetKind::String | TargetKind::Sequence | TargetKind::Mapping => return Ok(None),
        };
        Ok(Some(converted))
    }
}

struct FnHook<F> {
    source: ValueKind,
    target: TargetKind,
    convert: F,
}

impl<F> DecodeHook for FnHook<F>
where
    F: Fn(&KeyPath, &Value) -> Result<Option<Value>, HookError> + Send + Sync,
{
    fn source(&self) -> ValueKind {
        self.source
    }

    fn target(&self) -> TargetKind {
        self.target
    }

    fn convert(&self, path: &KeyPath, value: &Value) -> Result<Option<Value>, HookError> {
        (self.convert)(path, value)
    }
}

/// Build a hook from a closure.
///
/// ```
/// use layered_config::{Decoder, Mapping, TargetKind, ValueKind, hook_fn};
/// use serde_json::{Value, json};
///
/// let seconds = hook_fn(ValueKind::String, TargetKind::Integer, |_, value| {
///     let text = value.as_str().unwrap_or_default();
///     Ok(text.strip_suffix('s').and_then(|n| n.parse::<u64>().ok()).map(Value::from))
/// });
/// let document: Mapping = serde_json::from_value(json!({"timeout": "30s"}))?;
///
/// #[derive(serde::Deserialize)]
/// struct Settings {
///     timeout: u64,
/// }
///
/// let settings: Settings = Decoder::new().with_hook(seconds).decode(&document)?;
/// assert_eq!(settings.timeout, 30);
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
pub fn hook_fn<F>(source: ValueKind, target: TargetKind, convert: F) -> impl DecodeHook
where
    F: Fn(&KeyPath, &Value) -> Result<Option<Value>, HookError> + Send + Sync,
{
    FnHook {
        source,
        target,
        convert,
    }
}
