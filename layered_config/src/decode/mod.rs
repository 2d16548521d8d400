//! Decoding of merged documents into typed configuration.
//!
//! [`Decoder`] drives any `serde::Deserialize` type from a [`Mapping`]. Struct
//! fields match document keys exactly first and then ignoring ASCII case
//! (except in structs with flattened fields, see [`Decoder`]).
//! Serde's own `rename` and `alias` attributes choose the key names. Values
//! whose kind does not match what a field requests pass through the
//! registered [`DecodeHook`]s first.

mod de;
mod error;
mod hooks;
mod kind;
mod path;

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{DecodeError, DecodeErrorKind, HookError};
pub use hooks::{DecodeHook, StringToScalarHook, StringToSequenceHook, hook_fn};
pub use kind::{TargetKind, ValueKind};
pub use path::{KeyPath, PathSegment};

use crate::document::Mapping;

/// Decodes documents into typed values, applying hooks in order.
///
/// Key case is folded only for types serde decodes as structs. A struct
/// holding a `#[serde(flatten)]` field is decoded as a map instead, so its
/// keys, and those of the flattened value, must match exactly; use
/// `#[serde(alias = "...")]` for alternative spellings there.
///
/// ```
/// use std::collections::BTreeSet;
/// use layered_config::{Decoder, Mapping, StringToSequenceHook};
/// use serde::Deserialize;
/// use serde_json::json;
///
/// #[derive(Deserialize)]
/// struct Settings {
///     port: u16,
///     tags: BTreeSet<String>,
/// }
///
/// let document: Mapping = serde_json::from_value(json!({"PORT": 80, "tags": "a, b,a"}))?;
/// let settings: Settings = Decoder::new()
///     .with_hook(StringToSequenceHook::new(","))
///     .decode(&document)?;
/// assert_eq!(settings.port, 80);
/// assert_eq!(settings.tags.len(), 2);
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Default)]
pub struct Decoder {
    hooks: Vec<Arc<dyn DecodeHook>>,
    case_sensitive: bool,
}

impl Decoder {
    /// Create a decoder without hooks that folds key case.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `hook` to the hook list.
    #[must_use]
    pub fn with_hook(mut self, hook: impl DecodeHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Append a shared hook to the hook list.
    pub fn push_hook(&mut self, hook: Arc<dyn DecodeHook>) {
        self.hooks.push(hook);
    }

    /// Require document keys to match field names exactly.
    #[must_use]
    pub const fn case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }

    /// Whether keys must match field names exactly.
    #[must_use]
    pub const fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Registered hooks in the order they are consulted.
    pub fn hooks(&self) -> impl Iterator<Item = &Arc<dyn DecodeHook>> {
        self.hooks.iter()
    }

    /// Decode a top-level mapping.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] naming the offending field when a value
    /// cannot be decoded or a hook fails.
    pub fn decode<T: DeserializeOwned>(&self, document: &Mapping) -> Result<T, DecodeError> {
        let root = Value::Object(document.clone());
        self.decode_value(&root)
    }

    /// Decode an arbitrary document value.
    ///
    /// # Errors
    ///
    /// As for [`Decoder::decode`].
    pub fn decode_value<T: DeserializeOwned>(&self, value: &Value) -> Result<T, DecodeError> {
        T::deserialize(de::ValueDeserializer::new(value, KeyPath::root(), self))
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("hooks", &self.hooks.len())
            .field("case_sensitive", &self.case_sensitive)
            .finish()
    }
}
