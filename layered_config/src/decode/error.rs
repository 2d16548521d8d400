//! Decoding failures.

use std::fmt;

use thiserror::Error;

use super::path::KeyPath;

/// Error returned by a [`DecodeHook`](super::DecodeHook).
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// What went wrong while decoding.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// The value does not fit the target type.
    #[error("{0}")]
    Mismatch(String),
    /// A decode hook rejected the value.
    #[error("decode hook failed: {0}")]
    Hook(#[source] HookError),
}

/// A document value that could not be decoded, with its location.
#[derive(Debug, Error)]
#[error("{}{kind}", location(.path.as_ref()))]
pub struct DecodeError {
    path: Option<KeyPath>,
    #[source]
    kind: DecodeErrorKind,
}

fn location(path: Option<&KeyPath>) -> String {
    path.map(|path| format!("{path}: ")).unwrap_or_default()
}

impl DecodeError {
    pub(super) fn hook(path: KeyPath, source: HookError) -> Self {
        Self {
            path: Some(path),
            kind: DecodeErrorKind::Hook(source),
        }
    }

    /// Attach `path` unless a more specific location is already known.
    pub(super) fn or_at(mut self, path: &KeyPath) -> Self {
        if self.path.is_none() && !path.is_root() {
            self.path = Some(path.clone());
        }
        self
    }

    /// Location of the offending value; `None` for the document root.
    #[must_use]
    pub const fn path(&self) -> Option<&KeyPath> {
        self.path.as_ref()
    }

    /// Cause of the failure.
    #[must_use]
    pub const fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }
}

impl serde::de::Error for DecodeError {
    fn custom<T: fmt::Display>(message: T) -> Self {
        Self {
            path: None,
            kind: DecodeErrorKind::Mismatch(message.to_string()),
        }
    }
}
