//! Constructors and inspection helpers for `ConfigError`.

use std::error::Error;
use std::sync::Arc;

use crate::document::LayerSource;
use crate::lookup::SecretError;
use crate::template::TemplateError;

use super::ConfigError;

impl ConfigError {
    /// Wrap a renderer failure for `layer`, routing execution failures to
    /// [`ConfigError::TemplateExecution`] and everything else to
    /// [`ConfigError::TemplateCompile`].
    ///
    /// # Examples
    ///
    /// ```
    /// use layered_config::{ConfigError, LayerSource, TemplateError};
    ///
    /// let err = ConfigError::template(
    ///     LayerSource::Inline { index: 0 },
    ///     TemplateError::UnknownFunction { line: 1, name: "nope".into() },
    /// );
    /// assert!(matches!(err, ConfigError::TemplateCompile { .. }));
    /// ```
    #[must_use]
    pub fn template(layer: LayerSource, source: TemplateError) -> Self {
        if source.is_execution() {
            Self::TemplateExecution { layer, source }
        } else {
            Self::TemplateCompile { layer, source }
        }
    }

    /// Construct an options error wrapped in an [`Arc`].
    #[must_use]
    pub fn options_arc(message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::Options {
            message: message.into(),
        })
    }

    /// Returns the layer this error concerns, when it concerns one.
    #[must_use]
    pub fn layer(&self) -> Option<&LayerSource> {
        match self {
            Self::Read { layer, .. }
            | Self::TemplateCompile { layer, .. }
            | Self::TemplateExecution { layer, .. }
            | Self::Parse { layer, .. }
            | Self::UnsupportedFormat { layer, .. } => Some(layer),
            Self::Decode { .. } | Self::Options { .. } => None,
        }
    }

    /// Find the [`SecretError`] behind a failed `secret` lookup.
    ///
    /// Walks the source chain so callers can tell an unreachable store from a
    /// missing key without inspecting messages.
    #[must_use]
    pub fn secret_error(&self) -> Option<&SecretError> {
        let mut current: Option<&(dyn Error + 'static)> = Some(self);
        while let Some(err) = current {
            if let Some(secret) = err.downcast_ref::<SecretError>() {
                return Some(secret);
            }
            current = err.source();
        }
        None
    }
}
