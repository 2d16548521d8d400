//! Primary error enum for configuration loading flows.

use thiserror::Error;

use crate::decode::DecodeError;
use crate::document::{Format, LayerSource};
use crate::template::TemplateError;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A configuration file could not be read.
    #[error("failed to read {layer}: {source}")]
    Read {
        /// File layer that could not be read.
        layer: LayerSource,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A layer's template failed to compile.
    #[error("failed to compile template for {layer}: {source}")]
    TemplateCompile {
        /// Layer whose template was rejected.
        layer: LayerSource,
        /// Compilation failure reported by the renderer.
        #[source]
        source: TemplateError,
    },

    /// A template function failed while a layer was being rendered.
    #[error("failed to render {layer}: {source}")]
    TemplateExecution {
        /// Layer being rendered.
        layer: LayerSource,
        /// Execution failure reported by the renderer.
        #[source]
        source: TemplateError,
    },

    /// The rendered text of a layer is not a valid document.
    #[error("failed to parse {layer} as {format}: {source}")]
    Parse {
        /// Layer whose rendered text failed to parse.
        layer: LayerSource,
        /// Format the text was parsed as.
        format: Format,
        /// Parser diagnostic.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The requested document format is not recognised or not enabled.
    #[error("unsupported configuration format '{format}' for {layer}")]
    UnsupportedFormat {
        /// Layer that requested the format.
        layer: LayerSource,
        /// Format hint as supplied by the caller.
        format: String,
    },

    /// The accumulated document could not be decoded into the target type.
    #[error("failed to decode configuration: {source}")]
    Decode {
        /// Decoder diagnostic naming the offending field.
        #[source]
        source: DecodeError,
    },

    /// The loader options are invalid.
    #[error("invalid loader options: {message}")]
    Options {
        /// Human-readable explanation of the problem.
        message: String,
    },
}
