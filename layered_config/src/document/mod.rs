//! Parsed configuration documents and the formats they are written in.
//!
//! Every layer is parsed into a [`Mapping`]; sequences and scalars only occur
//! below the top level. [`LayerSource`] identifies where a layer came from so
//! diagnostics can name the offending input.

mod format;
mod source;
#[cfg(feature = "yaml")]
mod yaml;

pub use format::{Format, UnsupportedFormat};
pub use source::LayerSource;

/// Top-level shape of every configuration layer.
pub type Mapping = serde_json::Map<String, serde_json::Value>;

#[cfg(test)]
mod tests;
