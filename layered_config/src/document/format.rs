//! Format table and parsing of rendered layer text.

use std::fmt;
use std::str::FromStr;

use camino::Utf8Path;
use serde_json::Value;
use thiserror::Error;

use super::Mapping;

/// Structured notation a layer is written in.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Format {
    /// JSON, always available.
    Json,
    /// YAML, available with the `yaml` feature.
    Yaml,
    /// TOML, available with the `toml` feature.
    Toml,
}

/// A format hint that does not name an enabled format.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("unsupported configuration format '{0}'")]
pub struct UnsupportedFormat(
    /// The hint exactly as the caller supplied it.
    pub String,
);

impl Format {
    /// Every format the crate knows about, enabled or not.
    pub const ALL: [Self; 3] = [Self::Json, Self::Yaml, Self::Toml];

    /// Canonical lowercase name of the format.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
        }
    }

    /// Whether support for this format was compiled in.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        match self {
            Self::Json => true,
            Self::Yaml => cfg!(feature = "yaml"),
            Self::Toml => cfg!(feature = "toml"),
        }
    }

    /// Resolve a format hint such as `"yaml"`, `".YML"` or `"json"`.
    ///
    /// A single leading dot is stripped and matching ignores ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedFormat`] carrying the hint as supplied when it
    /// names no known format or a format whose feature is disabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use layered_config::Format;
    ///
    /// assert_eq!(Format::from_hint(".JSON"), Ok(Format::Json));
    /// assert!(Format::from_hint("ini").is_err());
    /// ```
    pub fn from_hint(hint: &str) -> Result<Self, UnsupportedFormat> {
        let normalised = hint.strip_prefix('.').unwrap_or(hint).to_ascii_lowercase();
        let format = match normalised.as_str() {
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            "toml" => Self::Toml,
            _ => return Err(UnsupportedFormat(hint.to_owned())),
        };
        if format.is_enabled() {
            Ok(format)
        } else {
            Err(UnsupportedFormat(hint.to_owned()))
        }
    }

    /// Infer the format from a path's extension.
    ///
    /// Returns `None` when the path has no extension, leaving the choice to
    /// the caller's default.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedFormat`] when the extension is not recognised.
    pub fn from_path(path: &Utf8Path) -> Result<Option<Self>, UnsupportedFormat> {
        path.extension().map(Self::from_hint).transpose()
    }

    /// Parse rendered layer text into a top-level mapping.
    ///
    /// Blank text and an explicit top-level `null` both yield an empty
    /// mapping, so a layer may be rendered down to nothing.
    ///
    /// # Errors
    ///
    /// Returns the parser's diagnostic when the text is malformed, or an
    /// [`std::io::ErrorKind::InvalidData`] error when the top level is not a
    /// mapping.
    pub fn parse(self, text: &str) -> Result<Mapping, Box<dyn std::error::Error + Send + Sync>> {
        if text.trim().is_empty() {
            return Ok(Mapping::new());
        }
        let value = self.parse_value(text)?;
        match value {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Mapping::new()),
            other => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "expected a mapping at the top level, found {}",
                    crate::decode::ValueKind::of(&other)
                ),
            ))),
        }
    }

    fn parse_value(self, text: &str) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            Self::Json => Ok(serde_json::from_str(text)?),
            Self::Yaml => {
                #[cfg(feature = "yaml")]
                {
                    Ok(super::yaml::parse(text)?)
                }
                #[cfg(not(feature = "yaml"))]
                {
                    Err(disabled(self))
                }
            }
            Self::Toml => {
                #[cfg(feature = "toml")]
                {
                    Ok(toml::from_str::<Value>(text)?)
                }
                #[cfg(not(feature = "toml"))]
                {
                    Err(disabled(self))
                }
            }
        }
    }
}

#[cfg(any(not(feature = "yaml"), not(feature = "toml")))]
fn disabled(format: Format) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::other(format!(
        "{format} feature disabled: enable the '{format}' feature to support this format"
    )))
}

impl Default for Format {
    fn default() -> Self {
        if cfg!(feature = "yaml") {
            Self::Yaml
        } else {
            Self::Json
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = UnsupportedFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hint(s)
    }
}
