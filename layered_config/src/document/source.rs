//! Identity of a configuration layer.

use std::fmt;

use camino::Utf8PathBuf;

/// Where a configuration layer came from.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum LayerSource {
    /// A string appended directly, identified by its zero-based position
    /// among all appended layers.
    Inline {
        /// Position of the layer in append order.
        index: usize,
    },
    /// A file loaded from disk.
    File {
        /// Path as supplied by the caller.
        path: Utf8PathBuf,
    },
}

impl LayerSource {
    /// Returns the file path when the layer was read from disk.
    #[must_use]
    pub fn path(&self) -> Option<&camino::Utf8Path> {
        match self {
            Self::File { path } => Some(path.as_path()),
            Self::Inline { .. } => None,
        }
    }
}

impl fmt::Display for LayerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline { index } => write!(f, "inline source #{index}"),
            Self::File { path } => write!(f, "file '{path}'"),
        }
    }
}
