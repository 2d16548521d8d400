//! Location of a value within a document.

use std::fmt;

/// One step from a value to one of its children.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathSegment {
    /// A mapping key.
    Key(String),
    /// A sequence position.
    Index(usize),
}

/// Path from the document root to a value, rendered as `c.val` or
/// `tags[2]`.
///
/// ```
/// use layered_config::KeyPath;
///
/// let path = KeyPath::root().key("server").key("tags").index(2);
/// assert_eq!(path.to_string(), "server.tags[2]");
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct KeyPath {
    segments: Vec<PathSegment>,
}

impl KeyPath {
    /// The document root.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Whether this path names the root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Child path through mapping key `key`.
    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.child(PathSegment::Key(key.into()))
    }

    /// Child path through sequence position `index`.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    /// Segments from the root.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if position == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
