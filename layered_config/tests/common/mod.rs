//! Shared fixtures for the integration tests.

use serde::Deserialize;

/// Base layer defining the shape every scenario starts from.
pub const DEFAULT_JSON: &str = r#"
{
  "a": "default_a",
  "b": "default_b",
  "c": {
    "val": "default_c"
  }
}
"#;

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct CType {
    pub val: String,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub a: String,
    pub b: String,
    pub c: CType,
}

impl Settings {
    pub fn new(a: &str, b: &str, c: &str) -> Self {
        Self {
            a: a.to_owned(),
            b: b.to_owned(),
            c: CType { val: c.to_owned() },
        }
    }
}
