//! YAML parsing backed by `serde-saphyr`.

use serde_json::Value;
use serde_saphyr::Options;

/// Parse YAML into a document value using strict boolean semantics, so
/// `yes`/`no`/`on`/`off` stay strings as in YAML 1.2.
pub(super) fn parse(contents: &str) -> Result<Value, std::io::Error> {
    serde_saphyr::from_str_with_options(
        contents,
        Options {
            strict_booleans: true,
            ..Options::default()
        },
    )
    .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err.to_string()))
}
