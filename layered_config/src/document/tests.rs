//! Unit tests for format resolution and layer parsing.

use anyhow::{Result, anyhow, ensure};
use camino::Utf8Path;
use rstest::rstest;
use serde_json::json;

use super::{Format, LayerSource, UnsupportedFormat};

#[rstest]
#[case("json", Format::Json)]
#[case(".json", Format::Json)]
#[case("JSON", Format::Json)]
fn resolves_json_hints(#[case] hint: &str, #[case] expected: Format) {
    assert_eq!(Format::from_hint(hint), Ok(expected));
}

#[cfg(feature = "yaml")]
#[rstest]
#[case("yaml")]
#[case("yml")]
#[case(".YML")]
fn resolves_yaml_hints(#[case] hint: &str) {
    assert_eq!(Format::from_hint(hint), Ok(Format::Yaml));
}

#[cfg(feature = "toml")]
#[test]
fn resolves_toml_hint() {
    assert_eq!("toml".parse::<Format>(), Ok(Format::Toml));
}

#[cfg(not(feature = "toml"))]
#[test]
fn disabled_toml_hint_is_unsupported() {
    assert_eq!(
        "toml".parse::<Format>(),
        Err(UnsupportedFormat("toml".to_owned()))
    );
}

#[rstest]
#[case("ini")]
#[case("")]
#[case("..json")]
fn rejects_unknown_hints_verbatim(#[case] hint: &str) {
    assert_eq!(
        Format::from_hint(hint),
        Err(UnsupportedFormat(hint.to_owned()))
    );
}

#[rstest]
#[case("config/app.json", Ok(Some(Format::Json)))]
#[case("config/app", Ok(None))]
#[case("config/app.conf", Err(UnsupportedFormat("conf".to_owned())))]
fn infers_format_from_extension(
    #[case] path: &str,
    #[case] expected: Result<Option<Format>, UnsupportedFormat>,
) {
    assert_eq!(Format::from_path(Utf8Path::new(path)), expected);
}

#[rstest]
#[case("")]
#[case("   \n\t")]
#[case("null")]
fn blank_and_null_layers_parse_to_empty_mapping(#[case] text: &str) -> Result<()> {
    let mapping = Format::Json
        .parse(text)
        .map_err(|err| anyhow!(err.to_string()))?;
    ensure!(mapping.is_empty(), "expected empty mapping, got {mapping:?}");
    Ok(())
}

#[rstest]
#[case("[1, 2]", "sequence")]
#[case("\"text\"", "string")]
#[case("42", "integer")]
fn non_mapping_top_level_is_rejected(#[case] text: &str, #[case] kind: &str) {
    let err = Format::Json.parse(text).expect_err("top level must be a mapping");
    assert!(
        err.to_string().contains(kind),
        "expected error to mention '{kind}', got: {err}"
    );
}

#[test]
fn malformed_json_is_reported() {
    assert!(Format::Json.parse("{\"a\": ").is_err());
}

#[cfg(feature = "yaml")]
#[test]
fn yaml_yes_remains_a_string() -> Result<()> {
    let mapping = Format::Yaml
        .parse("recipient: yes\ncount: 3\nratio: 0.5")
        .map_err(|err| anyhow!(err.to_string()))?;
    ensure!(
        serde_json::Value::Object(mapping)
            == json!({"recipient": "yes", "count": 3, "ratio": 0.5}),
        "unexpected YAML scalar typing"
    );
    Ok(())
}

#[cfg(feature = "yaml")]
#[rstest]
#[case("recipient: [")]
#[case("recipient: first\nrecipient: second")]
fn malformed_yaml_is_reported(#[case] text: &str) {
    assert!(Format::Yaml.parse(text).is_err());
}

#[cfg(feature = "toml")]
#[test]
fn toml_tables_parse_to_nested_mappings() -> Result<()> {
    let mapping = Format::Toml
        .parse("[server]\nport = 8080")
        .map_err(|err| anyhow!(err.to_string()))?;
    ensure!(
        serde_json::Value::Object(mapping) == json!({"server": {"port": 8080}}),
        "unexpected TOML mapping"
    );
    Ok(())
}

#[test]
fn layer_sources_describe_themselves() {
    assert_eq!(
        LayerSource::Inline { index: 2 }.to_string(),
        "inline source #2"
    );
    let file = LayerSource::File {
        path: "conf/base.yaml".into(),
    };
    assert_eq!(file.to_string(), "file 'conf/base.yaml'");
    assert_eq!(file.path(), Some(Utf8Path::new("conf/base.yaml")));
}
