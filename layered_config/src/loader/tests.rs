//! Unit tests for the layer accumulator.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow, ensure};
use rstest::{fixture, rstest};
use serde::Deserialize;
use serde_json::{Value, json};

use super::*;
use crate::lookup::MemorySecretStore;
use crate::template::FunctionError;

const DEFAULT_JSON: &str = r#"
{
  "a": "default_a",
  "b": "default_b",
  "c": {
    "val": "default_c"
  }
}
"#;

#[derive(Debug, Deserialize, PartialEq)]
struct CType {
    val: String,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Test {
    a: String,
    b: String,
    c: CType,
}

#[fixture]
fn loader() -> ConfigLoader {
    let env = BTreeMap::from([("A_VAL".to_owned(), "override_a_env".to_owned())]);
    let store = MemorySecretStore::new().with_secret("secret/test", [("A_VAL", json!("override_a_vault"))]);
    let options = LoaderOptions::new()
        .with_env_source(Arc::new(env))
        .with_secret_store(Arc::new(store));
    ConfigLoader::new(options).unwrap_or_else(|err| panic!("default options are valid: {err}"))
}

fn error_of<T>(result: &ConfigResult<T>) -> Option<&ConfigError> {
    result.as_ref().err().map(AsRef::as_ref)
}

fn document(loader: &ConfigLoader) -> Value {
    Value::Object(loader.document().cloned().unwrap_or_default())
}

#[rstest]
fn first_layer_is_installed_verbatim(mut loader: ConfigLoader) -> Result<()> {
    ensure!(loader.document().is_none() && loader.layer_count() == 0);
    loader.append(DEFAULT_JSON, Some("json"))?;
    ensure!(loader.layer_count() == 1);
    ensure!(document(&loader) == json!({"a": "default_a", "b": "default_b", "c": {"val": "default_c"}}));
    Ok(())
}

#[rstest]
fn later_layers_override_without_adding_keys(mut loader: ConfigLoader) -> Result<()> {
    loader.append(DEFAULT_JSON, Some("json"))?;
    loader.append(r#"{"b": "override_b", "d": "ignored", "c": {"extra": 1}}"#, Some(".JSON"))?;
    ensure!(
        document(&loader) == json!({"a": "default_a", "b": "override_b", "c": {"val": "default_c"}}),
        "merged to {}",
        document(&loader)
    );
    Ok(())
}

#[rstest]
fn templates_use_env_and_secret(mut loader: ConfigLoader) -> Result<()> {
    loader.append(DEFAULT_JSON, Some("json"))?;
    loader.append(
        r#"{"a": "{{ env "A_VAL" }}", "b": "{{ secret "secret/test" "B_VAL" "vault_default" }}"}"#,
        Some("json"),
    )?;
    loader.append(r#"{"c": {"val": "{{ secret "secret/test" "A_VAL" }}"}}"#, Some("json"))?;
    let decoded: Test = loader.decode()?;
    ensure!(
        decoded
            == Test {
                a: "override_a_env".into(),
                b: "vault_default".into(),
                c: CType {
                    val: "override_a_vault".into()
                },
            }
    );
    Ok(())
}

#[rstest]
#[case::unknown("ini")]
#[case::empty("")]
fn unsupported_hint_fails_before_rendering(mut loader: ConfigLoader, #[case] hint: &str) -> Result<()> {
    loader.append(DEFAULT_JSON, Some("json"))?;
    let Err(err) = loader.append("{{ missing }}", Some(hint)) else {
        return Err(anyhow!("hint {hint:?} should be rejected"));
    };
    ensure!(
        matches!(&*err, ConfigError::UnsupportedFormat { format, layer: LayerSource::Inline { index: 1 } } if format == hint),
        "unexpected error: {err}"
    );
    ensure!(loader.layer_count() == 1);
    Ok(())
}

#[rstest]
fn failures_keep_earlier_layers(mut loader: ConfigLoader) -> Result<()> {
    loader.append(DEFAULT_JSON, Some("json"))?;
    let before = document(&loader);

    let compile = loader.append(r#"{"a": "{{ vault "p" "k" }}"}"#, Some("json"));
    ensure!(matches!(error_of(&compile), Some(ConfigError::TemplateCompile { .. })));

    let execution = loader.append(r#"{"a": "{{ secret "secret/test" "nope" }}"}"#, Some("json"));
    let Err(err) = execution else {
        return Err(anyhow!("missing secret key should fail"));
    };
    ensure!(matches!(&*err, ConfigError::TemplateExecution { .. }));
    ensure!(matches!(err.secret_error(), Some(crate::lookup::SecretError::KeyNotFound { .. })));

    let parse = loader.append(r#"{"a": "#, Some("json"));
    ensure!(matches!(error_of(&parse), Some(ConfigError::Parse { format: Format::Json, .. })));

    ensure!(document(&loader) == before);
    ensure!(loader.layer_count() == 1);
    Ok(())
}

#[rstest]
fn non_mapping_layers_are_parse_errors(mut loader: ConfigLoader) -> Result<()> {
    let Err(err) = loader.append("[1, 2]", Some("json")) else {
        return Err(anyhow!("a sequence is not a configuration layer"));
    };
    ensure!(matches!(&*err, ConfigError::Parse { .. }));
    ensure!(err.to_string().contains("sequence"), "message was {err}");
    Ok(())
}

#[rstest]
fn blank_layers_contribute_nothing(mut loader: ConfigLoader) -> Result<()> {
    loader.append(DEFAULT_JSON, Some("json"))?;
    loader.append("{{/* nothing to override */}}\n", Some("json"))?;
    ensure!(loader.layer_count() == 2);
    ensure!(document(&loader)["a"] == "default_a");
    Ok(())
}

#[rstest]
fn append_as_checks_the_format_is_enabled(mut loader: ConfigLoader) -> Result<()> {
    loader.append_as(r#"{"a": 1}"#, Format::Json)?;
    for format in Format::ALL {
        if format.is_enabled() {
            continue;
        }
        let result = loader.append_as("a = 1", format);
        ensure!(matches!(error_of(&result), Some(ConfigError::UnsupportedFormat { .. })));
    }
    Ok(())
}

#[test]
fn empty_loader_finalizes_to_empty_mapping() -> Result<()> {
    #[derive(Debug, Deserialize)]
    struct Optional {
        #[serde(default)]
        name: Option<String>,
    }
    let loader = ConfigLoader::default();
    let decoded: Optional = loader.decode()?;
    ensure!(decoded.name.is_none());
    ensure!(loader.finalize().is_empty());
    Ok(())
}

#[test]
fn invalid_options_are_rejected() {
    let bad_delimiters = ConfigLoader::new(LoaderOptions::new().with_delimiters("", "]]"));
    assert!(matches!(error_of(&bad_delimiters), Some(ConfigError::Options { .. })));

    let noop = |_: &[String]| -> Result<String, FunctionError> { Ok(String::new()) };
    let bad_name = ConfigLoader::new(LoaderOptions::new().with_function("not-valid", noop));
    assert!(matches!(error_of(&bad_name), Some(ConfigError::Options { .. })));
}

#[test]
fn extra_functions_override_builtins() -> Result<()> {
    let fixed = |_: &[String]| -> Result<String, FunctionError> { Ok("fixed".to_owned()) };
    let mut loader = ConfigLoader::new(LoaderOptions::new().with_function("env", fixed))?;
    loader.append(r#"{"a": "{{ env "HOME" "x" "y" }}"}"#, Some("json"))?;
    ensure!(document(&loader)["a"] == "fixed");
    Ok(())
}

#[test]
fn secret_is_unknown_without_a_store() {
    let mut loader = ConfigLoader::default();
    let result = loader.append(r#"{"a": "{{ secret "p" "k" }}"}"#, Some("json"));
    assert!(matches!(
        error_of(&result),
        Some(ConfigError::TemplateCompile { source: crate::TemplateError::UnknownFunction { .. }, .. })
    ));
}
