//! Tests for the `env` and `secret` lookups.

use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use anyhow::{Result, anyhow, ensure};
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::document::Mapping;
use crate::template::{Arity, TemplateFunction};

struct DownStore;

impl SecretStore for DownStore {
    fn read(&self, _path: &str) -> Result<Option<Mapping>, StoreError> {
        Err(Box::new(io::Error::new(io::ErrorKind::ConnectionRefused, "store offline")))
    }
}

#[fixture]
fn env() -> EnvFunction {
    let vars = BTreeMap::from([
        ("A_VAL".to_owned(), "override_a_env".to_owned()),
        ("EMPTY".to_owned(), String::new()),
    ]);
    EnvFunction::new(Arc::new(vars))
}

#[fixture]
fn secrets() -> SecretFunction {
    let store = MemorySecretStore::new()
        .with_secret("secret/test", [("A_VAL", json!("override_a_vault")), ("n", json!(3))])
        .with_secret("secret/nested", [("obj", json!({"k": [1, true]}))]);
    SecretFunction::new(Arc::new(store))
}

#[rstest]
#[case::set("A_VAL", None, "override_a_env")]
#[case::set_ignores_default("A_VAL", Some("d"), "override_a_env")]
#[case::empty_is_present("EMPTY", Some("d"), "")]
#[case::unset_default("B_VAL", Some("override_b_env_default"), "override_b_env_default")]
#[case::unset_no_default("B_VAL", None, "")]
fn env_lookup(
    env: EnvFunction,
    #[case] name: &str,
    #[case] default: Option<&str>,
    #[case] expected: &str,
) {
    assert_eq!(env.lookup(name, default), expected);
}

#[rstest]
fn env_call_maps_arguments(env: EnvFunction) -> Result<()> {
    ensure!(env.arity() == Arity::range(1, 2));
    ensure!(env.call(&["B_VAL".into(), "d".into()]).map_err(|e| anyhow!(e))? == "d");
    ensure!(env.call(&[]).is_err());
    Ok(())
}

#[test]
fn process_env_rejects_invalid_names() {
    assert_eq!(ProcessEnv.get(""), None);
    assert_eq!(ProcessEnv.get("A=B"), None);
}

#[rstest]
#[case::string("secret/test", "A_VAL", None, "override_a_vault")]
#[case::number("secret/test", "n", None, "3")]
#[case::structured("secret/nested", "obj", None, r#"{"k":[1,true]}"#)]
#[case::present_ignores_default("secret/test", "A_VAL", Some("d"), "override_a_vault")]
#[case::missing_key_default("secret/test", "B_VAL", Some("override_b_vault_default"), "override_b_vault_default")]
#[case::missing_path_default("secret/none", "B_VAL", Some("d"), "d")]
fn secret_lookup(
    secrets: SecretFunction,
    #[case] path: &str,
    #[case] key: &str,
    #[case] default: Option<&str>,
    #[case] expected: &str,
) -> Result<()> {
    ensure!(secrets.lookup(path, key, default)? == expected);
    Ok(())
}

#[rstest]
#[case::missing_key("secret/test", "B_VAL")]
#[case::missing_path("secret/none", "A_VAL")]
fn secret_without_default_fails(
    secrets: SecretFunction,
    #[case] path: &str,
    #[case] key: &str,
) -> Result<()> {
    match secrets.lookup(path, key, None) {
        Err(SecretError::KeyNotFound { path: p, key: k }) => {
            ensure!(p == path && k == key);
            Ok(())
        }
        other => Err(anyhow!("expected KeyNotFound, got {other:?}")),
    }
}

#[rstest]
#[case::no_default(None)]
#[case::default_not_applied(Some("fallback"))]
fn unavailable_store_ignores_default(#[case] default: Option<&str>) -> Result<()> {
    let secrets = SecretFunction::new(Arc::new(DownStore));
    let Err(err) = secrets.lookup("secret/test", "A_VAL", default) else {
        return Err(anyhow!("read failure must surface"));
    };
    ensure!(matches!(&err, SecretError::Unavailable { path, .. } if path == "secret/test"));
    let source = std::error::Error::source(&err).map(ToString::to_string);
    ensure!(source.as_deref() == Some("store offline"), "source was {source:?}");
    Ok(())
}

#[rstest]
fn secret_call_boxes_secret_error(secrets: SecretFunction) -> Result<()> {
    ensure!(secrets.arity() == Arity::range(2, 3));
    let Err(err) = secrets.call(&["secret/test".into(), "B_VAL".into()]) else {
        return Err(anyhow!("missing key should fail"));
    };
    ensure!(err.downcast_ref::<SecretError>().is_some(), "lost SecretError: {err}");
    Ok(())
}

#[test]
fn memory_store_replaces_and_removes() {
    let mut store: MemorySecretStore = [("p", Mapping::new())].into_iter().collect();
    let mut data = Mapping::new();
    data.insert("k".into(), json!("v"));
    assert_eq!(store.insert("p", data), Some(Mapping::new()));
    assert!(store.remove("p").is_some());
    assert!(matches!(store.read("p"), Ok(None)));
}
