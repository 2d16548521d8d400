//! The `secret` template function against instrumented stores.

use std::sync::Arc;

use anyhow::{Result, anyhow, ensure};
use layered_config::{ConfigError, ConfigLoader, LoaderOptions, MemorySecretStore, SecretError};
use serde_json::json;
use test_helpers::{CountingStore, FailingStore};

const BASE: &str = r#"{"token": "unset", "port": 0}"#;

fn loader_with(store: Arc<dyn layered_config::SecretStore>) -> Result<ConfigLoader> {
    let mut loader = ConfigLoader::new(LoaderOptions::new().with_secret_store(store))?;
    loader.append(BASE, Some("json"))?;
    Ok(loader)
}

#[test]
fn unreachable_store_fails_even_with_a_default() -> Result<()> {
    let mut loader = loader_with(Arc::new(FailingStore::new("permission denied")))?;
    let Err(err) = loader.append(r#"{"token": "{{ secret "secret/app" "token" "fallback" }}"}"#, Some("json"))
    else {
        return Err(anyhow!("a store failure must not fall back to the default"));
    };
    ensure!(matches!(&*err, ConfigError::TemplateExecution { .. }), "unexpected error: {err}");
    ensure!(matches!(
        err.secret_error(),
        Some(SecretError::Unavailable { path, .. }) if path == "secret/app"
    ));
    ensure!(err.to_string().contains("permission denied"));
    ensure!(loader.finalize().get("token") == Some(&json!("unset")));
    Ok(())
}

#[test]
fn missing_key_without_default_names_path_and_key() -> Result<()> {
    let mut loader = loader_with(Arc::new(MemorySecretStore::new()))?;
    let Err(err) = loader.append(r#"{"token": "{{ secret "secret/app" "token" }}"}"#, Some("json")) else {
        return Err(anyhow!("a missing key without default should fail"));
    };
    let Some(SecretError::KeyNotFound { path, key }) = err.secret_error() else {
        return Err(anyhow!("unexpected error: {err}"));
    };
    ensure!(path == "secret/app" && key == "token");
    Ok(())
}

#[test]
fn non_string_secrets_render_as_json() -> Result<()> {
    let store = MemorySecretStore::new().with_secret("secret/db", [("port", json!(5432))]);
    let mut loader = loader_with(Arc::new(store))?;
    loader.append(r#"{"port": {{ secret "secret/db" "port" }}}"#, Some("json"))?;
    ensure!(loader.finalize().get("port") == Some(&json!(5432)));
    Ok(())
}

#[test]
fn every_action_reads_the_store() -> Result<()> {
    let store = Arc::new(CountingStore::new(
        MemorySecretStore::new().with_secret("secret/app", [("token", json!("t0k3n"))]),
    ));
    let mut loader = loader_with(store.clone())?;
    loader.append(
        r#"{"token": "{{ secret "secret/app" "token" }}{{ secret "secret/app" "token" }}"}"#,
        Some("json"),
    )?;
    ensure!(store.reads() == 2, "store was read {} times", store.reads());
    ensure!(loader.finalize().get("token") == Some(&json!("t0k3nt0k3n")));
    Ok(())
}

#[test]
fn compile_errors_skip_the_store() -> Result<()> {
    let store = Arc::new(CountingStore::default());
    let mut loader = loader_with(store.clone())?;
    let result = loader.append(
        r#"{"token": "{{ secret "secret/app" "token" }}", "port": "{{ nope }}"}"#,
        Some("json"),
    );
    ensure!(result.is_err());
    ensure!(store.reads() == 0, "functions ran before compilation finished");
    Ok(())
}
