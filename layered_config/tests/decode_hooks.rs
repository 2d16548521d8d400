//! Decode hooks applied to rendered configuration.

use std::collections::HashSet;

use anyhow::{Result, ensure};
use layered_config::{
    ConfigError, ConfigLoader, DecodeErrorKind, LoaderOptions, StringToScalarHook, StringToSequenceHook,
};
use serde::Deserialize;
use test_helpers::{jail_error, with_jail};

#[derive(Debug, Deserialize)]
struct Features {
    enabled: HashSet<String>,
    workers: u8,
}

fn loader() -> layered_config::ConfigResult<ConfigLoader> {
    ConfigLoader::new(
        LoaderOptions::new()
            .with_decode_hook(StringToSequenceHook::new(","))
            .with_decode_hook(StringToScalarHook::integer()),
    )
}

#[test]
fn env_lists_decode_into_sets() -> Result<()> {
    let features = with_jail(|jail| {
        jail.set_env("FEATURES", "v1, v2,v3,,,");
        jail.set_env("WORKERS", "4");
        let mut loader = loader().map_err(jail_error)?;
        loader
            .append(r#"{"enabled": [], "workers": 1}"#, Some("json"))
            .map_err(jail_error)?;
        loader
            .append(
                r#"{"enabled": "{{ env "FEATURES" }}", "workers": "{{ env "WORKERS" }}"}"#,
                Some("json"),
            )
            .map_err(jail_error)?;
        loader.decode::<Features>().map_err(jail_error)
    })?;
    let expected: HashSet<String> = ["v1", "v2", "v3"].into_iter().map(String::from).collect();
    ensure!(features.enabled == expected, "decoded {:?}", features.enabled);
    ensure!(features.workers == 4);
    Ok(())
}

#[test]
fn hook_failures_surface_as_decode_errors() -> Result<()> {
    let mut loader = loader()?;
    loader.append(r#"{"enabled": "a", "workers": "many"}"#, Some("json"))?;
    let Err(err) = loader.decode::<Features>() else {
        return Err(anyhow::anyhow!("'many' is not a worker count"));
    };
    let ConfigError::Decode { source } = &*err else {
        return Err(anyhow::anyhow!("unexpected error: {err}"));
    };
    ensure!(matches!(source.kind(), DecodeErrorKind::Hook(_)));
    ensure!(source.path().map(ToString::to_string).as_deref() == Some("workers"));
    Ok(())
}

#[test]
fn keys_fold_case_unless_disabled() -> Result<()> {
    #[derive(Debug, Deserialize)]
    struct Server {
        port: u16,
    }
    let mut folded = ConfigLoader::default();
    folded.append(r#"{"PORT": 8080}"#, Some("json"))?;
    ensure!(folded.decode::<Server>()?.port == 8080);

    let mut exact = ConfigLoader::new(LoaderOptions::new().case_sensitive(true))?;
    exact.append(r#"{"PORT": 8080}"#, Some("json"))?;
    ensure!(exact.decode::<Server>().is_err());
    Ok(())
}
