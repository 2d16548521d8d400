//! Example service loading its settings from layered files.
//!
//! ```text
//! SERVICE_TOKEN=abc cargo run --example layered_service -- base.yaml prod.json
//! ```
//!
//! Each file may use `{{ env "NAME" "default" }}` and
//! `{{ secret "service/api" "key" "default" }}`; secrets come from an
//! in-memory store seeded below.

use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use layered_config::{
    ConfigLoader, LoaderOptions, MemorySecretStore, StringToScalarHook, StringToSequenceHook,
};
use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Command-line arguments for the example.
#[derive(Debug, Parser)]
#[command(name = "layered-service", about = "Prints settings merged from layered files")]
struct Args {
    /// Configuration files, lowest precedence first.
    #[arg(required = true)]
    files: Vec<Utf8PathBuf>,
    /// Require keys to match field names exactly.
    #[arg(long)]
    case_sensitive: bool,
}

#[derive(Debug, Deserialize)]
struct Database {
    url: String,
    pool_size: u16,
}

#[derive(Debug, Deserialize)]
struct Settings {
    listen: String,
    token: String,
    features: HashSet<String>,
    database: Database,
}

fn options(case_sensitive: bool) -> LoaderOptions {
    let store = MemorySecretStore::new().with_secret(
        "service/api",
        [("token", json!("from-secret-store")), ("retries", json!(3))],
    );
    LoaderOptions::new()
        .with_secret_store(Arc::new(store))
        .with_decode_hook(StringToSequenceHook::new(","))
        .with_decode_hook(StringToScalarHook::integer())
        .case_sensitive(case_sensitive)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut loader = ConfigLoader::new(options(args.case_sensitive))?;
    loader
        .load_files(&args.files)
        .with_context(|| format!("loading {} configuration file(s)", args.files.len()))?;
    let settings: Settings = loader.decode().context("decoding settings")?;

    let mut features: Vec<&str> = settings.features.iter().map(String::as_str).collect();
    features.sort_unstable();
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "listen:    {}", settings.listen)?;
    writeln!(stdout, "token:     {} chars", settings.token.len())?;
    writeln!(stdout, "features:  {}", features.join(", "))?;
    writeln!(
        stdout,
        "database:  {} (pool {})",
        settings.database.url, settings.database.pool_size
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::ensure;
    use test_helpers::{jail_error, with_jail, write_file};

    #[test]
    fn merges_files_with_env_and_secrets() -> Result<()> {
        let settings = with_jail(|jail| {
            jail.set_env("FEATURES", "metrics, audit,,");
            let base = write_file(
                jail,
                "base.json",
                r#"{
                  "listen": "127.0.0.1:8080",
                  "token": "unset",
                  "features": [],
                  "database": {"url": "postgres://localhost/app", "pool_size": 4}
                }"#,
            )?;
            let prod = write_file(
                jail,
                "prod.json",
                r#"{
                  "token": "{{ secret "service/api" "token" }}",
                  "features": "{{ env "FEATURES" "" }}",
                  "database": {"pool_size": "{{ secret "service/api" "retries" }}0"}
                }"#,
            )?;
            let mut loader = ConfigLoader::new(options(false)).map_err(jail_error)?;
            loader.load_files([base, prod]).map_err(jail_error)?;
            loader.decode::<Settings>().map_err(jail_error)
        })?;
        ensure!(settings.listen == "127.0.0.1:8080");
        ensure!(settings.token == "from-secret-store");
        ensure!(settings.features.len() == 2 && settings.features.contains("audit"));
        ensure!(settings.database.pool_size == 30);
        ensure!(settings.database.url == "postgres://localhost/app");
        Ok(())
    }
}
