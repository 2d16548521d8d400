//! Built-in template functions that pull values from outside the document.
//!
//! `env` reads environment variables through an [`EnvSource`]; `secret`
//! reads keys from a [`SecretStore`]. Both accept an optional default as
//! their last argument.

mod env;
mod secret;

pub use env::{EnvFunction, EnvSource, ProcessEnv};
pub use secret::{MemorySecretStore, SecretError, SecretFunction, SecretStore, StoreError};

/// Name under which [`EnvFunction`] is registered.
pub const ENV_FUNCTION: &str = "env";

/// Name under which [`SecretFunction`] is registered.
pub const SECRET_FUNCTION: &str = "secret";

#[cfg(test)]
mod tests;
