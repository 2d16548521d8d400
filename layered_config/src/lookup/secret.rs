//! The `secret` template function and its store abstraction.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::document::Mapping;
use crate::template::{Arity, FunctionError, TemplateFunction};

/// Error reported by a [`SecretStore`] implementation.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// A key/value secret store addressed by path.
///
/// Implementations wrap whatever client the application uses. Reads block
/// the caller; timeouts and authentication are the implementation's concern.
pub trait SecretStore: Send + Sync {
    /// Read the secret stored at `path`.
    ///
    /// Returns `Ok(None)` when nothing is stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns the client's error when the store cannot be queried.
    fn read(&self, path: &str) -> Result<Option<Mapping>, StoreError>;
}

impl<T: SecretStore + ?Sized> SecretStore for Arc<T> {
    fn read(&self, path: &str) -> Result<Option<Mapping>, StoreError> {
        (**self).read(path)
    }
}

/// In-memory [`SecretStore`], for embedding and tests.
///
/// ```
/// use layered_config::{MemorySecretStore, SecretStore};
/// use serde_json::json;
///
/// let store = MemorySecretStore::new().with_secret("secret/app", [("token", json!("s3cr3t"))]);
/// let secret = store.read("secret/app").ok().flatten();
/// assert_eq!(secret.and_then(|s| s.get("token").cloned()), Some(json!("s3cr3t")));
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemorySecretStore {
    secrets: BTreeMap<String, Mapping>,
}

impl MemorySecretStore {
    /// Create an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            secrets: BTreeMap::new(),
        }
    }

    /// Store `data` at `path`, returning the previous secret.
    pub fn insert(&mut self, path: impl Into<String>, data: Mapping) -> Option<Mapping> {
        self.secrets.insert(path.into(), data)
    }

    /// Builder form of [`MemorySecretStore::insert`].
    #[must_use]
    pub fn with_secret<K, I>(mut self, path: impl Into<String>, data: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let data = data.into_iter().map(|(key, value)| (key.into(), value)).collect();
        self.insert(path, data);
        self
    }

    /// Remove the secret at `path`.
    pub fn remove(&mut self, path: &str) -> Option<Mapping> {
        self.secrets.remove(path)
    }
}

impl SecretStore for MemorySecretStore {
    fn read(&self, path: &str) -> Result<Option<Mapping>, StoreError> {
        Ok(self.secrets.get(path).cloned())
    }
}

impl<P: Into<String>> FromIterator<(P, Mapping)> for MemorySecretStore {
    fn from_iter<I: IntoIterator<Item = (P, Mapping)>>(iter: I) -> Self {
        Self {
            secrets: iter.into_iter().map(|(path, data)| (path.into(), data)).collect(),
        }
    }
}

/// Failures of the `secret` template function.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SecretError {
    /// The store could not be read. Defaults are not applied.
    #[error("failed to read secrets from '{path}': {source}")]
    Unavailable {
        /// Path that was being read.
        path: String,
        /// Error reported by the store.
        #[source]
        source: StoreError,
    },

    /// The key is absent and no default was supplied.
    #[error("key '{key}' does not exist in '{path}' and no default value has been provided")]
    KeyNotFound {
        /// Path that was read.
        path: String,
        /// Key that was requested.
        key: String,
    },
}

/// Looks up keys in a [`SecretStore`].
///
/// Registered as `secret`: `{{ secret "path" "key" }}` or
/// `{{ secret "path" "key" "default" }}`.
#[derive(Clone)]
pub struct SecretFunction {
    store: Arc<dyn SecretStore>,
}

impl SecretFunction {
    /// Create a lookup over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    /// Resolve `key` within the secret at `path`.
    ///
    /// String values are returned verbatim, other values in JSON notation.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::Unavailable`] when the store read fails, even
    /// if a default was supplied, and [`SecretError::KeyNotFound`] when the
    /// key is absent and `default` is `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use layered_config::{MemorySecretStore, SecretError, SecretFunction};
    /// use serde_json::json;
    ///
    /// let store = MemorySecretStore::new().with_secret("secret/db", [("port", json!(5432))]);
    /// let secret = SecretFunction::new(Arc::new(store));
    /// assert_eq!(secret.lookup("secret/db", "port", None)?, "5432");
    /// assert_eq!(secret.lookup("secret/db", "user", Some("app"))?, "app");
    /// assert!(matches!(
    ///     secret.lookup("secret/db", "user", None),
    ///     Err(SecretError::KeyNotFound { .. })
    /// ));
    /// # Ok::<_, SecretError>(())
    /// ```
    pub fn lookup(&self, path: &str, key: &str, default: Option<&str>) -> Result<String, SecretError> {
        debug!(path, key, "secret lookup");
        let secret = self.store.read(path).map_err(|source| SecretError::Unavailable {
            path: path.to_owned(),
            source,
        })?;
        if let Some(value) = secret.as_ref().and_then(|data| data.get(key)) {
            return Ok(render_value(value));
        }
        debug!(path, key, has_default = default.is_some(), "secret key absent");
        default.map(str::to_owned).ok_or_else(|| SecretError::KeyNotFound {
            path: path.to_owned(),
            key: key.to_owned(),
        })
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl fmt::Debug for SecretFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretFunction").finish_non_exhaustive()
    }
}

impl TemplateFunction for SecretFunction {
    fn call(&self, args: &[String]) -> Result<String, FunctionError> {
        let result = match args {
            [path, key] => self.lookup(path, key, None),
            [path, key, default] => self.lookup(path, key, Some(default)),
            _ => return Err(format!("secret takes 2 or 3 arguments, got {}", args.len()).into()),
        };
        result.map_err(Into::into)
    }

    fn arity(&self) -> Arity {
        Arity::range(2, 3)
    }
}
