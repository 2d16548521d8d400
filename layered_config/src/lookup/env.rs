//! The `env` template function.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::template::{Arity, FunctionError, TemplateFunction};

/// Read access to environment variables.
pub trait EnvSource: Send + Sync {
    /// Value of `name`, or `None` when the variable is not set.
    fn get(&self, name: &str) -> Option<String>;
}

/// The environment of the current process.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        if name.is_empty() || name.contains(['=', '\0']) {
            return None;
        }
        std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
    }
}

impl<S: std::hash::BuildHasher + Send + Sync> EnvSource for HashMap<String, String, S> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        BTreeMap::get(self, name).cloned()
    }
}

/// Looks up environment variables with an optional fallback.
///
/// Registered as `env`: `{{ env "NAME" }}` or `{{ env "NAME" "default" }}`.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use std::sync::Arc;
/// use layered_config::EnvFunction;
///
/// let vars = BTreeMap::from([("EMPTY".to_owned(), String::new())]);
/// let env = EnvFunction::new(Arc::new(vars));
/// assert_eq!(env.lookup("EMPTY", Some("fallback")), "");
/// assert_eq!(env.lookup("MISSING", Some("fallback")), "fallback");
/// assert_eq!(env.lookup("MISSING", None), "");
/// ```
#[derive(Clone)]
pub struct EnvFunction {
    source: Arc<dyn EnvSource>,
}

impl EnvFunction {
    /// Create a lookup over `source`.
    #[must_use]
    pub fn new(source: Arc<dyn EnvSource>) -> Self {
        Self { source }
    }

    /// Resolve `name`.
    ///
    /// A set variable is returned even when empty. An unset variable yields
    /// `default`, or the empty string without one.
    #[must_use]
    pub fn lookup(&self, name: &str, default: Option<&str>) -> String {
        match self.source.get(name) {
            Some(value) => {
                trace!(name, present = true, "environment lookup");
                value
            }
            None => {
                trace!(name, present = false, has_default = default.is_some(), "environment lookup");
                default.unwrap_or_default().to_owned()
            }
        }
    }
}

impl Default for EnvFunction {
    fn default() -> Self {
        Self::new(Arc::new(ProcessEnv))
    }
}

impl fmt::Debug for EnvFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvFunction").finish_non_exhaustive()
    }
}

impl TemplateFunction for EnvFunction {
    fn call(&self, args: &[String]) -> Result<String, FunctionError> {
        match args {
            [name] => Ok(self.lookup(name, None)),
            [name, default] => Ok(self.lookup(name, Some(default))),
            _ => Err(format!("env takes 1 or 2 arguments, got {}", args.len()).into()),
        }
    }

    fn arity(&self) -> Arity {
        Arity::range(1, 2)
    }
}
