//! Construction-time configuration for [`ConfigLoader`](super::ConfigLoader).

use std::fmt;
use std::sync::Arc;

use crate::decode::DecodeHook;
use crate::document::Format;
use crate::lookup::{EnvSource, SecretStore};
use crate::template::TemplateFunction;

/// Options consumed by [`ConfigLoader::new`](super::ConfigLoader::new).
///
/// Every setting has a default: the process environment backs `env`, no
/// `secret` function is registered, actions use `{{` and `}}`, layers without
/// a format hint use [`Format::default`], and struct fields match keys
/// ignoring case.
///
/// ```
/// use std::sync::Arc;
/// use layered_config::{ConfigLoader, FunctionError, LoaderOptions, MemorySecretStore};
///
/// let options = LoaderOptions::new()
///     .with_delimiters("[[", "]]")
///     .with_secret_store(Arc::new(MemorySecretStore::new()))
///     .with_function("upper", |args: &[String]| -> Result<String, FunctionError> {
///         Ok(args.concat().to_uppercase())
///     });
/// let loader = ConfigLoader::new(options)?;
/// assert!(loader.renderer().registry().contains("secret"));
/// # Ok::<_, std::sync::Arc<layered_config::ConfigError>>(())
/// ```
#[derive(Clone, Default)]
pub struct LoaderOptions {
    pub(super) secret_store: Option<Arc<dyn SecretStore>>,
    pub(super) delimiters: Option<(String, String)>,
    pub(super) functions: Vec<(String, Arc<dyn TemplateFunction>)>,
    pub(super) env_source: Option<Arc<dyn EnvSource>>,
    pub(super) default_format: Format,
    pub(super) decode_hooks: Vec<Arc<dyn DecodeHook>>,
    pub(super) case_sensitive: bool,
}

impl LoaderOptions {
    /// Default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the `secret` function backed by `store`.
    #[must_use]
    pub fn with_secret_store(mut self, store: Arc<dyn SecretStore>) -> Self {
        self.secret_store = Some(store);
        self
    }

    /// Use `left` and `right` to delimit template actions.
    ///
    /// The pair is validated by [`ConfigLoader::new`](super::ConfigLoader::new).
    #[must_use]
    pub fn with_delimiters(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.delimiters = Some((left.into(), right.into()));
        self
    }

    /// Make `function` callable from templates as `name`.
    ///
    /// Extra functions are registered after the built-ins and replace them
    /// when the names collide.
    #[must_use]
    pub fn with_function(
        mut self,
        name: impl Into<String>,
        function: impl TemplateFunction + 'static,
    ) -> Self {
        self.functions.push((name.into(), Arc::new(function)));
        self
    }

    /// Resolve `env` lookups through `source` instead of the process
    /// environment.
    #[must_use]
    pub fn with_env_source(mut self, source: Arc<dyn EnvSource>) -> Self {
        self.env_source = Some(source);
        self
    }

    /// Format for inline layers without a hint and files without an
    /// extension.
    #[must_use]
    pub const fn with_default_format(mut self, format: Format) -> Self {
        self.default_format = format;
        self
    }

    /// Append a hook consulted while decoding.
    #[must_use]
    pub fn with_decode_hook(mut self, hook: impl DecodeHook + 'static) -> Self {
        self.decode_hooks.push(Arc::new(hook));
        self
    }

    /// Require document keys to match struct field names exactly.
    #[must_use]
    pub const fn case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }
}

impl fmt::Debug for LoaderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let functions: Vec<&str> = self.functions.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("LoaderOptions")
            .field("secret_store", &self.secret_store.is_some())
            .field("delimiters", &self.delimiters)
            .field("functions", &functions)
            .field("env_source", &self.env_source.is_some())
            .field("default_format", &self.default_format)
            .field("decode_hooks", &self.decode_hooks.len())
            .field("case_sensitive", &self.case_sensitive)
            .finish()
    }
}
