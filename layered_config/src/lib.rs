//! Layered configuration loading for Rust applications.
//!
//! A [`ConfigLoader`] accepts an ordered list of configuration sources, either
//! inline strings or files. Each source is rendered as a template first, so
//! values can be pulled from the environment (`{{ env "NAME" "default" }}`) or
//! from a secret store (`{{ secret "path" "key" }}`). The rendered text is then
//! parsed and folded into the accumulated document:
//!
//! - the first source defines the complete shape of the configuration;
//! - later sources may replace values of keys that already exist, but never
//!   introduce new keys;
//! - nested mappings merge recursively while sequences and scalars are
//!   replaced wholesale.
//!
//! Once every source has been appended, the accumulated document is decoded
//! into any `serde::Deserialize` type, optionally consulting typed
//! [`DecodeHook`]s.
//!
//! ```rust
//! use layered_config::ConfigLoader;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Settings {
//!     host: String,
//!     port: u16,
//! }
//!
//! let mut loader = ConfigLoader::default();
//! loader.append(r#"{"host": "localhost", "port": 8080}"#, Some("json"))?;
//! loader.append("port: 9090\nignored: true", Some("yaml"))?;
//!
//! let settings: Settings = loader.decode()?;
//! assert_eq!(settings.host, "localhost");
//! assert_eq!(settings.port, 9090);
//! # Ok::<_, std::sync::Arc<layered_config::ConfigError>>(())
//! ```

pub mod decode;
pub mod document;
mod error;
pub mod loader;
pub mod lookup;
pub mod merge;
mod result_ext;
pub mod template;

pub use decode::{
    DecodeError, DecodeErrorKind, DecodeHook, Decoder, HookError, KeyPath, PathSegment,
    StringToScalarHook, StringToSequenceHook, TargetKind, ValueKind, hook_fn,
};
pub use document::{Format, LayerSource, Mapping, UnsupportedFormat};
pub use error::ConfigError;
pub use loader::{ConfigLoader, LoaderOptions};
pub use lookup::{
    EnvFunction, EnvSource, MemorySecretStore, ProcessEnv, SecretError, SecretFunction,
    SecretStore, StoreError,
};
pub use merge::{merge_documents, merge_mappings};
pub use result_ext::ConfigResultExt;
pub use template::{
    Arity, Delimiters, FunctionError, FunctionRegistry, Renderer, Template, TemplateError,
    TemplateFunction,
};

#[doc(hidden)]
pub use serde_json;

/// Result type used throughout the crate.
///
/// Errors are shared behind an [`Arc`](std::sync::Arc) so they can be stored
/// and cloned cheaply by callers that report them more than once.
pub type ConfigResult<T> = std::result::Result<T, std::sync::Arc<ConfigError>>;
