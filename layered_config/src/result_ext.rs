//! Extensions for mapping errors to `ConfigResult` concisely.
//!
//! These helpers reduce repetitive `.map_err(|e| Arc::new(ConfigError::…))`
//! patterns when converting error types into the crate's `ConfigResult<T>`
//! alias (`Result<T, Arc<ConfigError>>`).
//!
//! # Examples
//!
//! ```
//! use layered_config::{ConfigResult, ConfigResultExt, Decoder, Mapping};
//!
//! fn port(document: &Mapping) -> ConfigResult<u16> {
//!     Decoder::new().decode::<u16>(document).into_config()
//! }
//! # assert!(port(&Mapping::new()).is_err());
//! ```

use std::sync::Arc;

use crate::decode::DecodeError;
use crate::{ConfigError, ConfigResult};

/// Generic extension for mapping any `Result<T, E>` with `E: Into<ConfigError>`
/// into a `ConfigResult<T>`.
pub trait ConfigResultExt<T> {
    /// Convert `Result<T, E>` into `ConfigResult<T>` using `Into<ConfigError>`.
    ///
    /// # Errors
    ///
    /// Propagates the original error after conversion into `Arc<ConfigError>`.
    fn into_config(self) -> ConfigResult<T>;
}

impl<T, E> ConfigResultExt<T> for Result<T, E>
where
    E: Into<ConfigError>,
{
    fn into_config(self) -> ConfigResult<T> {
        self.map_err(|e| Arc::new(e.into()))
    }
}

impl From<DecodeError> for ConfigError {
    fn from(source: DecodeError) -> Self {
        Self::Decode { source }
    }
}
