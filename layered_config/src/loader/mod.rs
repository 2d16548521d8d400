//! Accumulates configuration layers: render, parse, merge.

mod files;
mod options;

use std::fmt;
use std::sync::Arc;

use camino::Utf8Path;
use serde::de::DeserializeOwned;
use tracing::debug;

pub use options::LoaderOptions;

use crate::decode::Decoder;
use crate::document::{Format, LayerSource, Mapping, UnsupportedFormat};
use crate::lookup::{
    ENV_FUNCTION, EnvFunction, EnvSource, ProcessEnv, SECRET_FUNCTION, SecretFunction, SecretStore,
};
use crate::merge::merge_mappings;
use crate::template::{Delimiters, FunctionRegistry, Renderer};
use crate::{ConfigError, ConfigResult, ConfigResultExt};

/// Loads layered configuration sources into a single document.
///
/// The first layer defines the shape of the configuration. Every later layer
/// is merged over it with [`merge_mappings`]: values of existing keys are
/// replaced, unknown keys are ignored. A failed append leaves the document
/// holding every layer merged before the failure.
///
/// ```
/// use std::collections::BTreeMap;
/// use std::sync::Arc;
/// use layered_config::{ConfigLoader, LoaderOptions};
///
/// let env = BTreeMap::from([("DB_HOST".to_owned(), "db.internal".to_owned())]);
/// let mut loader = ConfigLoader::new(LoaderOptions::new().with_env_source(Arc::new(env)))?;
/// loader.append(r#"{"db": {"host": "localhost", "port": 5432}}"#, Some("json"))?;
/// loader.append(r#"{"db": {"host": "{{ env "DB_HOST" }}"}}"#, Some("json"))?;
///
/// let document = loader.finalize();
/// assert_eq!(document["db"]["host"], "db.internal");
/// assert_eq!(document["db"]["port"], 5432);
/// # Ok::<_, std::sync::Arc<layered_config::ConfigError>>(())
/// ```
pub struct ConfigLoader {
    renderer: Renderer,
    decoder: Decoder,
    default_format: Format,
    state: Option<Mapping>,
    layers: usize,
}

fn builtin_registry(
    env: Arc<dyn EnvSource>,
    secret_store: Option<Arc<dyn SecretStore>>,
) -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    registry.insert_builtin(ENV_FUNCTION, Arc::new(EnvFunction::new(env)));
    if let Some(store) = secret_store {
        registry.insert_builtin(SECRET_FUNCTION, Arc::new(SecretFunction::new(store)));
    }
    registry
}

impl ConfigLoader {
    /// Build a loader from `options`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Options`] when the delimiters are unusable, an
    /// extra function has an invalid name, or the default format is not
    /// enabled.
    pub fn new(options: LoaderOptions) -> ConfigResult<Self> {
        let LoaderOptions {
            secret_store,
            delimiters,
            functions,
            env_source,
            default_format,
            decode_hooks,
            case_sensitive,
        } = options;

        let delimiters = match delimiters {
            Some((left, right)) => Delimiters::new(left, right)
                .map_err(|err| ConfigError::options_arc(err.to_string()))?,
            None => Delimiters::default(),
        };
        if !default_format.is_enabled() {
            return Err(ConfigError::options_arc(format!(
                "default format '{default_format}' is not enabled"
            )));
        }

        let env = env_source.unwrap_or_else(|| Arc::new(ProcessEnv));
        let mut registry = builtin_registry(env, secret_store);
        for (name, function) in functions {
            registry
                .register(name, function)
                .map_err(|err| ConfigError::options_arc(err.to_string()))?;
        }

        let mut decoder = Decoder::new().case_sensitive(case_sensitive);
        for hook in decode_hooks {
            decoder.push_hook(hook);
        }

        Ok(Self::from_parts(
            Renderer::new(registry, delimiters),
            decoder,
            default_format,
        ))
    }

    const fn from_parts(renderer: Renderer, decoder: Decoder, default_format: Format) -> Self {
        Self {
            renderer,
            decoder,
            default_format,
            state: None,
            layers: 0,
        }
    }

    /// Render, parse and merge an inline layer.
    ///
    /// `format_hint` names the notation (`"json"`, `"yaml"`, `"yml"`,
    /// `"toml"`, optionally with a leading dot); `None` selects the default
    /// format. The hint is resolved before the template is rendered.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`], a template error, or
    /// [`ConfigError::Parse`] naming the layer as `inline source #N`.
    pub fn append(&mut self, text: &str, format_hint: Option<&str>) -> ConfigResult<()> {
        let layer = self.next_inline();
        let format = match format_hint {
            Some(hint) => Format::from_hint(hint).map_err(|err| unsupported(&layer, err))?,
            None => self.default_format,
        };
        self.append_layer(&layer, text, format)
    }

    /// Render, parse and merge an inline layer written in `format`.
    ///
    /// # Errors
    ///
    /// As for [`ConfigLoader::append`].
    pub fn append_as(&mut self, text: &str, format: Format) -> ConfigResult<()> {
        let layer = self.next_inline();
        if !format.is_enabled() {
            return Err(unsupported(&layer, UnsupportedFormat(format.name().to_owned())));
        }
        self.append_layer(&layer, text, format)
    }

    /// Load a single configuration file.
    ///
    /// The format comes from the file extension; files without one use the
    /// default format.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] for unknown extensions,
    /// [`ConfigError::Read`] when the file cannot be read, and otherwise the
    /// same errors as [`ConfigLoader::append`], all naming the path.
    pub fn load_file(&mut self, path: impl AsRef<Utf8Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let layer = LayerSource::File {
            path: path.to_path_buf(),
        };
        let format = Format::from_path(path)
            .map_err(|err| unsupported(&layer, err))?
            .unwrap_or(self.default_format);
        let text = files::read_to_string(path).map_err(|source| {
            Arc::new(ConfigError::Read {
                layer: layer.clone(),
                source,
            })
        })?;
        debug!(path = %path, %format, bytes = text.len(), "read configuration file");
        self.append_layer(&layer, &text, format)
    }

    /// Load configuration files in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by [`ConfigLoader::load_file`].
    pub fn load_files<I, P>(&mut self, paths: I) -> ConfigResult<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        paths.into_iter().try_for_each(|path| self.load_file(path))
    }

    /// The accumulated document, or `None` before the first layer.
    #[must_use]
    pub const fn document(&self) -> Option<&Mapping> {
        self.state.as_ref()
    }

    /// Number of layers merged so far.
    #[must_use]
    pub const fn layer_count(&self) -> usize {
        self.layers
    }

    /// The renderer applied to every layer.
    #[must_use]
    pub const fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// The decoder used by [`ConfigLoader::decode`].
    #[must_use]
    pub const fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Consume the loader, returning the accumulated document.
    ///
    /// Returns an empty mapping when nothing was appended.
    #[must_use]
    pub fn finalize(self) -> Mapping {
        self.state.unwrap_or_default()
    }

    /// Decode the accumulated document into `T`.
    ///
    /// An empty mapping is decoded when nothing was appended.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Decode`] naming the offending field.
    pub fn decode<T: DeserializeOwned>(&self) -> ConfigResult<T> {
        let empty = Mapping::new();
        let document = self.state.as_ref().unwrap_or(&empty);
        self.decoder.decode(document).into_config()
    }

    fn next_inline(&self) -> LayerSource {
        LayerSource::Inline { index: self.layers }
    }

    fn append_layer(&mut self, layer: &LayerSource, text: &str, format: Format) -> ConfigResult<()> {
        let rendered = self
            .renderer
            .render(text)
            .map_err(|err| Arc::new(ConfigError::template(layer.clone(), err)))?;
        let mapping = format.parse(&rendered).map_err(|source| {
            Arc::new(ConfigError::Parse {
                layer: layer.clone(),
                format,
                source,
            })
        })?;
        debug!(%layer, %format, keys = mapping.len(), "appending configuration layer");
        self.state = Some(match self.state.take() {
            Some(current) => merge_mappings(current, mapping),
            None => mapping,
        });
        self.layers += 1;
        Ok(())
    }
}

fn unsupported(layer: &LayerSource, err: UnsupportedFormat) -> Arc<ConfigError> {
    let UnsupportedFormat(format) = err;
    Arc::new(ConfigError::UnsupportedFormat {
        layer: layer.clone(),
        format,
    })
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::from_parts(
            Renderer::new(builtin_registry(Arc::new(ProcessEnv), None), Delimiters::default()),
            Decoder::new(),
            Format::default(),
        )
    }
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("renderer", &self.renderer)
            .field("decoder", &self.decoder)
            .field("default_format", &self.default_format)
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
