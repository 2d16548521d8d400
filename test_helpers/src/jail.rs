//! Run tests inside a [`figment::Jail`].
//!
//! A jail gives the closure a fresh temporary working directory and restores
//! the process environment afterwards, so tests that load files by relative
//! path or set variables for the `env` function cannot interfere with each
//! other.

use anyhow::{Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};

/// Executes `f` inside a [`figment::Jail`], returning the closure's output.
///
/// The jail is torn down once the closure completes, even when it fails.
///
/// # Errors
///
/// Returns an error if the jail cannot be created or the closure fails.
///
/// # Examples
///
/// ```
/// use layered_config_test_helpers::with_jail;
///
/// let value = with_jail(|jail| {
///     jail.set_env("APP_PORT", "9090");
///     Ok(std::env::var("APP_PORT").unwrap_or_default())
/// })?;
/// assert_eq!(value, "9090");
/// # Ok::<_, anyhow::Error>(())
/// ```
pub fn with_jail<F, T>(f: F) -> Result<T>
where
    F: FnOnce(&mut figment::Jail) -> figment::error::Result<T>,
{
    let mut output = None;
    figment::Jail::try_with(|jail| {
        output = Some(f(jail)?);
        Ok(())
    })
    .map_err(|err| anyhow!(err.to_string()))?;
    output.ok_or_else(|| anyhow!("jail closure did not return a value"))
}

/// Writes `contents` to `name` inside the jail and returns the file's path
/// relative to the jail directory.
///
/// # Errors
///
/// Returns the jail's error when the file cannot be created.
pub fn write_file(
    jail: &mut figment::Jail,
    name: impl AsRef<Utf8Path>,
    contents: &str,
) -> figment::error::Result<Utf8PathBuf> {
    let name = name.as_ref();
    jail.create_file(name.as_std_path(), contents)?;
    Ok(name.to_path_buf())
}

/// Converts anything printable into a [`figment::Error`] so `?` works on
/// non-figment results inside [`with_jail`] closures.
#[expect(
    clippy::needless_pass_by_value,
    reason = "callers hand over owned errors from map_err"
)]
pub fn jail_error<E: ToString>(err: E) -> figment::Error {
    figment::Error::from(err.to_string())
}
