//! Function registry consulted while compiling and rendering templates.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::error::{FunctionError, TemplateError};

/// Argument counts a template function accepts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Arity {
    min: usize,
    max: Option<usize>,
}

impl Arity {
    /// Accept any number of arguments.
    #[must_use]
    pub const fn any() -> Self {
        Self { min: 0, max: None }
    }

    /// Accept exactly `count` arguments.
    #[must_use]
    pub const fn exactly(count: usize) -> Self {
        Self {
            min: count,
            max: Some(count),
        }
    }

    /// Accept between `min` and `max` arguments, inclusive.
    #[must_use]
    pub const fn range(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    /// Accept `min` or more arguments.
    #[must_use]
    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    /// Whether `count` arguments satisfy this arity.
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        if count < self.min {
            return false;
        }
        match self.max {
            Some(max) => count <= max,
            None => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (0, None) => f.write_str("any number"),
            (min, None) => write!(f, "at least {min}"),
            (min, Some(max)) if min == max => write!(f, "{min}"),
            (min, Some(max)) if max == min + 1 => write!(f, "{min} or {max}"),
            (min, Some(max)) => write!(f, "between {min} and {max}"),
        }
    }
}

/// A function callable from template actions.
///
/// Arguments arrive as strings: literals are passed through as written and
/// nested calls contribute their rendered output. Closures with the
/// signature `Fn(&[String]) -> Result<String, FunctionError>` implement this
/// trait directly.
///
/// ```
/// use std::sync::Arc;
/// use layered_config::{FunctionError, FunctionRegistry, TemplateFunction};
///
/// let upper = |args: &[String]| -> Result<String, FunctionError> {
///     Ok(args.concat().to_uppercase())
/// };
/// let mut registry = FunctionRegistry::new();
/// registry.register("upper", Arc::new(upper))?;
/// assert!(registry.contains("upper"));
/// # Ok::<_, layered_config::TemplateError>(())
/// ```
pub trait TemplateFunction: Send + Sync {
    /// Invoke the function.
    ///
    /// # Errors
    ///
    /// Any error aborts rendering of the current layer.
    fn call(&self, args: &[String]) -> Result<String, FunctionError>;

    /// Argument counts accepted by [`TemplateFunction::call`].
    ///
    /// Templates calling the function with any other count are rejected at
    /// compile time.
    fn arity(&self) -> Arity {
        Arity::any()
    }
}

impl<F> TemplateFunction for F
where
    F: Fn(&[String]) -> Result<String, FunctionError> + Send + Sync,
{
    fn call(&self, args: &[String]) -> Result<String, FunctionError> {
        self(args)
    }
}

/// Name-keyed table of template functions.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, Arc<dyn TemplateFunction>>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }

    /// Register `function` under `name`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidFunctionName`] when `name` is not an
    /// identifier or collides with the `true`/`false` literals.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        function: Arc<dyn TemplateFunction>,
    ) -> Result<(), TemplateError> {
        let name = name.into();
        if !is_function_name(&name) {
            return Err(TemplateError::InvalidFunctionName { name });
        }
        self.functions.insert(name, function);
        Ok(())
    }

    /// Install a built-in function whose name is known to be valid.
    pub(crate) fn insert_builtin(&mut self, name: &'static str, function: Arc<dyn TemplateFunction>) {
        debug_assert!(is_function_name(name));
        self.functions.insert(name.to_owned(), function);
    }

    /// Look up a function by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn TemplateFunction>> {
        self.functions.get(name)
    }

    /// Whether a function is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Number of registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Identifier characters accepted after the first position.
pub(super) const fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Identifier characters accepted in the first position.
pub(super) const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_function_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    is_ident_start(first) && chars.all(is_ident_continue) && !matches!(name, "true" | "false")
}
