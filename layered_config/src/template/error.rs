//! Errors raised while compiling or rendering a template.

use thiserror::Error;

use super::registry::Arity;

/// Error returned by a [`TemplateFunction`](super::TemplateFunction).
pub type FunctionError = Box<dyn std::error::Error + Send + Sync>;

/// Failures reported by the template renderer.
///
/// Every variant except [`TemplateError::Execution`] is detected while the
/// template is compiled, before any function runs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TemplateError {
    /// The template text is malformed.
    #[error("line {line}: {message}")]
    Syntax {
        /// One-based line on which the offending action starts.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// An action references a function missing from the registry.
    #[error("line {line}: function \"{name}\" not defined")]
    UnknownFunction {
        /// One-based line of the action.
        line: usize,
        /// Name of the missing function.
        name: String,
    },

    /// A function is called with an argument count it does not accept.
    #[error("line {line}: wrong number of arguments for \"{name}\": expected {expected}, got {actual}")]
    Arity {
        /// One-based line of the action.
        line: usize,
        /// Name of the called function.
        name: String,
        /// Argument counts the function accepts.
        expected: Arity,
        /// Argument count supplied, including any piped value.
        actual: usize,
    },

    /// A function was registered under a name actions cannot reference.
    #[error("invalid function name \"{name}\": names must be identifiers other than true/false")]
    InvalidFunctionName {
        /// The rejected name.
        name: String,
    },

    /// The delimiter pair is unusable.
    #[error("invalid delimiters: {message}")]
    Delimiters {
        /// Description of the problem.
        message: String,
    },

    /// A function failed while the template was being rendered.
    #[error("line {line}: error calling \"{name}\": {source}")]
    Execution {
        /// One-based line of the action.
        line: usize,
        /// Name of the failing function.
        name: String,
        /// Error returned by the function.
        #[source]
        source: FunctionError,
    },
}

impl TemplateError {
    /// Whether the failure happened while functions were running rather than
    /// while the template was compiled.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution { .. })
    }

    pub(super) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}
