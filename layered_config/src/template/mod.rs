//! Template rendering applied to every layer before it is parsed.
//!
//! Templates use a small pipeline language inside a configurable delimiter
//! pair (`{{` and `}}` by default):
//!
//! ```text
//! {{ env "HOME" }}                   call with literal arguments
//! {{ env "PORT" "8080" }}            optional default as a second argument
//! {{ "value" | upper }}              piped value becomes the last argument
//! {{ upper (env "USER" "nobody") }}  parenthesised sub-pipelines
//! {{- env "A" -}}                    trim surrounding whitespace
//! {{/* comment */}}                  discarded
//! ```
//!
//! Every function named in a template is resolved and its argument count
//! checked when the template is compiled, so a misspelt name fails before
//! any lookup runs. Templates have no data context: `.` and `$` references
//! are rejected.

mod error;
mod parse;
mod registry;

use tracing::trace;

pub use error::{FunctionError, TemplateError};
pub use registry::{Arity, FunctionRegistry, TemplateFunction};

use parse::{Command, Node, Operand, Pipeline};

/// Left and right markers enclosing template actions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Delimiters {
    left: String,
    right: String,
}

impl Delimiters {
    /// Build a delimiter pair.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Delimiters`] when either marker is empty or
    /// contains whitespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use layered_config::Delimiters;
    ///
    /// let delimiters = Delimiters::new("[[", "]]")?;
    /// assert_eq!(delimiters.left(), "[[");
    /// assert!(Delimiters::new("", "]]").is_err());
    /// # Ok::<_, layered_config::TemplateError>(())
    /// ```
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Result<Self, TemplateError> {
        let left = left.into();
        let right = right.into();
        for (side, marker) in [("left", &left), ("right", &right)] {
            if marker.is_empty() {
                return Err(TemplateError::Delimiters {
                    message: format!("{side} delimiter must not be empty"),
                });
            }
            if marker.chars().any(char::is_whitespace) {
                return Err(TemplateError::Delimiters {
                    message: format!("{side} delimiter {marker:?} must not contain whitespace"),
                });
            }
        }
        Ok(Self { left, right })
    }

    /// Marker opening an action.
    #[must_use]
    pub fn left(&self) -> &str {
        &self.left
    }

    /// Marker closing an action.
    #[must_use]
    pub fn right(&self) -> &str {
        &self.right
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            left: "{{".to_owned(),
            right: "}}".to_owned(),
        }
    }
}

/// A template whose actions have been parsed and validated.
#[derive(Clone, Debug)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Whether the template consists of literal text only.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.nodes.iter().all(|node| matches!(node, Node::Text(_)))
    }

    /// Execute the template against `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Execution`] when a function fails. Functions
    /// missing from `registry` yield [`TemplateError::UnknownFunction`].
    pub fn execute(&self, registry: &FunctionRegistry) -> Result<String, TemplateError> {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Action { line, pipeline } => {
                    out.push_str(&Evaluator { registry, line: *line }.pipeline(pipeline)?);
                }
            }
        }
        Ok(out)
    }
}

/// Compiles and executes templates with a fixed function set.
#[derive(Clone, Debug, Default)]
pub struct Renderer {
    registry: FunctionRegistry,
    delimiters: Delimiters,
}

impl Renderer {
    /// Create a renderer over `registry` using `delimiters`.
    #[must_use]
    pub const fn new(registry: FunctionRegistry, delimiters: Delimiters) -> Self {
        Self {
            registry,
            delimiters,
        }
    }

    /// Functions available to templates.
    #[must_use]
    pub const fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Delimiters enclosing actions.
    #[must_use]
    pub const fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// Parse `text` and check every function reference.
    ///
    /// # Errors
    ///
    /// Returns a compile-time [`TemplateError`] for malformed actions,
    /// unknown functions and argument counts a function does not accept.
    pub fn compile(&self, text: &str) -> Result<Template, TemplateError> {
        let nodes = parse::parse(text, &self.delimiters)?;
        for node in &nodes {
            if let Node::Action { line, pipeline } = node {
                self.check_pipeline(*line, pipeline)?;
            }
        }
        Ok(Template { nodes })
    }

    /// Compile and execute `text` in one step.
    ///
    /// # Errors
    ///
    /// Returns any compile-time error from [`Renderer::compile`] or execution
    /// error from [`Template::execute`].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use layered_config::{Delimiters, FunctionError, FunctionRegistry, Renderer};
    ///
    /// let mut registry = FunctionRegistry::new();
    /// registry.register(
    ///     "upper",
    ///     Arc::new(|args: &[String]| -> Result<String, FunctionError> {
    ///         Ok(args.concat().to_uppercase())
    ///     }),
    /// )?;
    /// let renderer = Renderer::new(registry, Delimiters::default());
    /// assert_eq!(renderer.render(r#"name: {{ "svc" | upper }}"#)?, "name: SVC");
    /// # Ok::<_, layered_config::TemplateError>(())
    /// ```
    pub fn render(&self, text: &str) -> Result<String, TemplateError> {
        let template = self.compile(text)?;
        if template.is_static() {
            trace!("template contains no actions");
        }
        template.execute(&self.registry)
    }

    fn check_pipeline(&self, line: usize, pipeline: &Pipeline) -> Result<(), TemplateError> {
        for (stage, command) in pipeline.commands.iter().enumerate() {
            let piped = usize::from(stage > 0);
            match command {
                Command::Invoke { name, args } => {
                    self.check_call(line, name, args.len() + piped)?;
                    for operand in args {
                        self.check_operand(line, operand)?;
                    }
                }
                Command::Value(operand) => self.check_operand(line, operand)?,
            }
        }
        Ok(())
    }

    fn check_operand(&self, line: usize, operand: &Operand) -> Result<(), TemplateError> {
        match operand {
            Operand::Literal(_) => Ok(()),
            Operand::Call(name) => self.check_call(line, name, 0),
            Operand::Group(pipeline) => self.check_pipeline(line, pipeline),
        }
    }

    fn check_call(&self, line: usize, name: &str, actual: usize) -> Result<(), TemplateError> {
        let function = self
            .registry
            .get(name)
            .ok_or_else(|| TemplateError::UnknownFunction {
                line,
                name: name.to_owned(),
            })?;
        let expected = function.arity();
        if expected.accepts(actual) {
            Ok(())
        } else {
            Err(TemplateError::Arity {
                line,
                name: name.to_owned(),
                expected,
                actual,
            })
        }
    }
}

struct Evaluator<'a> {
    registry: &'a FunctionRegistry,
    line: usize,
}

impl Evaluator<'_> {
    fn pipeline(&self, pipeline: &Pipeline) -> Result<String, TemplateError> {
        let mut piped: Option<String> = None;
        for command in &pipeline.commands {
            let output = match command {
                Command::Invoke { name, args } => {
                    let mut values = args
                        .iter()
                        .map(|operand| self.operand(operand))
                        .collect::<Result<Vec<_>, _>>()?;
                    values.extend(piped.take());
                    self.call(name, &values)?
                }
                Command::Value(operand) => self.operand(operand)?,
            };
            piped = Some(output);
        }
        Ok(piped.unwrap_or_default())
    }

    fn operand(&self, operand: &Operand) -> Result<String, TemplateError> {
        match operand {
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Call(name) => self.call(name, &[]),
            Operand::Group(pipeline) => self.pipeline(pipeline),
        }
    }

    fn call(&self, name: &str, args: &[String]) -> Result<String, TemplateError> {
        let function = self
            .registry
            .get(name)
            .ok_or_else(|| TemplateError::UnknownFunction {
                line: self.line,
                name: name.to_owned(),
            })?;
        function
            .call(args)
            .map_err(|source| TemplateError::Execution {
                line: self.line,
                name: name.to_owned(),
                source,
            })
    }
}
