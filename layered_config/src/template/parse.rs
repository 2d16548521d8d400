//! Scanning and parsing of template text into actions.
//!
//! Text outside the delimiters is kept verbatim. Inside a delimiter pair the
//! grammar is:
//!
//! ```text
//! pipeline := command ( "|" command )*
//! command  := identifier operand* | operand
//! operand  := literal | identifier | "(" pipeline ")"
//! ```
//!
//! Literals are double-quoted strings with escapes, backquoted raw strings,
//! quoted characters, numbers, `true` and `false`. Numbers may be decimal,
//! hexadecimal (`0x1F`), octal (`0o17`, `017`) or binary (`0b101`) integers,
//! use `_` between digits, or be decimal floats (`.5`, `1.5e3`). Numbers and
//! characters render as their decimal value: `{{ 0x1F }}` becomes `31` and
//! `{{ 'a' }}` becomes `97`.

use std::iter::Peekable;
use std::vec::IntoIter;

use super::Delimiters;
use super::error::TemplateError;
use super::registry::{is_ident_continue, is_ident_start};

/// A compiled template fragment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) enum Node {
    Text(String),
    Action { line: usize, pipeline: Pipeline },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct Pipeline {
    pub(super) commands: Vec<Command>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) enum Command {
    Invoke { name: String, args: Vec<Operand> },
    Value(Operand),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) enum Operand {
    Literal(String),
    Call(String),
    Group(Pipeline),
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Token {
    Ident(String),
    Literal(String),
    LParen,
    RParen,
    Pipe,
}

const COMMENT_OPEN: &str = "/*";
const COMMENT_CLOSE: &str = "*/";

/// Split `text` into literal text and parsed actions.
pub(super) fn parse(text: &str, delimiters: &Delimiters) -> Result<Vec<Node>, TemplateError> {
    let left = delimiters.left();
    let right = delimiters.right();
    let mut nodes = Vec::new();
    let mut rest = text;
    let mut line = 1;
    let mut trim_next = false;

    while let Some((before, after_left)) = rest.split_once(left) {
        line += newlines(before);
        let action_line = line;
        let (trim_prev, inner) = strip_left_trim(after_left);
        push_text(&mut nodes, before, trim_next, trim_prev);

        let (body, tail) = split_action(inner, right, action_line)?;
        line += newlines(body);
        let (trim_after, action) = strip_right_trim(body);
        trim_next = trim_after;
        rest = tail;

        let action = if trim_prev { action.trim_start() } else { action };
        if let Some(comment) = action.trim_start().strip_prefix(COMMENT_OPEN) {
            if !comment.trim_end().ends_with(COMMENT_CLOSE) {
                return Err(TemplateError::syntax(
                    action_line,
                    "comment ends before closing delimiter",
                ));
            }
            continue;
        }

        let tokens = tokenize(action, action_line)?;
        let pipeline = Parser::new(tokens, action_line).parse_action()?;
        nodes.push(Node::Action {
            line: action_line,
            pipeline,
        });
    }

    push_text(&mut nodes, rest, trim_next, false);
    Ok(nodes)
}

fn newlines(text: &str) -> usize {
    text.matches('\n').count()
}

fn push_text(nodes: &mut Vec<Node>, text: &str, trim_start: bool, trim_end: bool) {
    let text = if trim_start { text.trim_start() } else { text };
    let text = if trim_end { text.trim_end() } else { text };
    if !text.is_empty() {
        nodes.push(Node::Text(text.to_owned()));
    }
}

/// Detect a `- ` trim marker directly after the left delimiter.
fn strip_left_trim(inner: &str) -> (bool, &str) {
    let mut chars = inner.chars();
    match (chars.next(), chars.next()) {
        (Some('-'), Some(c)) if c.is_ascii_whitespace() => (true, chars.as_str()),
        _ => (false, inner),
    }
}

/// Detect a ` -` trim marker directly before the right delimiter.
fn strip_right_trim(body: &str) -> (bool, &str) {
    if let Some(stripped) = body.strip_suffix('-') {
        if stripped.ends_with(|c: char| c.is_ascii_whitespace()) {
            return (true, stripped);
        }
    }
    (false, body)
}

/// Locate the right delimiter, skipping over quoted strings and comments.
///
/// Returns the action body and the text after the delimiter.
fn split_action<'a>(
    inner: &'a str,
    right: &str,
    line: usize,
) -> Result<(&'a str, &'a str), TemplateError> {
    let comment_end = inner
        .trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '-')
        .starts_with(COMMENT_OPEN)
        .then(|| inner.find(COMMENT_CLOSE))
        .flatten()
        .map_or(0, |pos| pos + COMMENT_CLOSE.len());

    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (pos, c) in inner.char_indices().skip_while(|(pos, _)| *pos < comment_end) {
        match quote {
            Some(open @ ('"' | '\'')) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == open {
                    quote = None;
                }
            }
            Some(_) => {
                if c == '`' {
                    quote = None;
                }
            }
            None => {
                if inner.get(pos..).is_some_and(|tail| tail.starts_with(right)) {
                    let (body, tail) = inner.split_at(pos);
                    return Ok((body, tail.get(right.len()..).unwrap_or_default()));
                }
                if matches!(c, '"' | '`' | '\'') {
                    quote = Some(c);
                }
            }
        }
    }
    Err(TemplateError::syntax(line, "unclosed action"))
}

fn tokenize(action: &str, line: usize) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut chars = action.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '|' => {
                chars.next();
                tokens.push(Token::Pipe);
            }
            '"' => {
                chars.next();
                tokens.push(Token::Literal(quoted(&mut chars, line)?));
            }
            '`' => {
                chars.next();
                tokens.push(Token::Literal(raw(&mut chars, line)?));
            }
            '\'' => {
                chars.next();
                tokens.push(Token::Literal(character(&mut chars, line)?));
            }
            '.' if chars.clone().nth(1).is_some_and(|next| next.is_ascii_digit()) => {
                tokens.push(Token::Literal(number(&mut chars, line)?));
            }
            '.' | '$' => {
                return Err(TemplateError::syntax(
                    line,
                    format!("unsupported data reference '{c}': templates render without input data"),
                ));
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' => {
                tokens.push(Token::Literal(number(&mut chars, line)?));
            }
            c if is_ident_start(c) => {
                let mut ident = String::new();
                while let Some(next) = chars.next_if(|ch| is_ident_continue(*ch)) {
                    ident.push(next);
                }
                tokens.push(if matches!(ident.as_str(), "true" | "false") {
                    Token::Literal(ident)
                } else {
                    Token::Ident(ident)
                });
            }
            other => {
                return Err(TemplateError::syntax(
                    line,
                    format!("unexpected {other:?} in action"),
                ));
            }
        }
    }
    Ok(tokens)
}

fn quoted(chars: &mut Peekable<std::str::Chars<'_>>, line: usize) -> Result<String, TemplateError> {
    let mut out = String::new();
    while let Some(c) = chars.next() {
        match c {
            '"' => return Ok(out),
            '\n' => return Err(TemplateError::syntax(line, "newline in quoted string")),
            '\\' => {
                let escaped = match chars.next() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('r') => '\r',
                    Some('0') => '\0',
                    Some(ch @ ('\\' | '"' | '\'')) => ch,
                    Some(other) => {
                        return Err(TemplateError::syntax(
                            line,
                            format!("unknown escape sequence '\\{other}'"),
                        ));
                    }
                    None => break,
                };
                out.push(escaped);
            }
            other => out.push(other),
        }
    }
    Err(TemplateError::syntax(line, "unterminated quoted string"))
}

fn raw(chars: &mut Peekable<std::str::Chars<'_>>, line: usize) -> Result<String, TemplateError> {
    let mut out = String::new();
    for c in chars.by_ref() {
        if c == '`' {
            return Ok(out);
        }
        out.push(c);
    }
    Err(TemplateError::syntax(line, "unterminated raw string"))
}

fn number(chars: &mut Peekable<std::str::Chars<'_>>, line: usize) -> Result<String, TemplateError> {
    let mut text = String::new();
    if let Some(sign) = chars.next_if(|c| matches!(c, '-' | '+')) {
        text.push(sign);
    }
    while let Some(c) = chars.next_if(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '+')
    }) {
        if matches!(c, '-' | '+') && !text.ends_with(['e', 'E']) {
            return Err(TemplateError::syntax(line, format!("bad number syntax: {text}{c}")));
        }
        text.push(c);
    }
    normalise_number(&text)
        .ok_or_else(|| TemplateError::syntax(line, format!("bad number syntax: {text}")))
}

/// Render a numeric literal as its decimal value.
///
/// Accepts decimal, `0x`, `0o`, `0b` and leading-zero octal integers, digit
/// separators between digits, and finite decimal floats such as `.5` or
/// `1.5e3`.
fn normalise_number(text: &str) -> Option<String> {
    let (negative, magnitude) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if magnitude.starts_with('_') || magnitude.ends_with('_') || magnitude.contains("__") {
        return None;
    }
    let digits = magnitude.replace('_', "");
    if let Some(value) = integer_magnitude(&digits) {
        return signed_integer(negative, value);
    }
    let value = digits.parse::<f64>().ok().filter(|value| value.is_finite())?;
    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let rendered = value.to_string();
    Some(if negative && rendered != "0" {
        format!("-{rendered}")
    } else {
        rendered
    })
}

fn integer_magnitude(digits: &str) -> Option<u128> {
    let prefixed = |lower: &str, upper: &str| {
        digits
            .strip_prefix(lower)
            .or_else(|| digits.strip_prefix(upper))
    };
    if let Some(hex) = prefixed("0x", "0X") {
        return u128::from_str_radix(hex, 16).ok();
    }
    if let Some(octal) = prefixed("0o", "0O") {
        return u128::from_str_radix(octal, 8).ok();
    }
    if let Some(binary) = prefixed("0b", "0B") {
        return u128::from_str_radix(binary, 2).ok();
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    match digits.strip_prefix('0') {
        Some(octal) if !octal.is_empty() => u128::from_str_radix(octal, 8).ok(),
        _ => digits.parse().ok(),
    }
}

fn signed_integer(negative: bool, magnitude: u128) -> Option<String> {
    if negative {
        let limit = u128::from(i64::MIN.unsigned_abs());
        (magnitude <= limit).then(|| {
            if magnitude == 0 {
                "0".to_owned()
            } else {
                format!("-{magnitude}")
            }
        })
    } else {
        (magnitude <= u128::from(u64::MAX)).then(|| magnitude.to_string())
    }
}

/// Read a quoted character literal, rendered as its code point.
fn character(chars: &mut Peekable<std::str::Chars<'_>>, line: usize) -> Result<String, TemplateError> {
    let value = match chars.next() {
        Some('\\') => match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('0') => '\0',
            Some(ch @ ('\\' | '"' | '\'')) => ch,
            _ => return Err(TemplateError::syntax(line, "malformed character constant")),
        },
        Some(ch) if ch != '\'' && ch != '\n' => ch,
        _ => return Err(TemplateError::syntax(line, "malformed character constant")),
    };
    if chars.next_if_eq(&'\'').is_none() {
        return Err(TemplateError::syntax(line, "malformed character constant"));
    }
    Ok(u32::from(value).to_string())
}

struct Parser {
    tokens: Peekable<IntoIter<Token>>,
    line: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>, line: usize) -> Self {
        Self {
            tokens: tokens.into_iter().peekable(),
            line,
        }
    }

    fn error(&self, message: &str) -> TemplateError {
        TemplateError::syntax(self.line, message)
    }

    fn parse_action(mut self) -> Result<Pipeline, TemplateError> {
        if self.tokens.peek().is_none() {
            return Err(self.error("missing value for action"));
        }
        self.parse_pipeline(false)
    }

    fn parse_pipeline(&mut self, nested: bool) -> Result<Pipeline, TemplateError> {
        let mut commands = vec![self.parse_command()?];
        loop {
            match self.tokens.next() {
                None if nested => return Err(self.error("unclosed left paren")),
                None => break,
                Some(Token::RParen) if nested => break,
                Some(Token::RParen) => return Err(self.error("unexpected right paren")),
                Some(Token::Pipe) => {
                    let command = self.parse_command()?;
                    if let Command::Value(_) = command {
                        return Err(self.error("non-function in pipeline stage"));
                    }
                    commands.push(command);
                }
                Some(_) => return Err(self.error("unexpected operand after command")),
            }
        }
        Ok(Pipeline { commands })
    }

    fn parse_command(&mut self) -> Result<Command, TemplateError> {
        let name = match self.tokens.next_if(|t| matches!(t, Token::Ident(_))) {
            Some(Token::Ident(name)) => Some(name),
            _ => None,
        };
        let mut args = Vec::new();
        while !matches!(self.tokens.peek(), None | Some(Token::Pipe | Token::RParen)) {
            args.push(self.parse_operand()?);
        }
        if let Some(name) = name {
            return Ok(Command::Invoke { name, args });
        }
        let mut operands = args.into_iter();
        match (operands.next(), operands.next()) {
            (Some(value), None) => Ok(Command::Value(value)),
            (None, _) => Err(self.error("missing value for command")),
            (Some(_), Some(_)) => Err(self.error("can't give argument to non-function")),
        }
    }

    fn parse_operand(&mut self) -> Result<Operand, TemplateError> {
        match self.tokens.next() {
            Some(Token::Literal(value)) => Ok(Operand::Literal(value)),
            Some(Token::Ident(name)) => Ok(Operand::Call(name)),
            Some(Token::LParen) => Ok(Operand::Group(self.parse_pipeline(true)?)),
            Some(Token::RParen | Token::Pipe) | None => Err(self.error("missing operand")),
        }
    }
}
