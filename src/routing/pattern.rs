//! URI pattern compilation.
//!
//! # Responsibilities
//! - Translate a route's URI pattern into an anchored regex
//! - Record the declared path parameter names, in declaration order
//! - Extract parameter bindings from a concrete request path
//! - Expand a pattern back into a URI (reverse routing)
//!
//! # Pattern Syntax
//! - `{name}` / `:name` bind one path segment (no `/`)
//! - `{name: regex}` binds whatever `regex` matches; `:alpha:`, `:alnum:`,
//!   `:digit:`, `:xdigit:` and `:ascii:` shorthands are expanded
//! - a trailing `*` (not quantifying a regex atom) matches the rest of the path
//! - anything else is copied into the regex verbatim, so `/contact.*` or
//!   `/customers/\d+` behave as regular expressions
//!
//! # Design Decisions
//! - Each route owns its compiled regex; nothing is cached process-wide
//! - The pattern body is wrapped in `^(?:...)$`, so a top-level `|` cannot
//!   escape the anchors
//! - Paths are percent-decoded by the request before they reach a pattern
//! - Case-sensitive, trailing slash significant

use std::collections::{BTreeMap, HashMap};

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::{Regex, RegexBuilder};

use crate::routing::error::{RouteError, RouteResult};

/// Regex used for `{name}` and `:name` placeholders.
const DEFAULT_PARAMETER_REGEX: &str = "[^/]+";

/// Capture groups are named `p0`, `p1`, ... so that user supplied names never
/// have to be valid regex group names.
const PARAMETER_GROUP_PREFIX: &str = "p";

/// Upper bound on the compiled size of a single route regex.
const MAX_PATTERN_REGEX_SIZE: usize = 1 << 20;

/// Escaped in parameter values by [`CompiledPattern::expand`]. `/` is kept
/// so that values of multi-segment parameters stay paths.
const PATH_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Piece of a pattern kept for reverse routing.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternPart {
    Literal(String),
    Parameter(String),
    Wildcard,
}

/// A URI pattern compiled into a matcher.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    uri_pattern: String,
    regex: Regex,
    parameter_names: Vec<String>,
    parts: Vec<PatternPart>,
}

impl CompiledPattern {
    /// Compile a URI pattern.
    pub fn compile(uri_pattern: &str) -> RouteResult<Self> {
        if uri_pattern.trim().is_empty() {
            return Err(RouteError::EmptyUriPattern);
        }
        if !uri_pattern.starts_with('/') {
            return Err(RouteError::invalid_pattern(uri_pattern, "pattern must start with '/'"));
        }

        let mut builder = PatternBuilder::new(uri_pattern);
        let chars: Vec<char> = uri_pattern.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '{' => {
                    let end = closing_brace(&chars, i)
                        .ok_or_else(|| RouteError::invalid_pattern(uri_pattern, "unbalanced '{'"))?;
                    let body: String = chars[i + 1..end].iter().collect();
                    let (name, regex) = match body.split_once(':') {
                        Some((name, regex)) => (name.trim(), regex.trim()),
                        None => (body.trim(), ""),
                    };
                    let regex = if regex.is_empty() {
                        DEFAULT_PARAMETER_REGEX.to_string()
                    } else {
                        expand_posix_classes(regex)
                    };
                    builder.parameter(name, &regex)?;
                    i = end + 1;
                }
                '}' => {
                    return Err(RouteError::invalid_pattern(uri_pattern, "unbalanced '}'"));
                }
                ':' if chars[i - 1] == '/' && chars.get(i + 1).is_some_and(|n| is_parameter_start(*n)) => {
                    let start = i + 1;
                    let mut end = start;
                    while end < chars.len() && is_parameter_char(chars[end]) {
                        end += 1;
                    }
                    let name: String = chars[start..end].iter().collect();
                    builder.parameter(&name, DEFAULT_PARAMETER_REGEX)?;
                    i = end;
                }
                '*' if i == chars.len() - 1 && is_trailing_wildcard(&chars, i) => {
                    builder.wildcard();
                    i += 1;
                }
                '\\' => {
                    let escaped = chars
                        .get(i + 1)
                        .ok_or_else(|| RouteError::invalid_pattern(uri_pattern, "dangling '\\'"))?;
                    builder.literal('\\');
                    builder.literal(*escaped);
                    i += 2;
                }
                '^' | '$' => {
                    return Err(RouteError::invalid_pattern(
                        uri_pattern,
                        format!("'{}' is not allowed, patterns are always anchored", c),
                    ));
                }
                c if c.is_whitespace() => {
                    return Err(RouteError::invalid_pattern(uri_pattern, "whitespace outside a parameter"));
                }
                c => {
                    builder.literal(c);
                    i += 1;
                }
            }
        }

        builder.build()
    }

    /// The pattern as registered.
    pub fn uri_pattern(&self) -> &str {
        &self.uri_pattern
    }

    /// The anchored regex the pattern compiled to.
    pub fn regex(&self) -> &str {
        self.regex.as_str()
    }

    /// Declared parameter names in declaration order.
    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    /// Returns true if the whole path matches the pattern.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match a request path, returning one binding per declared parameter.
    ///
    /// `None` means no match, which is the common outcome.
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        if self.parameter_names.is_empty() {
            return self.regex.is_match(path).then(HashMap::new);
        }

        let captures = self.regex.captures(path)?;
        let bindings = self
            .parameter_names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let value = captures
                    .name(&group_name(index))
                    .map_or("", |m| m.as_str());
                (name.clone(), value.to_string())
            })
            .collect();

        Some(bindings)
    }

    /// Substitute parameter values into the pattern, percent-encoding them.
    ///
    /// Returns the name of the first declared parameter without a value on
    /// failure. Parameters that are not declared by the pattern are ignored
    /// here; the router turns them into a query string.
    pub(crate) fn expand(&self, parameters: &BTreeMap<String, String>) -> Result<String, String> {
        let mut uri = String::with_capacity(self.uri_pattern.len());
        for part in &self.parts {
            match part {
                PatternPart::Literal(text) => uri.push_str(text),
                PatternPart::Parameter(name) => {
                    let value = parameters.get(name).ok_or_else(|| name.clone())?;
                    uri.extend(utf8_percent_encode(value, PATH_VALUE));
                }
                PatternPart::Wildcard => {}
            }
        }
        Ok(uri)
    }
}

/// Accumulates regex source, parameter names and reverse-routing parts.
struct PatternBuilder<'a> {
    uri_pattern: &'a str,
    regex: String,
    parameter_names: Vec<String>,
    parts: Vec<PatternPart>,
    literal: String,
}

impl<'a> PatternBuilder<'a> {
    fn new(uri_pattern: &'a str) -> Self {
        Self {
            uri_pattern,
            regex: String::from("^(?:"),
            parameter_names: Vec::new(),
            parts: Vec::new(),
            literal: String::new(),
        }
    }

    fn literal(&mut self, c: char) {
        self.regex.push(c);
        self.literal.push(c);
    }

    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            self.parts.push(PatternPart::Literal(std::mem::take(&mut self.literal)));
        }
    }

    fn parameter(&mut self, name: &str, regex: &str) -> RouteResult<()> {
        if name.is_empty() || !name.chars().all(is_parameter_char) {
            return Err(RouteError::invalid_pattern(
                self.uri_pattern,
                format!("invalid parameter name '{}'", name),
            ));
        }
        if self.parameter_names.iter().any(|n| n == name) {
            return Err(RouteError::invalid_pattern(
                self.uri_pattern,
                format!("duplicate parameter name '{}'", name),
            ));
        }

        self.flush_literal();
        let group = group_name(self.parameter_names.len());
        self.regex.push_str(&format!("(?P<{}>{})", group, regex));
        self.parameter_names.push(name.to_string());
        self.parts.push(PatternPart::Parameter(name.to_string()));
        Ok(())
    }

    fn wildcard(&mut self) {
        self.flush_literal();
        self.regex.push_str(".*");
        self.parts.push(PatternPart::Wildcard);
    }

    fn build(mut self) -> RouteResult<CompiledPattern> {
        self.flush_literal();
        self.regex.push_str(")$");

        let regex = RegexBuilder::new(&self.regex)
            .size_limit(MAX_PATTERN_REGEX_SIZE)
            .build()
            .map_err(|e| RouteError::invalid_pattern(self.uri_pattern, e.to_string()))?;

        tracing::trace!(
            uri_pattern = %self.uri_pattern,
            regex = %regex.as_str(),
            parameters = ?self.parameter_names,
            "Compiled uri pattern"
        );

        Ok(CompiledPattern {
            uri_pattern: self.uri_pattern.to_string(),
            regex,
            parameter_names: self.parameter_names,
            parts: self.parts,
        })
    }
}

fn group_name(index: usize) -> String {
    format!("{}{}", PARAMETER_GROUP_PREFIX, index)
}

fn is_parameter_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Characters allowed in a parameter name, for both `{name}` and `:name`.
fn is_parameter_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Index of the `}` closing the `{` at `open`, honouring nesting and escapes.
fn closing_brace(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// A final `*` is a wildcard unless it quantifies the preceding regex atom.
fn is_trailing_wildcard(chars: &[char], star: usize) -> bool {
    let prev = chars[star - 1];
    if matches!(prev, '.' | ')' | ']' | '}' | '*' | '+' | '?') {
        return false;
    }
    !(star >= 2 && chars[star - 2] == '\\')
}

fn expand_posix_classes(regex: &str) -> String {
    regex
        .replace(":alnum:", "[0-9A-Za-z]")
        .replace(":alpha:", r"\p{L}")
        .replace(":ascii:", r"[\x00-\x7F]")
        .replace(":xdigit:", "[0-9A-Fa-f]")
        .replace(":digit:", "[0-9]")
}
