//! Placeholder tokenizer.
//!
//! Splits template source into literal text and `{...}` placeholders.
//! A placeholder is `{path}`, `{path|format}` or `{!path}` (no HTML escaping);
//! an empty path refers to the whole model item.

use std::sync::LazyLock;

use regex::Regex;

use crate::template::error::TemplateError;
use crate::template::format::Format;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}\n]*\}").expect("placeholder pattern is valid"));

/// One parsed `{...}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Source text including braces.
    pub raw: String,
    /// Dotted property path, empty for the item itself.
    pub path: String,
    pub format: Option<Format>,
    /// False when the placeholder starts with `!`.
    pub escape: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Placeholder(Placeholder),
}

/// Tokenize `source`. Adjacent literal text is kept as a single token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    for found in PLACEHOLDER.find_iter(source) {
        if found.start() > cursor {
            tokens.push(Token::Literal(source[cursor..found.start()].to_string()));
        }
        tokens.push(Token::Placeholder(parse_placeholder(found.as_str())?));
        cursor = found.end();
    }

    if cursor < source.len() {
        tokens.push(Token::Literal(source[cursor..].to_string()));
    }

    Ok(tokens)
}

fn parse_placeholder(raw: &str) -> Result<Placeholder, TemplateError> {
    let inner = raw[1..raw.len() - 1].trim();
    let (escape, inner) = match inner.strip_prefix('!') {
        Some(rest) => (false, rest),
        None => (true, inner),
    };

    let (path, format_text) = inner.split_once('|').unwrap_or((inner, ""));
    let path = path.trim();

    if !path.is_empty() && path.split('.').any(|segment| segment.trim().is_empty()) {
        return Err(TemplateError::EmptyPathSegment(raw.to_string()));
    }

    Ok(Placeholder {
        raw: raw.to_string(),
        path: path.to_string(),
        format: Format::parse(raw, format_text)?,
        escape,
    })
}
