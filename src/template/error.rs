//! Template error definitions.

use thiserror::Error;

/// Errors raised while compiling or evaluating a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A dotted property path has an empty segment, e.g. `{user..name}`.
    #[error("empty path segment in placeholder '{0}'")]
    EmptyPathSegment(String),

    /// A helper format has the wrong number of comma-separated forms.
    #[error("malformed {helper} helper in placeholder '{placeholder}': expected {expected} forms, found {found}")]
    MalformedHelper {
        placeholder: String,
        helper: &'static str,
        expected: usize,
        found: usize,
    },

    /// The generator was called with the wrong number of positional values.
    #[error("template expects {expected} positional values, got {actual}")]
    Arity { expected: usize, actual: usize },

    /// No template source is registered under this name.
    #[error("template '{0}' is not registered")]
    NotRegistered(String),
}
