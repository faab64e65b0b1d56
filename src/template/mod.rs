//! Template engine.
//!
//! # Responsibilities
//! - Tokenize `{...}` placeholders with optional `|format` and `!` prefix
//! - Compile templates into reusable generators with positional slots
//! - Render JSON models, including lists and wrapper regions
//! - Format numbers, dates, plurals and conditions
//!
//! # Design Decisions
//! - Templates are trusted input; values are HTML-escaped unless `!` is given
//! - Compiled templates are immutable and shared through `Arc`

pub mod compiler;
pub mod error;
pub mod escape;
pub mod format;
pub mod parser;

pub use compiler::{compile, CompiledTemplate, PropertyRef};
pub use error::TemplateError;
pub use escape::html_encode;
pub use format::Format;
