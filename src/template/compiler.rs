//! Template compilation and rendering.
//!
//! # Data Flow
//! ```text
//! source
//!     → wrapper split (`beg <!-- body --> end`)
//!     → parser::tokenize (literals + placeholders)
//!     → property slots deduplicated by (path, format)
//!     → generator closure over the piece list
//! render(model, repository)
//!     → model coerced to a list, one body rendering per item
//!     → beg/end rendered once against the repository
//! ```
//!
//! # Design Decisions
//! - The generator is a closure over parsed pieces; nothing is evaluated from source text
//! - Escaping is decided per occurrence, so `{x}` and `{!x}` share one slot
//! - Missing values render as the empty string; the placeholder text is never echoed back

use std::fmt;

use serde_json::Value;

use crate::template::error::TemplateError;
use crate::template::escape::html_encode;
use crate::template::format::{value_to_string, Format};
use crate::template::parser::{tokenize, Token};

/// A positional slot: the property path and its optional format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyRef {
    pub path: String,
    pub format: Option<Format>,
}

enum Piece {
    Literal(String),
    Slot { index: usize, escape: bool },
}

type Generator = Box<dyn Fn(&[Value]) -> String + Send + Sync>;

struct Wrapper {
    beg: CompiledTemplate,
    end: CompiledTemplate,
}

/// A compiled template ready to render any number of models.
pub struct CompiledTemplate {
    literals: Vec<String>,
    properties: Vec<PropertyRef>,
    generator: Generator,
    wrapper: Option<Box<Wrapper>>,
}

impl CompiledTemplate {
    /// Number of positional values `generate` expects.
    pub fn arity(&self) -> usize {
        self.properties.len()
    }

    pub fn properties(&self) -> &[PropertyRef] {
        &self.properties
    }

    /// Literal text around placeholder occurrences, in source order.
    pub fn literals(&self) -> &[String] {
        &self.literals
    }

    pub fn has_wrapper(&self) -> bool {
        self.wrapper.is_some()
    }

    /// Run the generator over positional values, one per property slot.
    pub fn generate(&self, args: &[Value]) -> Result<String, TemplateError> {
        if args.len() != self.arity() {
            return Err(TemplateError::Arity {
                expected: self.arity(),
                actual: args.len(),
            });
        }
        Ok((self.generator)(args))
    }

    /// Positional values for one model item. Missing paths yield `null`.
    pub fn arguments(&self, item: &Value) -> Vec<Value> {
        self.properties
            .iter()
            .map(|p| lookup(item, &p.path).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Render the body once per model item, framed by the wrapper regions.
    pub fn render(&self, model: &Value, repository: Option<&Value>) -> String {
        let mut out = String::new();

        if let Some(wrapper) = &self.wrapper {
            out.push_str(&wrapper.beg.render_item(repository.unwrap_or(&Value::Null)));
        }

        match model {
            Value::Array(items) => {
                for item in items {
                    out.push_str(&self.render_item(item));
                }
            }
            item => out.push_str(&self.render_item(item)),
        }

        if let Some(wrapper) = &self.wrapper {
            out.push_str(&wrapper.end.render_item(repository.unwrap_or(&Value::Null)));
        }

        out
    }

    fn render_item(&self, item: &Value) -> String {
        (self.generator)(&self.arguments(item))
    }
}

impl fmt::Debug for CompiledTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledTemplate")
            .field("literals", &self.literals)
            .field("properties", &self.properties)
            .field("wrapped", &self.wrapper.is_some())
            .finish()
    }
}

/// Compile template source, splitting off an optional `<!-- body -->` wrapper.
pub fn compile(source: &str) -> Result<CompiledTemplate, TemplateError> {
    if let Some((beg, body, end)) = split_wrapper(source) {
        let mut template = compile_body(body)?;
        template.wrapper = Some(Box::new(Wrapper {
            beg: compile_body(beg)?,
            end: compile_body(end)?,
        }));
        return Ok(template);
    }
    compile_body(source)
}

fn split_wrapper(source: &str) -> Option<(&str, &str, &str)> {
    let open = source.find("<!--")?;
    let body_start = open + "<!--".len();
    let close = body_start + source[body_start..].find("-->")?;
    Some((
        &source[..open],
        &source[body_start..close],
        &source[close + "-->".len()..],
    ))
}

fn compile_body(source: &str) -> Result<CompiledTemplate, TemplateError> {
    let mut literals = vec![String::new()];
    let mut properties: Vec<PropertyRef> = Vec::new();
    let mut pieces = Vec::new();

    for token in tokenize(source)? {
        match token {
            Token::Literal(text) => {
                if let Some(last) = literals.last_mut() {
                    last.push_str(&text);
                }
                pieces.push(Piece::Literal(text));
            }
            Token::Placeholder(placeholder) => {
                let property = PropertyRef {
                    path: placeholder.path,
                    format: placeholder.format,
                };
                let index = match properties.iter().position(|p| *p == property) {
                    Some(index) => index,
                    None => {
                        properties.push(property);
                        properties.len() - 1
                    }
                };
                pieces.push(Piece::Slot {
                    index,
                    escape: placeholder.escape,
                });
                literals.push(String::new());
            }
        }
    }

    let formats: Vec<Option<Format>> = properties.iter().map(|p| p.format.clone()).collect();

    Ok(CompiledTemplate {
        literals,
        properties,
        generator: build_generator(pieces, formats),
        wrapper: None,
    })
}

fn build_generator(pieces: Vec<Piece>, formats: Vec<Option<Format>>) -> Generator {
    Box::new(move |args: &[Value]| {
        let mut out = String::new();
        for piece in &pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Slot { index, escape } => {
                    let value = args.get(*index).unwrap_or(&Value::Null);
                    let text = match formats.get(*index).and_then(Option::as_ref) {
                        Some(format) => format.apply(value),
                        None => value_to_string(value),
                    };
                    if *escape {
                        out.push_str(&html_encode(&text));
                    } else {
                        out.push_str(&text);
                    }
                }
            }
        }
        out
    })
}

/// Resolve a dotted path. Numeric segments index arrays; the empty path is the item.
pub fn lookup<'a>(item: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(item);
    }
    path.split('.').try_fold(item, |current, segment| {
        let segment = segment.trim();
        match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hello_escaped_and_raw() {
        let template = compile("Hello {name}!").unwrap();
        assert_eq!(template.render(&json!({"name": "Ann"}), None), "Hello Ann!");
        assert_eq!(template.render(&json!({"name": "<b>"}), None), "Hello &lt;b&gt;!");

        let raw = compile("{!name}").unwrap();
        assert_eq!(raw.render(&json!({"name": "<b>"}), None), "<b>");
    }

    #[test]
    fn test_dedup_by_path_and_format() {
        let template = compile("{a} {!a} {a|2} {b.c} {a}").unwrap();
        assert_eq!(template.arity(), 3);
        assert_eq!(template.properties()[0].path, "a");
        assert_eq!(template.properties()[1].format, Some(Format::Pattern("2".into())));
        assert_eq!(template.literals().len(), 6);
    }

    #[test]
    fn test_generate_checks_arity() {
        let template = compile("{x}-{y}").unwrap();
        assert_eq!(template.generate(&[json!(1), json!("b")]).unwrap(), "1-b");
        assert_eq!(
            template.generate(&[json!(1)]),
            Err(TemplateError::Arity { expected: 2, actual: 1 })
        );
    }

    #[test]
    fn test_array_model_and_missing_values() {
        let template = compile("<li>{name}{missing}</li>").unwrap();
        let html = template.render(&json!([{"name": "a"}, {"name": "b"}]), None);
        assert_eq!(html, "<li>a</li><li>b</li>");
        assert_eq!(template.render(&json!({}), None), "<li></li>");
    }

    #[test]
    fn test_wrapper_rendered_once() {
        let template = compile("<ul title=\"{title}\"><!--<li>{}</li>--></ul>").unwrap();
        assert!(template.has_wrapper());
        let html = template.render(&json!(["x", "y"]), Some(&json!({"title": "List"})));
        assert_eq!(html, "<ul title=\"List\"><li>x</li><li>y</li></ul>");

        let bare = template.render(&json!([]), None);
        assert_eq!(bare, "<ul title=\"\"></ul>");
    }

    #[test]
    fn test_helpers_in_templates() {
        let template =
            compile("{count|pluralize:# items,# item,# items} {admin|if:yes,no} {price|### ###.##}")
                .unwrap();
        let html = template.render(&json!({"count": 1, "admin": false, "price": 1234.5}), None);
        assert_eq!(html, "1 item no 1 234.50");
    }

    #[test]
    fn test_lookup_paths() {
        let model = json!({"user": {"tags": ["a", "b"]}});
        assert_eq!(lookup(&model, "user.tags.1"), Some(&json!("b")));
        assert_eq!(lookup(&model, "user.none"), None);
        assert_eq!(lookup(&model, ""), Some(&model));
    }

    #[test]
    fn test_compile_errors() {
        assert!(compile("{a..b}").is_err());
        assert!(compile("<!-- {x|if:only} -->").is_err());
    }
}
