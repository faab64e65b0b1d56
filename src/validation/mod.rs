//! Model validation against a user-supplied validator.
//!
//! # Responsibilities
//! - Run the validator over a list of property names
//! - Recurse into nested objects with the same property list
//! - Resolve `Invalid` outcomes to resource strings (`prefix + name`)
//!
//! # Design Decisions
//! - Every failing property is reported, validation never stops early
//! - A missing or null property is validated as the empty string

pub mod resources;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

pub use resources::{ResourceCatalog, DEFAULT_NAMESPACE};

/// What the validator decided for one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Not checked.
    Skip,
    Valid,
    /// Invalid; the message comes from the resource catalog.
    Invalid,
    /// Invalid with an explicit message.
    Message(String),
}

impl From<bool> for ValidationOutcome {
    fn from(valid: bool) -> Self {
        if valid {
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::Invalid
        }
    }
}

/// Validator callback: property name and value to outcome.
pub type Validator = Arc<dyn Fn(&str, &Value) -> ValidationOutcome + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub name: String,
    pub error: String,
}

/// Split `"name, email ,age"` into property names. Whitespace is ignored.
pub fn parse_properties(text: &str) -> Vec<String> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .split(',')
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Where `Invalid` outcomes look up their message.
#[derive(Debug, Clone, Copy)]
pub struct MessageSource<'a> {
    pub resources: &'a ResourceCatalog,
    pub namespace: Option<&'a str>,
    pub prefix: &'a str,
}

impl MessageSource<'_> {
    fn message(&self, name: &str) -> String {
        let key = format!("{}{}", self.prefix, name);
        self.resources
            .get(self.namespace.unwrap_or(DEFAULT_NAMESPACE), &key)
    }
}

/// Validate `properties` of `model`, returning every failure in order.
pub fn validate<F>(
    model: &Value,
    properties: &[String],
    validator: &F,
    messages: MessageSource<'_>,
) -> Vec<ValidationFailure>
where
    F: Fn(&str, &Value) -> ValidationOutcome + ?Sized,
{
    let empty = Value::String(String::new());
    let mut failures = Vec::new();

    for name in properties {
        let value = match model.get(name) {
            None | Some(Value::Null) => &empty,
            Some(value) => value,
        };

        if value.is_object() {
            failures.extend(validate(value, properties, validator, messages));
            continue;
        }

        match validator(name, value) {
            ValidationOutcome::Skip | ValidationOutcome::Valid => {}
            ValidationOutcome::Invalid => failures.push(ValidationFailure {
                name: name.clone(),
                error: messages.message(name),
            }),
            ValidationOutcome::Message(error) => failures.push(ValidationFailure {
                name: name.clone(),
                error,
            }),
        }
    }

    if !failures.is_empty() {
        tracing::debug!(failures = failures.len(), "Validation failed");
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> ResourceCatalog {
        let catalog = ResourceCatalog::new();
        catalog.set("default", "email", "Invalid e-mail.");
        catalog.set("forms", "user_name", "Name is required.");
        catalog
    }

    fn required(name: &str, value: &Value) -> ValidationOutcome {
        match name {
            "age" => ValidationOutcome::Skip,
            "code" => ValidationOutcome::Message("Code must be 4 digits.".into()),
            _ => (value.as_str() != Some("")).into(),
        }
    }

    #[test]
    fn test_parse_properties() {
        assert_eq!(parse_properties(" name, email ,\tage,"), vec!["name", "email", "age"]);
        assert!(parse_properties("  ").is_empty());
    }

    #[test]
    fn test_outcomes_and_default_namespace() {
        let resources = catalog();
        let messages = MessageSource { resources: &resources, namespace: None, prefix: "" };
        let model = json!({"name": "Ann", "email": null, "age": 3, "code": "x"});

        let failures = validate(&model, &parse_properties("name,email,age,code"), &required, messages);
        assert_eq!(
            failures,
            vec![
                ValidationFailure { name: "email".into(), error: "Invalid e-mail.".into() },
                ValidationFailure { name: "code".into(), error: "Code must be 4 digits.".into() },
            ]
        );
    }

    #[test]
    fn test_namespace_and_prefix() {
        let resources = catalog();
        let messages = MessageSource { resources: &resources, namespace: Some("forms"), prefix: "user_" };
        let failures = validate(&json!({}), &["name".to_string()], &required, messages);
        assert_eq!(failures[0].error, "Name is required.");
    }

    #[test]
    fn test_nested_objects_recurse() {
        let resources = catalog();
        let messages = MessageSource { resources: &resources, namespace: None, prefix: "" };
        let model = json!({"email": {"email": ""}});
        let failures = validate(&model, &["email".to_string()], &required, messages);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].name, "email");
    }
}
