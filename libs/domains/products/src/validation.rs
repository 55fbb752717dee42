//! Product validation rules.
//!
//! Validation is injected into [`ProductService`](crate::service::ProductService)
//! through the [`ProductValidator`] trait. Only the pass/fail contract matters to
//! the service: a failure carries a JSON map from field pointer to message that
//! is returned to the client as-is.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use validator::Validate;

/// Field errors keyed by JSON pointer, e.g. `{"/name": "name is required"}`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationFailure(pub Map<String, Value>);

impl ValidationFailure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field, keeping the first one reported
    pub fn add(&mut self, pointer: impl Into<String>, message: impl Into<String>) {
        self.0
            .entry(pointer.into())
            .or_insert_with(|| Value::String(message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// Decides whether a product document may be stored
#[cfg_attr(test, mockall::automock)]
pub trait ProductValidator: Send + Sync {
    fn validate(&self, product: &Value) -> Result<(), ValidationFailure>;
}

/// Known product fields and their constraints. Unknown fields are accepted.
#[derive(Debug, Default, Deserialize, Validate)]
struct ProductRules {
    #[validate(
        required(message = "name is required"),
        length(min = 1, max = 200, message = "name must be between 1 and 200 characters")
    )]
    name: Option<String>,

    #[validate(length(max = 2000, message = "description must be at most 2000 characters"))]
    description: Option<String>,

    #[validate(range(min = 0.0, message = "price must not be negative"))]
    price: Option<f64>,

    #[allow(dead_code)]
    tags: Option<Vec<String>>,
}

/// JSON type each known field must have when present
const FIELD_TYPES: &[(&str, JsonType)] = &[
    ("name", JsonType::String),
    ("description", JsonType::String),
    ("price", JsonType::Number),
    ("tags", JsonType::StringArray),
];

#[derive(Debug, Clone, Copy)]
enum JsonType {
    String,
    Number,
    StringArray,
}

impl JsonType {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::StringArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Number => "a number",
            Self::StringArray => "an array of strings",
        }
    }
}

/// Document key the store uses for its own primary key
const STORE_KEY_FIELD: &str = "_id";

/// Escape a key for use as a JSON pointer segment
fn escape_pointer_segment(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Report keys the document store reserves: the top-level `_id` and any key
/// starting with `$`, at any depth
fn check_reserved_names(fields: &Map<String, Value>, failure: &mut ValidationFailure) {
    if fields.contains_key(STORE_KEY_FIELD) {
        failure.add(
            format!("/{STORE_KEY_FIELD}"),
            format!("{STORE_KEY_FIELD} is a reserved field name"),
        );
    }
    check_operator_keys(fields, "", failure);
}

fn check_operator_keys(
    fields: &Map<String, Value>,
    prefix: &str,
    failure: &mut ValidationFailure,
) {
    for (key, value) in fields {
        let pointer = format!("{prefix}/{}", escape_pointer_segment(key));
        if key.starts_with('$') {
            failure.add(pointer.clone(), "field names must not start with '$'");
        }
        check_nested_keys(value, &pointer, failure);
    }
}

fn check_nested_keys(value: &Value, pointer: &str, failure: &mut ValidationFailure) {
    match value {
        Value::Object(fields) => check_operator_keys(fields, pointer, failure),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                check_nested_keys(item, &format!("{pointer}/{index}"), failure);
            }
        }
        _ => {}
    }
}

/// Default rule set backed by the `validator` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProductValidator;

impl ProductValidator for DefaultProductValidator {
    fn validate(&self, product: &Value) -> Result<(), ValidationFailure> {
        let mut failure = ValidationFailure::new();

        let Some(fields) = product.as_object() else {
            failure.add("/", "product must be a JSON object");
            return Err(failure);
        };

        check_reserved_names(fields, &mut failure);

        // Type mismatches are reported per field before the rules run
        for (field, expected) in FIELD_TYPES {
            if let Some(value) = fields.get(*field) {
                if !value.is_null() && !expected.matches(value) {
                    failure.add(
                        format!("/{field}"),
                        format!("{field} must be {}", expected.describe()),
                    );
                }
            }
        }
        if !failure.is_empty() {
            return Err(failure);
        }

        let rules: ProductRules = serde_json::from_value(product.clone()).map_err(|e| {
            let mut failure = ValidationFailure::new();
            failure.add("/", e.to_string());
            failure
        })?;

        if let Err(errors) = rules.validate() {
            for (field, field_errors) in errors.field_errors() {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    failure.add(format!("/{field}"), message);
                }
            }
            return Err(failure);
        }

        Ok(())
    }
}
