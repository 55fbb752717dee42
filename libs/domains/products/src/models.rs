use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};

/// Number of products returned per list page
pub const PAGE_SIZE: usize = 25;

/// Product entity - a schemaless document with two server-managed fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "0190b2d4a1c77f3e9a3f1c2b5d6e7f80",
    "lastModified": "2018-01-02T03:04:05.000Z",
    "name": "Apple"
}))]
pub struct Product {
    /// Unique identifier, assigned at creation and never changed
    pub id: String,
    /// Version token, refreshed on every successful write
    #[serde(rename = "lastModified")]
    pub last_modified: String,
    /// User supplied attributes (name, price, ...)
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub attributes: Map<String, Value>,
}

impl Product {
    /// Build a new product from a validated candidate document.
    ///
    /// Any caller supplied `id` or `lastModified` is discarded.
    pub fn from_candidate(id: String, candidate: Value) -> Self {
        let mut attributes = match candidate {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        attributes.remove(ID_FIELD);
        attributes.remove(LAST_MODIFIED_FIELD);

        Self {
            id,
            last_modified: format_timestamp(Utc::now()),
            attributes,
        }
    }

    /// Rebuild a product from a patched JSON document.
    ///
    /// The id always comes from the route and the version token is left for the
    /// caller to refresh, so neither can be forged through the document.
    pub fn from_document(id: &str, last_modified: &str, document: Value) -> Self {
        let mut product = Self::from_candidate(id.to_string(), document);
        product.last_modified = last_modified.to_string();
        product
    }

    /// JSON view of the product, as returned to clients
    pub fn to_document(&self) -> Value {
        let mut map = self.attributes.clone();
        map.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        map.insert(
            LAST_MODIFIED_FIELD.to_string(),
            Value::String(self.last_modified.clone()),
        );
        Value::Object(map)
    }

    /// Advance the version token.
    ///
    /// The new value is the current time, bumped by one millisecond when the clock
    /// has not moved past the previous token.
    pub fn touch(&mut self) {
        self.last_modified = next_version(&self.last_modified, Utc::now());
    }
}

/// Attribute name of the identifier
pub const ID_FIELD: &str = "id";

/// Attribute name of the version token
pub const LAST_MODIFIED_FIELD: &str = "lastModified";

/// Format a timestamp the way version tokens are stored (`2018-01-02T03:04:05.000Z`)
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Compute the version token that follows `previous` given the current time
pub fn next_version(previous: &str, now: DateTime<Utc>) -> String {
    match DateTime::parse_from_rfc3339(previous) {
        Ok(prev) => {
            let prev = prev.with_timezone(&Utc);
            // Token precision is milliseconds
            let floor = prev + Duration::milliseconds(1);
            if now < floor {
                format_timestamp(floor)
            } else {
                format_timestamp(now)
            }
        }
        Err(_) => {
            let next = format_timestamp(now);
            if next == previous {
                format_timestamp(now + Duration::milliseconds(1))
            } else {
                next
            }
        }
    }
}

/// One page of a scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    pub items: Vec<Product>,
    /// Id of the last returned item when more items remain
    pub next_key: Option<String>,
}

/// Precondition attached to a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCondition {
    /// The stored `lastModified` must still equal this value
    LastModifiedEquals(String),
}

/// Query parameters for listing products
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Continuation key returned in the previous page's `link` header
    #[serde(rename = "_lek")]
    pub lek: Option<String>,
}
