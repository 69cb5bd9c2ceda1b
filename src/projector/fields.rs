use crate::driver::{HttpRequest, HttpResponse, ResponseHead};
use serde::Serialize;
use serde_json::{Map, Value};

/// Fields copied from a response
pub const RESPONSE_FIELDS: &[&str] = &["ok", "url", "status", "headers"];

/// Fields copied from a request
pub const REQUEST_FIELDS: &[&str] = &["headers"];

/// Named read access to an object's fields
pub trait Accessors {
    /// Value of `field`, or None if the object has no such accessor
    fn access(&self, field: &str) -> Option<Value>;
}

/// Field name -> value record produced by [`project`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Projection(Map<String, Value>);

impl Projection {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Convenience accessor for the `status` field of a response projection
    pub fn status(&self) -> Option<u16> {
        self.get("status")
            .and_then(Value::as_u64)
            .and_then(|status| u16::try_from(status).ok())
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Copies the listed accessors of `source` into a projection
///
/// A missing source projects to an empty record. Field names the source
/// does not know are skipped.
pub fn project<A: Accessors + ?Sized>(source: Option<&A>, fields: &[&str]) -> Projection {
    let Some(source) = source else {
        return Projection::default();
    };

    let mut projected = Map::new();
    for field in fields {
        match source.access(field) {
            Some(value) => {
                projected.insert((*field).to_string(), value);
            }
            None => tracing::trace!("No accessor named '{}', skipping", field),
        }
    }
    Projection(projected)
}

/// Projects a response onto [`RESPONSE_FIELDS`]
pub fn project_response<A: Accessors + ?Sized>(response: Option<&A>) -> Projection {
    project(response, RESPONSE_FIELDS)
}

/// Projects a request onto [`REQUEST_FIELDS`]
pub fn project_request<A: Accessors + ?Sized>(request: Option<&A>) -> Projection {
    project(request, REQUEST_FIELDS)
}

fn headers_value(headers: &crate::driver::HeaderMap) -> Value {
    Value::Object(
        headers
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect(),
    )
}

impl Accessors for ResponseHead {
    fn access(&self, field: &str) -> Option<Value> {
        match field {
            "ok" => Some(Value::Bool(self.ok())),
            "url" => Some(Value::String(self.url.clone())),
            "status" => Some(Value::from(self.status)),
            "headers" => Some(headers_value(&self.headers)),
            _ => None,
        }
    }
}

impl Accessors for HttpResponse {
    fn access(&self, field: &str) -> Option<Value> {
        self.head.access(field)
    }
}

impl Accessors for HttpRequest {
    fn access(&self, field: &str) -> Option<Value> {
        match field {
            "url" => Some(Value::String(self.url.clone())),
            "method" => Some(Value::String(self.method.clone())),
            "headers" => Some(headers_value(&self.headers)),
            "resourceType" => serde_json::to_value(self.resource_type).ok(),
            _ => None,
        }
    }
}
