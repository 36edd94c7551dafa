//! Resource records and relation-field normalization
//!
//! A relation field holds a nested record, a bare identifier, or a list of
//! either. Each field declares which shape it takes on the way out (request
//! bodies) and on the way in (decoded responses).

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One remote object instance
pub type Record = Map<String, Value>;

/// Shape a relation value is normalized to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationShape {
    /// Bare identifier (`3`)
    #[default]
    Id,
    /// Nested record carrying at least an id (`{"id": 3, ...}`)
    Nested,
}

/// Which way a record is travelling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Caller to service
    Outbound,
    /// Service to caller
    Inbound,
}

/// Relation field declaration
///
/// Declared in resource JSON either as a bare name (identifiers both ways)
/// or as `{"name": ..., "outbound": "nested", "inbound": "id"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RelationFieldDef")]
pub struct RelationField {
    pub name: String,
    pub outbound: RelationShape,
    pub inbound: RelationShape,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RelationFieldDef {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        outbound: RelationShape,
        #[serde(default)]
        inbound: RelationShape,
    },
}

impl From<RelationFieldDef> for RelationField {
    fn from(def: RelationFieldDef) -> Self {
        match def {
            RelationFieldDef::Name(name) => Self::new(&name),
            RelationFieldDef::Full {
                name,
                outbound,
                inbound,
            } => Self {
                name,
                outbound,
                inbound,
            },
        }
    }
}

impl RelationField {
    /// Relation sent and received as bare identifiers
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            outbound: RelationShape::Id,
            inbound: RelationShape::Id,
        }
    }

    pub fn with_shapes(name: &str, outbound: RelationShape, inbound: RelationShape) -> Self {
        Self {
            name: name.to_string(),
            outbound,
            inbound,
        }
    }

    pub fn shape(&self, direction: Direction) -> RelationShape {
        match direction {
            Direction::Outbound => self.outbound,
            Direction::Inbound => self.inbound,
        }
    }
}

/// Normalize one relation value to the requested shape
///
/// Nested records without an `id` cannot be collapsed and are left as they are.
pub fn normalize_relation(value: Value, shape: RelationShape) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| normalize_relation(item, shape))
                .collect(),
        ),
        Value::Object(map) => match shape {
            RelationShape::Id => match map.get("id") {
                Some(id) => id.clone(),
                None => Value::Object(map),
            },
            RelationShape::Nested => Value::Object(map),
        },
        scalar => match shape {
            RelationShape::Id => scalar,
            RelationShape::Nested => {
                let mut nested = Map::new();
                nested.insert("id".to_string(), scalar);
                Value::Object(nested)
            }
        },
    }
}

/// Normalize every declared relation field of a record
pub fn normalize_record(mut record: Record, fields: &[RelationField], direction: Direction) -> Record {
    for field in fields {
        if let Some(value) = record.get_mut(&field.name) {
            *value = normalize_relation(value.take(), field.shape(direction));
        }
    }
    record
}

/// Identifier of a record as a path-ready string
pub fn record_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reject a blank identifier before it reaches a URL or payload
pub fn require_id<'a>(id: &'a str, what: &str) -> Result<&'a str, ClientError> {
    if id.trim().is_empty() {
        Err(ClientError::InvalidRequest(format!("{} needs a non-empty id", what)))
    } else {
        Ok(id)
    }
}
