//! Normalized, read-only records and projected items.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use patent_client_api::RawRecord;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::casing::underscore;
use crate::error::PatentClientError;
use crate::manager::QueryManager;
use crate::model::ModelDescriptor;
use crate::registry::ModelRegistry;
use crate::relation::Related;
use crate::value::{coerce_field, FieldValue};

/// Canonical field name to value, in payload order.
pub type FieldMap = IndexMap<String, FieldValue>;

/// Renames every top-level key to snake_case and coerces date-like values.
/// Later keys win when two raw keys share a canonical name.
pub fn normalize(raw: RawRecord) -> FieldMap {
    raw.into_iter()
        .map(|(key, value)| {
            let key = underscore(&key);
            let value = coerce_field(&key, value);
            (key, value)
        })
        .collect()
}

/// One fetched item of a collection.
///
/// Stored fields are fixed at construction. Relations are not stored: each
/// call to [`Record::related`] queries the target collection again.
#[derive(Clone)]
pub struct Record {
    model: Arc<ModelDescriptor>,
    registry: Arc<ModelRegistry>,
    fields: FieldMap,
}

impl Record {
    pub fn new(model: Arc<ModelDescriptor>, registry: Arc<ModelRegistry>, raw: RawRecord) -> Self {
        Self {
            model,
            registry,
            fields: normalize(raw),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn model(&self) -> &ModelDescriptor {
        &self.model
    }

    pub(crate) fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Like [`Record::get`] but a missing field is a lookup error.
    pub fn field(&self, name: &str) -> Result<&FieldValue, PatentClientError> {
        self.fields.get(name).ok_or_else(|| {
            PatentClientError::Lookup(format!("{} has no field '{}'", self.model_name(), name))
        })
    }

    /// String value of a field; missing and non-string fields are lookup errors.
    pub fn str_field(&self, name: &str) -> Result<&str, PatentClientError> {
        self.field(name)?.as_str().ok_or_else(|| {
            PatentClientError::Lookup(format!(
                "{} field '{}' is not a string",
                self.model_name(),
                name
            ))
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Resolves a `__`-separated accessor path.
    ///
    /// The first segment names a stored field or a one-to-one relation; later
    /// segments step into maps by key and lists by index. Steps that lead
    /// nowhere yield `Null`.
    pub fn accessor(&self, path: &str) -> Result<FieldValue, PatentClientError> {
        let (head, rest) = match path.split_once("__") {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        if let Some(value) = self.fields.get(head) {
            let mut current = value;
            if let Some(rest) = rest {
                for segment in rest.split("__") {
                    match current.step(segment) {
                        Some(next) => current = next,
                        None => return Ok(FieldValue::Null),
                    }
                }
            }
            return Ok(current.clone());
        }

        if self.model.relation(head).is_some() {
            return match self.related(head)? {
                Related::One(record) => match rest {
                    Some(rest) => record.accessor(rest),
                    None => Ok(FieldValue::Map(record.fields)),
                },
                Related::Many(_) => Err(PatentClientError::InvalidInput(format!(
                    "cannot project one-to-many relation '{}'",
                    head
                ))),
            };
        }

        Ok(FieldValue::Null)
    }

    /// Reads a declared relation.
    pub fn related(&self, name: &str) -> Result<Related, PatentClientError> {
        let relation = self.model.relation(name).ok_or_else(|| {
            PatentClientError::Lookup(format!(
                "{} has no relation '{}'",
                self.model_name(),
                name
            ))
        })?;
        relation.resolve(self)
    }

    /// Reads a one-to-one relation.
    pub fn one(&self, name: &str) -> Result<Record, PatentClientError> {
        match self.related(name)? {
            Related::One(record) => Ok(record),
            Related::Many(_) => Err(PatentClientError::InvalidInput(format!(
                "relation '{}' is one-to-many",
                name
            ))),
        }
    }

    /// Reads a one-to-many relation.
    pub fn many(&self, name: &str) -> Result<QueryManager, PatentClientError> {
        match self.related(name)? {
            Related::Many(manager) => Ok(manager),
            Related::One(_) => Err(PatentClientError::InvalidInput(format!(
                "relation '{}' is one-to-one",
                name
            ))),
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.model.config.display_field {
            Some(field) => {
                let value = self.fields.get(field).cloned().unwrap_or(FieldValue::Null);
                write!(f, "<{}({}={})>", self.model_name(), field, value)
            }
            None => write!(f, "<{}>", self.model_name()),
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("model", &self.model_name())
            .field("fields", &self.fields)
            .finish()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// What indexing a manager yields: the record itself, or its projection when
/// `values` / `values_list` was requested.
#[derive(Clone, Debug)]
pub enum Item {
    Record(Record),
    Values(FieldMap),
    Tuple(Vec<FieldValue>),
    Scalar(FieldValue),
}

impl Item {
    pub fn into_record(self) -> Option<Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Record(record) => record.to_json(),
            Self::Values(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Tuple(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            Self::Scalar(value) => value.to_json(),
        }
    }
}

impl Serialize for Item {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
