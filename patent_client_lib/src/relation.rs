//! Declarative cross-collection relations, resolved when read.

use serde_json::Value;

use crate::error::PatentClientError;
use crate::manager::QueryManager;
use crate::record::Record;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationKind {
    OneToOne,
    OneToMany,
}

/// A relation declared on a model.
///
/// `mapping` pairs a filter key on the target model with a field of the
/// owning record. The target is only looked up when the relation is read.
#[derive(Clone, Debug)]
pub struct Relation {
    name: String,
    kind: RelationKind,
    target: String,
    mapping: Vec<(String, String)>,
}

/// The result of reading a relation.
#[derive(Debug)]
pub enum Related {
    One(Record),
    Many(QueryManager),
}

/// Declares a relation that resolves to exactly one record of `target`.
pub fn one_to_one(name: &str, target: &str, mapping: &[(&str, &str)]) -> Relation {
    Relation::new(name, RelationKind::OneToOne, target, mapping)
}

/// Declares a relation that resolves to a manager over `target`.
pub fn one_to_many(name: &str, target: &str, mapping: &[(&str, &str)]) -> Relation {
    Relation::new(name, RelationKind::OneToMany, target, mapping)
}

impl Relation {
    fn new(name: &str, kind: RelationKind, target: &str, mapping: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            kind,
            target: target.to_string(),
            mapping: mapping
                .iter()
                .map(|(remote, local)| (remote.to_string(), local.to_string()))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Filters for the target collection, taken from `owner`'s current values.
    pub fn filters_for(&self, owner: &Record) -> Result<Vec<(String, Value)>, PatentClientError> {
        self.mapping
            .iter()
            .map(|(remote, local)| {
                let value = owner.get(local).ok_or_else(|| {
                    PatentClientError::Lookup(format!(
                        "{} has no field '{}' for relation '{}'",
                        owner.model_name(),
                        local,
                        self.name
                    ))
                })?;
                Ok((remote.clone(), value.to_json()))
            })
            .collect()
    }

    /// Runs the relation's query. Every call issues a fresh query.
    pub fn resolve(&self, owner: &Record) -> Result<Related, PatentClientError> {
        let objects = owner.registry().objects(&self.target)?;
        let filters = self.filters_for(owner)?;
        tracing::debug!(
            "Resolving {}.{} -> {} with {:?}",
            owner.model_name(),
            self.name,
            self.target,
            filters
        );
        match self.kind {
            RelationKind::OneToOne => Ok(Related::One(objects.get(filters)?)),
            RelationKind::OneToMany => Ok(Related::Many(objects.filter(filters))),
        }
    }
}
