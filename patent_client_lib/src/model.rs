//! Per-collection configuration and the descriptors held by the registry.

use std::fmt;
use std::sync::Arc;

use crate::casing::camelize;
use crate::error::PatentClientError;
use crate::manager::Fetcher;
use crate::relation::Relation;

/// Static description of one remote collection.
#[derive(Clone, Debug)]
pub struct CollectionConfig {
    /// Module the model is registered under (`ptab`, `itc_edis`).
    pub module: String,
    /// Model name (`PtabTrial`).
    pub name: String,
    /// Remote endpoint path, informational for fetchers and logs.
    pub endpoint: String,
    /// Field targeted by positional primary-key lookups.
    pub primary_key: Option<String>,
    /// Items per remote page.
    pub page_size: usize,
    /// Canonical filter name to remote parameter name. When set, filters
    /// outside the map are rejected; when unset, names are camelized.
    pub field_map: Option<Vec<(String, String)>>,
    /// Field shown in a record's display form.
    pub display_field: Option<String>,
}

impl CollectionConfig {
    pub fn new(module: &str, name: &str, endpoint: &str) -> Self {
        Self {
            module: module.to_string(),
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            primary_key: None,
            page_size: 25,
            field_map: None,
            display_field: None,
        }
    }

    pub fn with_primary_key(mut self, key: &str) -> Self {
        self.primary_key = Some(key.to_string());
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_field_map(mut self, map: &[(&str, &str)]) -> Self {
        self.field_map = Some(
            map.iter()
                .map(|(local, remote)| (local.to_string(), remote.to_string()))
                .collect(),
        );
        self
    }

    pub fn with_display_field(mut self, field: &str) -> Self {
        self.display_field = Some(field.to_string());
        self
    }

    /// `module.Name`, the identifier relations use to refer to this model.
    pub fn identifier(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }

    /// Remote parameter name for a canonical filter name.
    pub fn remote_key(&self, key: &str) -> Result<String, PatentClientError> {
        match &self.field_map {
            Some(map) => map
                .iter()
                .find(|(local, _)| local == key)
                .map(|(_, remote)| remote.clone())
                .ok_or_else(|| {
                    PatentClientError::InvalidInput(format!(
                        "{} does not support filtering on '{}'",
                        self.name, key
                    ))
                }),
            None => Ok(camelize(key)),
        }
    }
}

/// A registered model: its collection, the fetch hook that serves it, and
/// its declared relations.
pub struct ModelDescriptor {
    pub config: CollectionConfig,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    relations: Vec<Relation>,
}

impl ModelDescriptor {
    pub fn new(config: CollectionConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config,
            fetcher,
            relations: Vec::new(),
        }
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name() == name)
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }
}

impl fmt::Debug for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("config", &self.config)
            .field("relations", &self.relations)
            .finish_non_exhaustive()
    }
}
