//! Process-wide lookup of models by name, used to resolve relation targets late.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use patent_client_api::RawRecord;

use crate::error::PatentClientError;
use crate::manager::QueryManager;
use crate::model::ModelDescriptor;
use crate::record::Record;

/// Registry of model descriptors, populated once at start-up.
///
/// Relations name their target as `module.Name` (or just `Name`) and are
/// resolved here on access, so two models may refer to each other freely.
#[derive(Default)]
pub struct ModelRegistry {
    models: IndexMap<String, Arc<ModelDescriptor>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a model. Names must be unique across modules.
    pub fn register(&mut self, descriptor: ModelDescriptor) -> Result<(), PatentClientError> {
        let name = descriptor.name().to_string();
        if self.models.contains_key(&name) {
            return Err(PatentClientError::InvalidInput(format!(
                "model '{}' is already registered",
                name
            )));
        }
        tracing::debug!("Registered model {}", descriptor.config.identifier());
        self.models.insert(name, Arc::new(descriptor));
        Ok(())
    }

    /// Resolves `module.Name` or `Name` to a registered model.
    pub fn descriptor(&self, identifier: &str) -> Result<Arc<ModelDescriptor>, PatentClientError> {
        let (module, name) = match identifier.rsplit_once('.') {
            Some((module, name)) => (Some(module), name),
            None => (None, identifier),
        };
        let model = self.models.get(name).ok_or_else(|| {
            PatentClientError::Lookup(format!("model '{}' is not registered", identifier))
        })?;
        if let Some(module) = module {
            if module != model.config.module {
                return Err(PatentClientError::Lookup(format!(
                    "model '{}' is not registered in module '{}'",
                    name, module
                )));
            }
        }
        Ok(Arc::clone(model))
    }

    /// An unfiltered manager over the named model's collection.
    pub fn objects(self: &Arc<Self>, identifier: &str) -> Result<QueryManager, PatentClientError> {
        let model = self.descriptor(identifier)?;
        Ok(QueryManager::new(Arc::clone(self), model))
    }

    /// Builds a record of the named model from a raw payload.
    pub fn build_record(
        self: &Arc<Self>,
        identifier: &str,
        raw: RawRecord,
    ) -> Result<Record, PatentClientError> {
        let model = self.descriptor(identifier)?;
        Ok(Record::new(model, Arc::clone(self), raw))
    }

    pub fn models(&self) -> impl Iterator<Item = &Arc<ModelDescriptor>> {
        self.models.values()
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.models.keys()).finish()
    }
}
