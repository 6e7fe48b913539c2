//! Entry point wiring settings, HTTP clients, caches and the model registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use patent_client_api::{EdisClient, PtabClient};

use crate::cache::PageCache;
use crate::config::Settings;
use crate::download::{download_itc_attachment, download_ptab_document};
use crate::error::PatentClientError;
use crate::manager::QueryManager;
use crate::record::Record;
use crate::registry::ModelRegistry;
use crate::{itc, ptab};

/// A registry of every PTAB and EDIS model, backed by live clients.
///
/// ```no_run
/// use patent_client_lib::{PatentClient, Settings};
///
/// let client = PatentClient::new(Settings::load()?)?;
/// let trial = client.objects("PtabTrial")?.get_pk("IPR2016-00831")?;
/// for doc in trial.many("documents")?.all() {
///     println!("{}", doc?);
/// }
/// # Ok::<(), patent_client_lib::PatentClientError>(())
/// ```
pub struct PatentClient {
    settings: Settings,
    registry: Arc<ModelRegistry>,
    ptab: Arc<PtabClient>,
    edis: Arc<EdisClient>,
}

impl PatentClient {
    pub fn new(settings: Settings) -> Result<Self, PatentClientError> {
        let ptab = Arc::new(PtabClient::with_base_url(&settings.ptab.base_url)?);
        let edis = Arc::new(EdisClient::with_base_url(
            &settings.itc_edis.base_url,
            settings.edis_credentials(),
        )?);
        let ptab_cache = Arc::new(PageCache::new(settings.cache_dir.join("ptab"))?);
        let edis_cache = Arc::new(PageCache::new(settings.cache_dir.join("itc_edis"))?);

        let mut registry = ModelRegistry::new();
        ptab::register(&mut registry, Arc::clone(&ptab), ptab_cache)?;
        itc::register(&mut registry, Arc::clone(&edis), edis_cache)?;
        tracing::debug!("Cache directory: {}", settings.cache_dir.display());

        Ok(Self {
            settings,
            registry: Arc::new(registry),
            ptab,
            edis,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// An unfiltered manager over `PtabTrial`, `itc_edis.ItcDocument`, etc.
    pub fn objects(&self, model: &str) -> Result<QueryManager, PatentClientError> {
        self.registry.objects(model)
    }

    /// Downloads the file behind a `PtabDocument` or `ItcAttachment` record
    /// into `dest_dir`, returning the written path.
    pub fn download(&self, record: &Record, dest_dir: &Path) -> Result<PathBuf, PatentClientError> {
        let cache_dir = &self.settings.cache_dir;
        match record.model_name() {
            "PtabDocument" => download_ptab_document(&self.ptab, cache_dir, record, dest_dir),
            "ItcAttachment" => {
                if !self.edis.has_credentials() {
                    return Err(PatentClientError::Config(
                        "EDIS credentials are not configured (set EDIS_USER and EDIS_PASS)"
                            .to_string(),
                    ));
                }
                download_itc_attachment(&self.edis, cache_dir, record, dest_dir)
            }
            other => Err(PatentClientError::NotImplemented(format!(
                "{} records have no downloadable file",
                other
            ))),
        }
    }
}
