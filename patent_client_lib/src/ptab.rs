//! PTAB trials and documents.

use std::sync::Arc;

use patent_client_api::{PtabClient, PtabPage, RawRecord, RequestParams};

use crate::cache::PageCache;
use crate::error::PatentClientError;
use crate::manager::{Fetcher, PageRequest};
use crate::model::{CollectionConfig, ModelDescriptor};
use crate::registry::ModelRegistry;
use crate::relation::{one_to_many, one_to_one};

pub const MODULE: &str = "ptab";
pub const PAGE_SIZE: usize = 25;

/// Offset-paginated PTAB endpoint behind the page cache.
pub struct PtabFetcher {
    client: Arc<PtabClient>,
    cache: Arc<PageCache>,
    endpoint: String,
    namespace: String,
}

impl PtabFetcher {
    pub fn new(client: Arc<PtabClient>, cache: Arc<PageCache>, endpoint: &str) -> Self {
        Self {
            client,
            cache,
            endpoint: endpoint.to_string(),
            namespace: format!("ptab{}", endpoint.replace('/', "-")),
        }
    }

    fn page_at(
        &self,
        params: &RequestParams,
        offset: usize,
    ) -> Result<PtabPage, PatentClientError> {
        let params = params.clone().with("offset", offset);
        let key = PageCache::key(&self.namespace, &params);
        let raw = self.cache.get_or_fetch(&key, || {
            tracing::debug!("Fetching {} at offset {}", self.endpoint, offset);
            Ok(self.client.get(&self.endpoint, &params)?)
        })?;
        Ok(PtabPage::from_value(raw)?)
    }
}

impl Fetcher for PtabFetcher {
    fn fetch_page(
        &self,
        params: &RequestParams,
        page: PageRequest,
    ) -> Result<Vec<RawRecord>, PatentClientError> {
        Ok(self.page_at(params, page.offset)?.results)
    }

    // Shares the cache entry of the first page.
    fn fetch_count(&self, params: &RequestParams) -> Result<usize, PatentClientError> {
        let count = self.page_at(params, 0)?.metadata.count;
        usize::try_from(count)
            .map_err(|_| PatentClientError::InvalidInput(format!("count {} out of range", count)))
    }
}

/// Registers `PtabTrial` and `PtabDocument`.
pub fn register(
    registry: &mut ModelRegistry,
    client: Arc<PtabClient>,
    cache: Arc<PageCache>,
) -> Result<(), PatentClientError> {
    let trials = ModelDescriptor::new(
        CollectionConfig::new(MODULE, "PtabTrial", "/trials")
            .with_primary_key("trial_number")
            .with_page_size(PAGE_SIZE)
            .with_display_field("trial_number"),
        Arc::new(PtabFetcher::new(Arc::clone(&client), Arc::clone(&cache), "/trials")),
    )
    .with_relation(one_to_many(
        "documents",
        "ptab.PtabDocument",
        &[("trial_number", "trial_number")],
    ))
    .with_relation(one_to_one(
        "us_application",
        "uspto.USApplication",
        &[("appl_id", "application_number")],
    ));

    let documents = ModelDescriptor::new(
        CollectionConfig::new(MODULE, "PtabDocument", "/documents")
            .with_primary_key("id")
            .with_page_size(PAGE_SIZE)
            .with_display_field("title"),
        Arc::new(PtabFetcher::new(client, cache, "/documents")),
    )
    .with_relation(one_to_one(
        "trial",
        "ptab.PtabTrial",
        &[("trial_number", "trial_number")],
    ));

    registry.register(trials)?;
    registry.register(documents)?;
    Ok(())
}
