//! USITC EDIS investigations, documents and attachments.
//!
//! EDIS has no investigation search and no counts. Investigations are looked
//! up by number, document counts are found by walking pages, and attachment
//! lists arrive whole.

use std::sync::Arc;

use patent_client_api::edis::DOCUMENT_PAGE_SIZE;
use patent_client_api::{EdisClient, RawRecord, RequestParams};
use serde_json::Value;

use crate::cache::PageCache;
use crate::error::PatentClientError;
use crate::manager::{Fetcher, PageRequest};
use crate::model::{CollectionConfig, ModelDescriptor};
use crate::registry::ModelRegistry;
use crate::relation::{one_to_many, one_to_one};

pub const MODULE: &str = "itc_edis";

const DOCUMENT_FILTERS: &[(&str, &str)] = &[
    ("investigation_number", "investigationNumber"),
    ("phase", "investigationPhase"),
    ("type", "documentType"),
    ("firm", "firmOrg"),
    ("security", "securityLevel"),
    ("id", "id"),
];

fn ensure_credentials(client: &EdisClient) -> Result<(), PatentClientError> {
    if client.has_credentials() {
        Ok(())
    } else {
        Err(PatentClientError::Config(
            "EDIS credentials are not configured (set EDIS_USER and EDIS_PASS)".to_string(),
        ))
    }
}

fn required(params: &RequestParams, key: &str, what: &str) -> Result<String, PatentClientError> {
    params.get_str(key).ok_or_else(|| PatentClientError::InvalidInput(what.to_string()))
}

/// Caches a list of rows under `key`, fetching on a miss.
fn cached_rows<F>(
    cache: &PageCache,
    key: &str,
    fetch: F,
) -> Result<Vec<RawRecord>, PatentClientError>
where
    F: FnOnce() -> Result<Vec<RawRecord>, PatentClientError>,
{
    let value = cache.get_or_fetch(key, || {
        Ok(Value::Array(fetch()?.into_iter().map(Value::Object).collect()))
    })?;
    match value {
        Value::Array(rows) => Ok(rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()),
        _ => Err(PatentClientError::Cache(format!(
            "cache entry {} is not a list of records",
            key
        ))),
    }
}

/// One investigation per number.
pub struct InvestigationFetcher {
    client: Arc<EdisClient>,
    cache: Arc<PageCache>,
}

impl InvestigationFetcher {
    pub fn new(client: Arc<EdisClient>, cache: Arc<PageCache>) -> Self {
        Self { client, cache }
    }

    fn lookup(&self, params: &RequestParams) -> Result<Vec<RawRecord>, PatentClientError> {
        let number = params.get_str("investigationNumber").ok_or_else(|| {
            PatentClientError::NotImplemented(
                "EDIS has no investigation search; filter by investigation_number".to_string(),
            )
        })?;
        let key = PageCache::key("itc-investigation", params);
        cached_rows(&self.cache, &key, || {
            ensure_credentials(&self.client)?;
            Ok(self.client.investigation(&number)?.into_iter().collect())
        })
    }
}

impl Fetcher for InvestigationFetcher {
    fn fetch_page(
        &self,
        params: &RequestParams,
        page: PageRequest,
    ) -> Result<Vec<RawRecord>, PatentClientError> {
        if page.number > 0 {
            return Ok(Vec::new());
        }
        self.lookup(params)
    }

    fn fetch_count(&self, params: &RequestParams) -> Result<usize, PatentClientError> {
        Ok(self.lookup(params)?.len())
    }
}

/// The paged document list, or a single document when filtered by `id`.
pub struct DocumentFetcher {
    client: Arc<EdisClient>,
    cache: Arc<PageCache>,
}

impl DocumentFetcher {
    pub fn new(client: Arc<EdisClient>, cache: Arc<PageCache>) -> Self {
        Self { client, cache }
    }

    fn single(&self, id: &str) -> Result<Vec<RawRecord>, PatentClientError> {
        let key = PageCache::key("itc-document", &RequestParams::new().with("id", id));
        cached_rows(&self.cache, &key, || {
            ensure_credentials(&self.client)?;
            Ok(self.client.document(id)?.into_iter().collect())
        })
    }

    /// `number` is zero-based; EDIS page numbers start at 1.
    fn page(
        &self,
        params: &RequestParams,
        number: usize,
    ) -> Result<Vec<RawRecord>, PatentClientError> {
        let params = params.clone().with("pagenumber", number + 1);
        let key = PageCache::key("itc-document-page", &params);
        cached_rows(&self.cache, &key, || {
            ensure_credentials(&self.client)?;
            tracing::debug!("Fetching EDIS document page {}", number + 1);
            Ok(self.client.documents(&params)?)
        })
    }
}

impl Fetcher for DocumentFetcher {
    fn fetch_page(
        &self,
        params: &RequestParams,
        page: PageRequest,
    ) -> Result<Vec<RawRecord>, PatentClientError> {
        match params.get_str("id") {
            Some(id) if page.number == 0 => self.single(&id),
            Some(_) => Ok(Vec::new()),
            None => self.page(params, page.number),
        }
    }

    fn fetch_count(&self, params: &RequestParams) -> Result<usize, PatentClientError> {
        if let Some(id) = params.get_str("id") {
            return Ok(self.single(&id)?.len());
        }
        let mut total = 0;
        let mut number = 0;
        loop {
            let rows = self.page(params, number)?.len();
            total += rows;
            if rows < DOCUMENT_PAGE_SIZE {
                return Ok(total);
            }
            number += 1;
        }
    }
}

/// Attachments of one document, fetched fresh on every call.
pub struct AttachmentFetcher {
    client: Arc<EdisClient>,
}

impl AttachmentFetcher {
    pub fn new(client: Arc<EdisClient>) -> Self {
        Self { client }
    }

    fn list(&self, params: &RequestParams) -> Result<Vec<RawRecord>, PatentClientError> {
        let document_id = required(
            params,
            "documentId",
            "attachments can only be listed for a document_id",
        )?;
        ensure_credentials(&self.client)?;
        Ok(self.client.attachments(&document_id)?)
    }
}

impl Fetcher for AttachmentFetcher {
    fn fetch_page(
        &self,
        params: &RequestParams,
        page: PageRequest,
    ) -> Result<Vec<RawRecord>, PatentClientError> {
        if page.number > 0 {
            return Ok(Vec::new());
        }
        self.list(params)
    }

    fn fetch_count(&self, params: &RequestParams) -> Result<usize, PatentClientError> {
        Ok(self.list(params)?.len())
    }
}

/// Registers `ItcInvestigation`, `ItcDocument` and `ItcAttachment`.
pub fn register(
    registry: &mut ModelRegistry,
    client: Arc<EdisClient>,
    cache: Arc<PageCache>,
) -> Result<(), PatentClientError> {
    let investigations = ModelDescriptor::new(
        CollectionConfig::new(MODULE, "ItcInvestigation", "/investigation")
            .with_primary_key("investigation_number")
            .with_page_size(1)
            .with_field_map(&[("investigation_number", "investigationNumber")])
            .with_display_field("number"),
        Arc::new(InvestigationFetcher::new(Arc::clone(&client), Arc::clone(&cache))),
    )
    .with_relation(one_to_many(
        "documents",
        "itc_edis.ItcDocument",
        &[("investigation_number", "number")],
    ));

    let documents = ModelDescriptor::new(
        CollectionConfig::new(MODULE, "ItcDocument", "/document")
            .with_primary_key("id")
            .with_page_size(DOCUMENT_PAGE_SIZE)
            .with_field_map(DOCUMENT_FILTERS)
            .with_display_field("title"),
        Arc::new(DocumentFetcher::new(Arc::clone(&client), cache)),
    )
    .with_relation(one_to_one(
        "investigation",
        "itc_edis.ItcInvestigation",
        &[("investigation_number", "investigation_number")],
    ))
    .with_relation(one_to_many(
        "attachments",
        "itc_edis.ItcAttachment",
        &[("document_id", "id")],
    ));

    let attachments = ModelDescriptor::new(
        CollectionConfig::new(MODULE, "ItcAttachment", "/attachment")
            .with_primary_key("document_id")
            .with_page_size(usize::MAX)
            .with_field_map(&[("document_id", "documentId")])
            .with_display_field("title"),
        Arc::new(AttachmentFetcher::new(client)),
    )
    .with_relation(one_to_one(
        "document",
        "itc_edis.ItcDocument",
        &[("id", "document_id")],
    ));

    registry.register(investigations)?;
    registry.register(documents)?;
    registry.register(attachments)?;
    Ok(())
}
