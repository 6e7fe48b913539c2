//! A collection served from rows held in memory.

use std::sync::atomic::{AtomicUsize, Ordering};

use patent_client_api::{RawRecord, RequestParams};
use serde_json::Value;

use crate::error::PatentClientError;
use crate::manager::{Fetcher, PageRequest};

/// Serves raw rows from memory, filtering by equality on the request
/// parameters. An array parameter matches any of its elements. The `sort`
/// parameter is ignored.
///
/// Useful for offline fixtures and for observing how many round trips a
/// manager makes.
#[derive(Debug)]
pub struct MemoryFetcher {
    rows: Vec<RawRecord>,
    countable: bool,
    page_calls: AtomicUsize,
    count_calls: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new(rows: Vec<RawRecord>) -> Self {
        Self {
            rows,
            countable: true,
            page_calls: AtomicUsize::new(0),
            count_calls: AtomicUsize::new(0),
        }
    }

    /// Builds a fetcher from JSON objects; anything else is skipped.
    pub fn from_json(rows: impl IntoIterator<Item = Value>) -> Self {
        Self::new(
            rows.into_iter()
                .filter_map(|row| match row {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
        )
    }

    /// Makes `fetch_count` unsupported.
    pub fn without_count(mut self) -> Self {
        self.countable = false;
        self
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    fn matching<'a>(&'a self, params: &'a RequestParams) -> impl Iterator<Item = &'a RawRecord> {
        self.rows.iter().filter(move |row| {
            params
                .iter()
                .filter(|(key, _)| key.as_str() != "sort")
                .all(|(key, wanted)| {
                    let actual = row.get(key).unwrap_or(&Value::Null);
                    match wanted {
                        Value::Array(options) => options.contains(actual),
                        wanted => wanted == actual,
                    }
                })
        })
    }
}

impl Default for MemoryFetcher {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch_page(
        &self,
        params: &RequestParams,
        page: PageRequest,
    ) -> Result<Vec<RawRecord>, PatentClientError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .matching(params)
            .skip(page.offset)
            .take(page.size)
            .cloned()
            .collect())
    }

    fn fetch_count(&self, params: &RequestParams) -> Result<usize, PatentClientError> {
        if !self.countable {
            return Err(PatentClientError::NotImplemented(
                "in-memory collection is not countable".to_string(),
            ));
        }
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.matching(params).count())
    }
}
