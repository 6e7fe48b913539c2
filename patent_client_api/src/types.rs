//! Raw payload types returned by the remote services.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Error;

/// One raw record as decoded from the wire, with the service's own key casing.
pub type RawRecord = Map<String, Value>;

/// Page metadata reported by the PTAB API.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PtabMetadata {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

/// A page of PTAB trials or documents.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PtabPage {
    #[serde(default)]
    pub metadata: PtabMetadata,
    #[serde(default)]
    pub results: Vec<RawRecord>,
}

impl PtabPage {
    /// Decodes a page from raw JSON, as stored in the page cache.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        serde_json::from_value(value).map_err(|e| {
            tracing::error!("Failed to decode PTAB page: {}", e);
            Error::Parse(e.to_string())
        })
    }
}
