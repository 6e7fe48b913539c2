//! HTTP client for the USITC EDIS data web service.
//!
//! EDIS answers in XML and requires a short-lived secret key obtained with a
//! username/password handshake; the key is then sent as the basic-auth
//! password. Elements are decoded into flat JSON objects with snake_case keys
//! so the rest of the stack can treat EDIS like any JSON source.

use std::fmt;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;
use url::Url;

use crate::download::download_to;
use crate::ptab::truncate_body;
use crate::types::RawRecord;
use crate::user_agent::get_user_agent;
use crate::xml::{self, Element};
use crate::{Error, Query, RequestParams};

/// Production base URL of the EDIS web service.
pub const EDIS_BASE_URL: &str = "https://edis.usitc.gov/data";

/// Number of documents EDIS returns per page.
pub const DOCUMENT_PAGE_SIZE: usize = 100;

/// A secret key is requested again once it is older than this.
const AUTH_TTL: Duration = Duration::from_secs(10 * 60);

const INVESTIGATION_FIELDS: &[(&str, &str)] = &[
    ("phase", "investigationPhase"),
    ("number", "investigationNumber"),
    ("status", "investigationStatus"),
    ("title", "investigationTitle"),
    ("type", "investigationType"),
    ("doc_list_url", "documentListUri"),
    ("docket_number", "docketNumber"),
];

const DOCUMENT_FIELDS: &[(&str, &str)] = &[
    ("type", "documentType"),
    ("title", "documentTitle"),
    ("investigation_number", "investigationNumber"),
    ("security", "securityLevel"),
    ("filing_org", "firmOrganization"),
    ("filed_by", "filedBy"),
    ("filed_on_behalf_of", "onBehalfOf"),
    ("action_jacket_control_number", "actionJacketControlNumber"),
    ("memorandum_control_number", "memorandumControlNumber"),
    ("attachment_url", "attachmentListUri"),
    ("date", "documentDate"),
    ("last_modified", "modifiedDate"),
    ("id", "id"),
];

const ATTACHMENT_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("document_id", "documentId"),
    ("title", "title"),
    ("size", "fileSize"),
    ("file_name", "originalFileName"),
    ("pages", "pageCount"),
    ("created_date", "createDate"),
    ("last_modified_date", "lastModifiedDate"),
    ("download_url", "downloadUri"),
];

/// EDIS account credentials.
#[derive(Clone)]
pub struct EdisCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for EdisCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdisCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

struct SecretKey {
    key: String,
    obtained_at: Instant,
}

/// Blocking HTTP client for EDIS investigations, documents and attachments.
pub struct EdisClient {
    base_url: String,
    credentials: Option<EdisCredentials>,
    http: reqwest::blocking::Client,
    secret: Mutex<Option<SecretKey>>,
}

impl EdisClient {
    /// Creates a new client pointing at the production EDIS service.
    pub fn new(credentials: Option<EdisCredentials>) -> Result<Self, Error> {
        Self::with_base_url(EDIS_BASE_URL, credentials)
    }

    /// Creates a new client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(
        base_url: &str,
        credentials: Option<EdisCredentials>,
    ) -> Result<Self, Error> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(get_user_agent())
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            http,
            secret: Mutex::new(None),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Returns `(username, secret key)`, performing the handshake when no key
    /// is held or the held key has expired.
    fn authenticate(&self) -> Result<(String, String), Error> {
        let creds = self.credentials.as_ref().ok_or_else(|| {
            Error::Auth("EDIS credentials are not configured (set EDIS_USER and EDIS_PASS)".into())
        })?;

        let mut secret = self.secret.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(held) = secret.as_ref() {
            if held.obtained_at.elapsed() < AUTH_TTL {
                return Ok((creds.username.clone(), held.key.clone()));
            }
        }

        tracing::debug!("Requesting EDIS secret key for {}", creds.username);
        let url = self.url(&format!("/secretKey/{}", creds.username))?;
        let resp = self
            .http
            .get(url)
            .query(&[("password", creds.password.as_str())])
            .send()
            .map_err(|e| {
                tracing::error!("EDIS authentication request failed: {}", e);
                Error::RequestFailed
            })?;
        let status = resp.status();
        let body = resp.text().map_err(|_| Error::RequestFailed)?;
        if !status.is_success() {
            return Err(Error::Auth(format!(
                "secret key request returned {}: {}",
                status,
                truncate_body(&body)
            )));
        }

        let root = xml::parse(&body)?;
        let key = if root.name == "secretKey" {
            Some(root.text.trim().to_string())
        } else {
            root.first_descendant("secretKey")
                .map(|el| el.text.trim().to_string())
        }
        .filter(|k| !k.is_empty())
        .ok_or_else(|| Error::Auth("no secretKey in EDIS response".to_string()))?;

        *secret = Some(SecretKey {
            key: key.clone(),
            obtained_at: Instant::now(),
        });
        Ok((creds.username.clone(), key))
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Url::parse(format!("{}{}", self.base_url, path).as_str()).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::RequestFailed
        })
    }

    fn get_xml(&self, path: &str, params: Option<&RequestParams>) -> Result<Element, Error> {
        let (user, key) = self.authenticate()?;
        let url = match params {
            Some(params) => params.add_to_url(&self.url(path)?),
            None => self.url(path)?,
        };
        tracing::debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .basic_auth(user, Some(key))
            .send()
            .map_err(|e| {
                tracing::error!("Failed to get resource: {}", e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        let body = resp.text().map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;
        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }
        xml::parse(&body)
    }

    /// Fetches one investigation by number (e.g. `337-TA-1000`). Returns
    /// `None` when EDIS knows no such investigation.
    pub fn investigation(&self, number: &str) -> Result<Option<RawRecord>, Error> {
        let root = self.get_xml(&format!("/investigation/{}", number), None)?;
        Ok(root
            .first_descendant("investigation")
            .map(|el| record_from(el, INVESTIGATION_FIELDS)))
    }

    /// Fetches one page of the document list. `params` carries EDIS filter
    /// names and the 1-based `pagenumber`.
    pub fn documents(&self, params: &RequestParams) -> Result<Vec<RawRecord>, Error> {
        let root = self.get_xml("/document", Some(params))?;
        Ok(root
            .descendants("document")
            .into_iter()
            .map(|el| record_from(el, DOCUMENT_FIELDS))
            .collect())
    }

    /// Fetches a single document by id.
    pub fn document(&self, id: &str) -> Result<Option<RawRecord>, Error> {
        let root = self.get_xml(&format!("/document/{}", id), None)?;
        Ok(root
            .first_descendant("document")
            .map(|el| record_from(el, DOCUMENT_FIELDS)))
    }

    /// Fetches every attachment of a document. EDIS does not paginate these.
    pub fn attachments(&self, document_id: &str) -> Result<Vec<RawRecord>, Error> {
        let root = self.get_xml(&format!("/attachment/{}", document_id), None)?;
        Ok(root
            .descendants("attachment")
            .into_iter()
            .map(|el| record_from(el, ATTACHMENT_FIELDS))
            .collect())
    }

    /// Downloads an attachment file to `dest` using the current secret key.
    pub fn download(&self, url: &str, dest: &Path) -> Result<u64, Error> {
        let (user, key) = self.authenticate()?;
        download_to(self.http.get(url).basic_auth(user, Some(key)), dest)
    }
}

fn record_from(el: &Element, fields: &[(&str, &str)]) -> RawRecord {
    let mut record = RawRecord::new();
    for (key, tag) in fields {
        let value = el
            .child_text(tag)
            .map(Value::String)
            .unwrap_or(Value::Null);
        record.insert((*key).to_string(), value);
    }
    record
}
