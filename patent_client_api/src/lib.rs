//! HTTP collaborators for the USPTO PTAB and USITC EDIS data services.
//!
//! This crate only moves bytes: it encodes request parameters, performs the
//! HTTP calls, decodes the EDIS XML schema into flat JSON objects and streams
//! file downloads. Pagination, caching and record normalization live in
//! `patent_client_lib`.

mod download;
pub mod edis;
mod errors;
pub mod params;
pub mod ptab;
pub mod types;
pub mod user_agent;
mod xml;

pub use self::edis::{EdisClient, EdisCredentials};
pub use self::errors::Error;
pub use self::params::{Query, RequestParams};
pub use self::ptab::PtabClient;
pub use self::types::{PtabMetadata, PtabPage, RawRecord};
