//! Lazy query and relation layer over the USPTO PTAB and USITC EDIS services.
//!
//! A [`QueryManager`] presents a paginated remote collection as a filterable,
//! indexable sequence of [`Record`]s; records follow declared relations into
//! other collections through the [`ModelRegistry`].

pub mod cache;
pub mod casing;
pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod itc;
pub mod manager;
pub mod memory;
pub mod model;
pub mod ptab;
pub mod query;
pub mod record;
pub mod registry;
pub mod relation;
pub mod value;

pub use patent_client_api;
pub use patent_client_api::{RawRecord, RequestParams};

pub use cache::PageCache;
pub use client::PatentClient;
pub use config::Settings;
pub use error::PatentClientError;
pub use manager::{Fetcher, Iter, PageRequest, QueryManager};
pub use memory::MemoryFetcher;
pub use model::{CollectionConfig, ModelDescriptor};
pub use query::{Projection, QueryState, ValuesSpec};
pub use record::{FieldMap, Item, Record};
pub use registry::ModelRegistry;
pub use relation::{one_to_many, one_to_one, Related, Relation, RelationKind};
pub use value::FieldValue;
