//! CLI subcommand implementations.

pub mod download;
pub mod models;
pub mod query;
pub mod related;

use patent_client_lib::{PatentClient, QueryManager};

/// Parses a `key=value` filter argument.
pub fn parse_filter(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", arg)),
    }
}

/// A manager over `model` narrowed by an optional primary key and filters.
pub fn scoped(
    client: &PatentClient,
    model: &str,
    pk: Option<&str>,
    filters: &[(String, String)],
) -> anyhow::Result<QueryManager> {
    let mut manager = client.objects(model)?;
    if let Some(pk) = pk {
        manager = manager.filter_pk(pk)?;
    }
    if !filters.is_empty() {
        manager = manager.filter(filters.iter().cloned());
    }
    Ok(manager)
}
