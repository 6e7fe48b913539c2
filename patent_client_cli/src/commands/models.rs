use anyhow::Result;
use patent_client_lib::{PatentClient, RelationKind};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_json, print_rows, OutputFormat};

#[derive(Tabled, Serialize)]
struct ModelRow {
    #[tabled(rename = "Model")]
    #[serde(rename = "Model")]
    model: String,
    #[tabled(rename = "Endpoint")]
    #[serde(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Primary Key")]
    #[serde(rename = "Primary Key")]
    primary_key: String,
    #[tabled(rename = "Page Size")]
    #[serde(rename = "Page Size")]
    page_size: String,
    #[tabled(rename = "Relations")]
    #[serde(rename = "Relations")]
    relations: String,
}

pub fn run(client: &PatentClient, format: &OutputFormat) -> Result<()> {
    let rows: Vec<ModelRow> = client
        .registry()
        .models()
        .map(|m| ModelRow {
            model: m.config.identifier(),
            endpoint: m.config.endpoint.clone(),
            primary_key: m.config.primary_key.clone().unwrap_or_default(),
            page_size: if m.config.page_size == usize::MAX {
                "all".to_string()
            } else {
                m.config.page_size.to_string()
            },
            relations: m
                .relations()
                .iter()
                .map(|r| {
                    let arrow = match r.kind() {
                        RelationKind::OneToOne => "->",
                        RelationKind::OneToMany => "->>",
                    };
                    format!("{} {} {}", r.name(), arrow, r.target())
                })
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows),
        _ => print_rows(rows, format)?,
    }
    Ok(())
}
