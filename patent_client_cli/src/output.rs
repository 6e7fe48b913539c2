use anyhow::Result;
use patent_client_lib::{FieldValue, Item, Record};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn from_flag(value: &str) -> Self {
        match value {
            "json" => Self::Json,
            "csv" => Self::Csv,
            "markdown" | "md" => Self::Markdown,
            _ => Self::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
struct PtabTrialRow {
    #[tabled(rename = "Trial")]
    #[serde(rename = "Trial")]
    trial_number: String,
    #[tabled(rename = "Patent")]
    #[serde(rename = "Patent")]
    patent_number: String,
    #[tabled(rename = "Petitioner")]
    #[serde(rename = "Petitioner")]
    petitioner: String,
    #[tabled(rename = "Patent Owner")]
    #[serde(rename = "Patent Owner")]
    patent_owner: String,
    #[tabled(rename = "Status")]
    #[serde(rename = "Status")]
    status: String,
    #[tabled(rename = "Filed")]
    #[serde(rename = "Filed")]
    filed: String,
}

#[derive(Tabled, Serialize)]
struct PtabDocumentRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: String,
    #[tabled(rename = "Trial")]
    #[serde(rename = "Trial")]
    trial_number: String,
    #[tabled(rename = "Filed")]
    #[serde(rename = "Filed")]
    filed: String,
    #[tabled(rename = "Party")]
    #[serde(rename = "Party")]
    party: String,
    #[tabled(rename = "Title")]
    #[serde(rename = "Title")]
    title: String,
}

#[derive(Tabled, Serialize)]
struct InvestigationRow {
    #[tabled(rename = "Number")]
    #[serde(rename = "Number")]
    number: String,
    #[tabled(rename = "Title")]
    #[serde(rename = "Title")]
    title: String,
    #[tabled(rename = "Phase")]
    #[serde(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Status")]
    #[serde(rename = "Status")]
    status: String,
    #[tabled(rename = "Docket")]
    #[serde(rename = "Docket")]
    docket_number: String,
}

#[derive(Tabled, Serialize)]
struct ItcDocumentRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    #[serde(rename = "Date")]
    date: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "Type")]
    doc_type: String,
    #[tabled(rename = "Filed By")]
    #[serde(rename = "Filed By")]
    filed_by: String,
    #[tabled(rename = "Title")]
    #[serde(rename = "Title")]
    title: String,
}

#[derive(Tabled, Serialize)]
struct AttachmentRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    #[serde(rename = "Title")]
    title: String,
    #[tabled(rename = "File")]
    #[serde(rename = "File")]
    file_name: String,
    #[tabled(rename = "Pages")]
    #[serde(rename = "Pages")]
    pages: String,
    #[tabled(rename = "Size")]
    #[serde(rename = "Size")]
    size: String,
}

fn text(record: &Record, field: &str) -> String {
    record.get(field).map(ToString::to_string).unwrap_or_default()
}

// -- Row builders --

fn build_trial_rows(records: &[Record]) -> Vec<PtabTrialRow> {
    records
        .iter()
        .map(|r| PtabTrialRow {
            trial_number: text(r, "trial_number"),
            patent_number: text(r, "patent_number"),
            petitioner: text(r, "petitioner_party_name"),
            patent_owner: text(r, "patent_owner_name"),
            status: text(r, "prosecution_status"),
            filed: text(r, "filing_date"),
        })
        .collect()
}

fn build_ptab_document_rows(records: &[Record]) -> Vec<PtabDocumentRow> {
    records
        .iter()
        .map(|r| PtabDocumentRow {
            id: text(r, "id"),
            trial_number: text(r, "trial_number"),
            filed: r
                .get("filing_datetime")
                .and_then(FieldValue::as_date)
                .map(|d| d.to_string())
                .unwrap_or_default(),
            party: text(r, "filing_party"),
            title: text(r, "title"),
        })
        .collect()
}

fn build_investigation_rows(records: &[Record]) -> Vec<InvestigationRow> {
    records
        .iter()
        .map(|r| InvestigationRow {
            number: text(r, "number"),
            title: text(r, "title"),
            phase: text(r, "phase"),
            status: text(r, "status"),
            docket_number: text(r, "docket_number"),
        })
        .collect()
}

fn build_itc_document_rows(records: &[Record]) -> Vec<ItcDocumentRow> {
    records
        .iter()
        .map(|r| ItcDocumentRow {
            id: text(r, "id"),
            date: text(r, "date"),
            doc_type: text(r, "type"),
            filed_by: text(r, "filed_by"),
            title: text(r, "title"),
        })
        .collect()
}

fn build_attachment_rows(records: &[Record]) -> Vec<AttachmentRow> {
    records
        .iter()
        .map(|r| AttachmentRow {
            id: text(r, "id"),
            title: text(r, "title"),
            file_name: text(r, "file_name"),
            pages: text(r, "pages"),
            size: text(r, "size"),
        })
        .collect()
}

/// Header and cells for records of a model without a dedicated row type:
/// every field of the first record, in payload order.
fn build_generic_rows(records: &[Record]) -> (Vec<String>, Vec<Vec<String>>) {
    let header: Vec<String> = records
        .first()
        .map(|r| r.fields().map(|(k, _)| k.clone()).collect())
        .unwrap_or_default();
    let rows = records
        .iter()
        .map(|r| header.iter().map(|f| text(r, f)).collect())
        .collect();
    (header, rows)
}

/// Cells of one projected item, in field order.
fn item_cells(item: &Item) -> Vec<String> {
    match item {
        Item::Record(record) => record.fields().map(|(_, v)| v.to_string()).collect(),
        Item::Values(map) => map.values().map(ToString::to_string).collect(),
        Item::Tuple(values) => values.iter().map(ToString::to_string).collect(),
        Item::Scalar(value) => vec![value.to_string()],
    }
}

// -- Rendering --

pub fn print_rows<T: Tabled + Serialize>(rows: Vec<T>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        _ => println!("{}", Table::new(rows)),
    }
    Ok(())
}

fn render_dynamic(
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            wtr.write_record(&header)?;
            for row in &rows {
                wtr.write_record(row)?;
            }
            wtr.flush()?;
        }
        _ => {
            let mut builder = Builder::default();
            builder.push_record(header);
            for row in rows {
                builder.push_record(row);
            }
            let mut table = builder.build();
            if *format == OutputFormat::Markdown {
                table.with(Style::markdown());
            }
            println!("{}", table);
        }
    }
    Ok(())
}

/// Prints records of one model, using the model's row layout when it has one.
pub fn print_records(records: &[Record], format: &OutputFormat) -> Result<()> {
    if *format == OutputFormat::Json {
        print_json(&records);
        return Ok(());
    }
    let model = records.first().map(|r| r.model_name()).unwrap_or_default();
    match model {
        "PtabTrial" => print_rows(build_trial_rows(records), format),
        "PtabDocument" => print_rows(build_ptab_document_rows(records), format),
        "ItcInvestigation" => print_rows(build_investigation_rows(records), format),
        "ItcDocument" => print_rows(build_itc_document_rows(records), format),
        "ItcAttachment" => print_rows(build_attachment_rows(records), format),
        _ => {
            let (header, rows) = build_generic_rows(records);
            render_dynamic(header, rows, format)
        }
    }
}

/// Prints `values` / `values_list` projections with `fields` as the header.
pub fn print_items(items: &[Item], fields: &[String], format: &OutputFormat) -> Result<()> {
    if *format == OutputFormat::Json {
        print_json(&items);
        return Ok(());
    }
    let rows = items.iter().map(item_cells).collect();
    render_dynamic(fields.to_vec(), rows, format)
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}
