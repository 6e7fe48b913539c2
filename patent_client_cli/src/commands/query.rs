use anyhow::Result;
use clap::Args;
use patent_client_lib::PatentClient;

use super::{parse_filter, scoped};
use crate::output::{print_items, print_records, OutputFormat};

#[derive(Args)]
pub struct QueryArgs {
    /// Model to query: PtabTrial, PtabDocument, ItcInvestigation, ItcDocument, ItcAttachment
    pub model: String,

    /// Fetch exactly one record by primary key
    #[arg(long)]
    pub pk: Option<String>,

    /// Filter as field=value (repeatable)
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Sort key (repeatable, sent in order)
    #[arg(long)]
    pub sort: Vec<String>,

    /// Comma-separated fields to project, e.g. title,links__1__href
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Index of the first result
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Maximum number of results
    #[arg(long, default_value = "20")]
    pub limit: usize,

    /// Print only the number of matches
    #[arg(long)]
    pub count: bool,
}

pub fn run(args: &QueryArgs, client: &PatentClient, format: &OutputFormat) -> Result<()> {
    let mut manager = scoped(client, &args.model, None, &args.filters)?;
    if !args.sort.is_empty() {
        manager = manager.order_by(args.sort.iter().cloned());
    }

    if args.count {
        let count = match &args.pk {
            Some(pk) => manager.filter_pk(pk.as_str())?.count()?,
            None => manager.count()?,
        };
        println!("{}", count);
        return Ok(());
    }

    if let Some(pk) = &args.pk {
        let record = manager.get_pk(pk.as_str())?;
        return print_records(&[record], format);
    }

    let end = args.offset.saturating_add(args.limit);
    if args.fields.is_empty() {
        let records: Vec<_> = manager
            .slice(args.offset..end)?
            .into_iter()
            .filter_map(|item| item.into_record())
            .collect();
        print_records(&records, format)
    } else {
        let items = manager
            .values(args.fields.iter().cloned())
            .slice(args.offset..end)?;
        print_items(&items, &args.fields, format)
    }
}
