use anyhow::Result;
use clap::Args;
use patent_client_lib::{PatentClient, Related};

use crate::output::{print_records, OutputFormat};

#[derive(Args)]
pub struct RelatedArgs {
    /// Model of the owning record
    pub model: String,

    /// Primary key of the owning record
    pub pk: String,

    /// Relation to follow, e.g. documents, trial, attachments
    pub relation: String,

    /// Maximum number of related records for one-to-many relations
    #[arg(long, default_value = "20")]
    pub limit: usize,
}

pub fn run(args: &RelatedArgs, client: &PatentClient, format: &OutputFormat) -> Result<()> {
    let owner = client.objects(&args.model)?.get_pk(args.pk.as_str())?;
    match owner.related(&args.relation)? {
        Related::One(record) => print_records(&[record], format),
        Related::Many(manager) => {
            let records = manager
                .all()
                .take(args.limit)
                .collect::<Result<Vec<_>, _>>()?;
            print_records(&records, format)
        }
    }
}
