use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use patent_client_lib::PatentClient;

use super::{parse_filter, scoped};

#[derive(Args)]
pub struct DownloadArgs {
    /// PtabDocument or ItcAttachment
    pub model: String,

    /// Primary key (document id for PTAB, document id for EDIS attachments)
    #[arg(long)]
    pub pk: Option<String>,

    /// Filter as field=value (repeatable)
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Which match to download
    #[arg(long, default_value = "0")]
    pub index: usize,

    /// Destination directory
    #[arg(long, default_value = ".")]
    pub dest: PathBuf,
}

pub fn run(args: &DownloadArgs, client: &PatentClient) -> Result<()> {
    let manager = scoped(client, &args.model, args.pk.as_deref(), &args.filters)?;
    let record = manager.record_at(args.index)?;
    let path = client.download(&record, &args.dest)?;
    tracing::info!("Downloaded {}", record);
    println!("{}", path.display());
    Ok(())
}
