mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use patent_client_lib::{PatentClient, Settings};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "patent-client")]
#[command(about = "Query USPTO PTAB trials and USITC EDIS investigations")]
struct Cli {
    /// Output format: table, json, csv or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Cache directory (overrides PATENT_CLIENT_CACHE)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available models and their relations
    Models,
    /// Query a model
    Query(Box<commands::query::QueryArgs>),
    /// Follow a relation from one record
    Related(commands::related::RelatedArgs),
    /// Download the file behind a PTAB document or EDIS attachment
    Download(commands::download::DownloadArgs),
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("patent_client_cli=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from_flag(&cli.output);

    let mut settings = Settings::load()?;
    if let Some(dir) = cli.cache_dir {
        settings = settings.with_cache_dir(dir);
    }
    let client = PatentClient::new(settings)?;

    match &cli.command {
        Commands::Models => commands::models::run(&client, &format)?,
        Commands::Query(args) => commands::query::run(args.as_ref(), &client, &format)?,
        Commands::Related(args) => commands::related::run(args, &client, &format)?,
        Commands::Download(args) => commands::download::run(args, &client)?,
    }

    Ok(())
}
