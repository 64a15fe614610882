use anyhow::Result;
use clap::Parser;
use hookpost::commands;
use hookpost::config::{Config, Endpoints};
use std::path::PathBuf;

/// hookpost - webhook courier for automation workflows
///
/// Forward documents and free-text queries to externally hosted workflow
/// webhooks (e.g. n8n) and print the returned results.
///
/// Webhook URLs, the tenant identifier and the optional bearer token can
/// all be supplied via environment variables, which is convenient for
/// scripted use.
///
/// Examples:
///   hookpost upload report.pdf
///   hookpost query "revenue by quarter"
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Document upload webhook URL (also via HOOKPOST_UPLOAD_URL)
    #[arg(
        long = "upload-url",
        env = "HOOKPOST_UPLOAD_URL",
        value_name = "URL",
        global = true
    )]
    upload_url: Option<String>,

    /// Query webhook URL (also via HOOKPOST_QUERY_URL)
    #[arg(
        long = "query-url",
        env = "HOOKPOST_QUERY_URL",
        value_name = "URL",
        global = true
    )]
    query_url: Option<String>,

    /// Tenant identifier forwarded with every request (also via HOOKPOST_CLIENT_ID)
    #[arg(
        long = "client-id",
        env = "HOOKPOST_CLIENT_ID",
        value_name = "ID",
        global = true
    )]
    client_id: Option<String>,

    /// Bearer token sent with every request (also via HOOKPOST_TOKEN)
    #[arg(
        long = "token",
        env = "HOOKPOST_TOKEN",
        value_name = "TOKEN",
        global = true,
        hide_env_values = true
    )]
    token: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Upload a document to the document webhook
    Upload(UploadArgs),

    /// Submit a free-text query to the query webhook
    Query(QueryArgs),
}

#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    /// Path of the document to upload
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct QueryArgs {
    /// The query text to submit
    #[arg(value_name = "TEXT")]
    pub text: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let endpoints = Endpoints {
        upload_url: cli.upload_url,
        query_url: cli.query_url,
    };
    let config = Config::new(endpoints, cli.client_id.unwrap_or_default(), cli.token)?;

    match cli.command {
        Commands::Upload(args) => commands::upload(&config, &args.file).await?,
        Commands::Query(args) => commands::query(&config, &args.text).await?,
    }
    Ok(())
}
