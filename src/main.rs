use anyhow::Context;
use blob_quickstart::config::DEFAULT_CONTAINER;
use blob_quickstart::{
    AutoConfirm, AzureBlobStorage, BlobStorage, Confirmation, ConnectionConfig,
    InMemoryBlobStorage, ListingMode, StdinConfirmation, StorageWorkflow, WorkflowConfig,
};
use clap::{Parser, ValueEnum};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Create a container, upload and overwrite a blob, list it, then clean up.
#[derive(Parser, Debug)]
#[command(name = "blob-quickstart", version)]
struct Cli {
    /// Storage connection string (DefaultEndpointsProtocol=...;AccountName=...;AccountKey=...)
    #[arg(long, env = "AZURE_STORAGE_CONNECTION_STRING", hide_env_values = true)]
    connection_string: Option<String>,

    /// Container to create and delete
    #[arg(long, default_value = DEFAULT_CONTAINER)]
    container: String,

    /// Flat lists every blob; hierarchical lists only the container root
    #[arg(long, value_enum, default_value_t = ListingArg::Flat)]
    listing: ListingArg,

    /// Delete without waiting for Enter
    #[arg(long)]
    yes: bool,

    /// Run against an in-memory blob service instead of a real account
    #[arg(long)]
    dry_run: bool,

    /// Print the run report as JSON when done
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ListingArg {
    Flat,
    Hierarchical,
}

impl From<ListingArg> for ListingMode {
    fn from(arg: ListingArg) -> Self {
        match arg {
            ListingArg::Flat => ListingMode::Flat,
            ListingArg::Hierarchical => ListingMode::Hierarchical,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("blob_quickstart={level}"))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let storage: Arc<dyn BlobStorage> = if cli.dry_run {
        Arc::new(InMemoryBlobStorage::default())
    } else {
        let connection_string = cli
            .connection_string
            .as_deref()
            .context("AZURE_STORAGE_CONNECTION_STRING not set (pass --connection-string or --dry-run)")?;
        let config = ConnectionConfig::parse(connection_string)?;
        Arc::new(AzureBlobStorage::new(&config))
    };

    let config = WorkflowConfig::default()
        .with_container(cli.container)
        .with_listing(ListingMode::from(cli.listing));
    let workflow = StorageWorkflow::new(storage, config);

    let mut confirmation: Box<dyn Confirmation> = if cli.yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(StdinConfirmation::new())
    };

    let report = workflow.run(confirmation.as_mut()).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
