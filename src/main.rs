use anyhow::{Context, Result};
use clap::Parser;
use statusmigrate::config::{DEFAULT_CHECKPOINT_PATH, DEFAULT_KEYSPACE, DEFAULT_STORE_PATH};
use statusmigrate::{
    DocumentStore, FileWatermarkStore, InMemoryDocumentStore, MigrationConfig, MigrationStats,
    Migrator,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "statusmigrate")]
#[command(about = "Migrate STATUS documents into RESPONSE documents")]
struct Cli {
    /// Text file with one application id per line
    #[arg(long = "application-ids-path")]
    application_ids_path: PathBuf,

    /// File holding the latest migrated snapshot. It does not have to exist;
    /// it is written at the end of a successful run.
    #[arg(long = "prev-snapshot-file-path", default_value = DEFAULT_CHECKPOINT_PATH)]
    prev_snapshot_file_path: PathBuf,

    /// Document store snapshot file
    #[arg(long, default_value = DEFAULT_STORE_PATH)]
    store: PathBuf,

    #[arg(long, default_value = DEFAULT_KEYSPACE)]
    keyspace: String,

    /// Log every snapshot window and candidate response
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = MigrationConfig::new(&cli.application_ids_path)
        .checkpoint_path(&cli.prev_snapshot_file_path)
        .store_path(&cli.store)
        .keyspace(&cli.keyspace)
        .verbose(cli.verbose);
    config.validate()?;

    let application_ids = config.load_application_ids()?;
    if config.verbose {
        let ids: Vec<String> = application_ids.iter().map(|id| id.to_string()).collect();
        info!(?ids, "application ids from file");
    }

    let store = match InMemoryDocumentStore::open(&config.store_path) {
        Ok(store) => store,
        Err(err) => {
            println!("{}", MigrationStats::default());
            return Err(err)
                .with_context(|| format!("opening document store {}", config.store_path.display()));
        }
    };
    let watermarks = FileWatermarkStore::new(&config.checkpoint_path);

    let mut migrator = Migrator::new(&config, &store, &watermarks);
    let outcome = migrator.run(&application_ids).await;

    println!("{}", migrator.stats());
    info!("closing document store");
    let closed = store.close().await;

    outcome.context("migration aborted, watermark left unchanged")?;
    closed.context("closing document store")?;
    Ok(())
}
