mod commands;

use std::path::PathBuf;

use bizrag::AdapterKind;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bizrag")]
#[command(about = "Business document retrieval: build the similarity index and search it", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "Config file (default: ./bizrag.toml)")]
    config: Option<PathBuf>,
    #[arg(short, long, global = true, help = "Debug logging")]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the similarity index for a collection
    Index {
        #[arg(long, conflicts_with_all = ["collection", "all"], help = "Adapter whose collection to build")]
        adapter: Option<AdapterKind>,
        #[arg(long, conflicts_with = "all", help = "Collection name")]
        collection: Option<String>,
        #[arg(long, help = "Build every adapter collection")]
        all: bool,
        #[arg(long, help = "Show index status only")]
        status: bool,
        #[arg(long, help = "Drop and rebuild the collection")]
        rebuild: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Search documents
    Search {
        query: String,
        #[arg(short, long, help = "Maximum results")]
        k: Option<usize>,
        #[arg(long, conflicts_with = "adapter", help = "Only documents of this module")]
        module: Option<String>,
        #[arg(long, conflicts_with = "adapter", help = "Comma-separated tags every result must carry")]
        tags: Option<String>,
        #[arg(long, conflicts_with = "collection", help = "Search through a domain adapter")]
        adapter: Option<AdapterKind>,
        #[arg(long, help = "Collection name")]
        collection: Option<String>,
        #[arg(long, help = "Use keyword matching only (no index)")]
        fallback: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = commands::load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Index {
            adapter,
            collection,
            all,
            status,
            rebuild,
            json,
        } => {
            let targets = commands::index_targets(adapter, collection, all);
            commands::index::run(&settings, &targets, status, rebuild, json)
        }
        Commands::Search {
            query,
            k,
            module,
            tags,
            adapter,
            collection,
            fallback,
            json,
        } => {
            let request = commands::search::SearchRequest {
                query,
                k,
                module,
                tags,
                adapter,
                collection,
                fallback,
            };
            commands::search::run(&settings, &request, json)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "bizrag=debug" } else { "bizrag=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
