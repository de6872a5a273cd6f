use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use lumina_core::{load_catalog, Catalog, LoadReport};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "lumina-cli")]
#[command(about = "Inspect and query a Lumina catalog directory")]
struct Cli {
    /// Directory holding the product matrix and recommendation files.
    #[arg(
        long,
        global = true,
        env = "LUMINA_DATA_DIR",
        default_value = "./artifacts"
    )]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the staged product search.
    Search {
        /// Free-text query; matched case-insensitively.
        query: String,
    },
    /// List the first products in catalog order.
    Top,
    /// Show catalog counts and per-file load status.
    Stats,
}

#[derive(Debug, Serialize)]
struct CatalogStats {
    data_dir: PathBuf,
    products: usize,
    names: usize,
    recommendations: usize,
    sources: LoadReport,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = run(&cli.command, &cli.data_dir)?;
    println!("{output}");
    Ok(())
}

fn run(command: &Commands, data_dir: &Path) -> anyhow::Result<String> {
    let (catalog, report) = load_catalog(data_dir);
    if !report.products.is_loaded() {
        tracing::warn!(data_dir = %data_dir.display(), "no product matrix loaded");
    }

    let rendered = match command {
        Commands::Search { query } => {
            let results = catalog.search_staged(query);
            tracing::info!(stage = ?results.stage, hits = results.products.len(), "search finished");
            serde_json::to_string_pretty(&results.products)?
        }
        Commands::Top => serde_json::to_string_pretty(&catalog.top_products())?,
        Commands::Stats => serde_json::to_string_pretty(&stats(&catalog, report, data_dir))?,
    };
    Ok(rendered)
}

fn stats(catalog: &Catalog, sources: LoadReport, data_dir: &Path) -> CatalogStats {
    CatalogStats {
        data_dir: data_dir.to_path_buf(),
        products: catalog.len(),
        names: catalog.name_count(),
        recommendations: catalog.recommendation_count(),
        sources,
    }
}
