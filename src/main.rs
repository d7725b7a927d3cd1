//! Depvis CLI - step-driven ingestion and dependency resolution

use clap::{Parser, Subcommand};
use depvis::config;
use depvis::ingest::{self, IngestOptions};
use depvis::occurrence::IdentifierType;
use depvis::resolver::DependencyResolver;
use depvis::output;
use depvis::storage::SqliteStore;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "depvis")]
#[command(version)]
#[command(about = "Static WordPress hook, function and class dependency analyzer")]
#[command(long_about = r#"
Depvis scans a WordPress installation and records which hooks, functions and
classes each file defines versus uses, then resolves the records into a
plugin/theme dependency graph.

Example usage:
  depvis ingest --root /var/www/html
  depvis ingest --root /var/www/html --step 3
  depvis resolve --types a,fi --format graph
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a depvis.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a WordPress tree and store occurrence records
    Ingest {
        /// WordPress installation root (ABSPATH)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Run a single step (1: wp-includes, 2: wp-admin, 3: plugins,
        /// 4: themes); omit to run all four
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=4))]
        step: Option<u8>,
    },

    /// Resolve stored records into a package dependency graph
    Resolve {
        /// Identifier types to include (comma-separated codes: a, fi, fn, c)
        #[arg(short, long, default_value = "a,fi,fn,c")]
        types: String,

        /// Output format: graph (edge triples), table, or json (groupings)
        #[arg(short, long, default_value = "graph")]
        format: String,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show statistics about the stored records
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Write a depvis.toml template to the current directory
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let file_config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let database_from_config = file_config.database.clone().map(PathBuf::from);

    match cli.command {
        Commands::Ingest { root, database, step } => {
            let root = root
                .or_else(|| file_config.root.clone().map(PathBuf::from))
                .ok_or_else(|| anyhow::anyhow!("no WordPress root given (--root or config)"))?;
            let database = database
                .or(database_from_config)
                .unwrap_or_else(config::default_database_path);

            let mut options = IngestOptions::new(&root);
            if let Some(dirs) = file_config.ignored_dirs {
                options.ignored_dirs = dirs;
            }
            if let Some(limit) = file_config.file_size_limit {
                options.file_size_limit = limit;
            }

            match step {
                Some(n) => tracing::info!("Ingesting {} (step {})", root.display(), n),
                None => tracing::info!("Ingesting {} (all steps)", root.display()),
            }

            let mut store = SqliteStore::open(&database)?;
            let summary = ingest::run(&mut store, &options, step)?;

            println!("Ingestion complete: {}", summary);
            println!("{}", store.stats()?);
        }

        Commands::Resolve { types, format, database } => {
            let database = database
                .or(database_from_config)
                .unwrap_or_else(config::default_database_path);
            let types = parse_types(&types)?;

            let store = SqliteStore::open(&database)?;
            let resolver = DependencyResolver::new(&store);

            match format.as_str() {
                "graph" => {
                    let graph = resolver.dependencies(&types)?;
                    println!("{}", output::render_graph_json(&graph)?);
                }
                "table" => {
                    let definitions = resolver.definitions(&types)?;
                    let usage = resolver.usage(&types)?;
                    let table = output::render_dependency_table(&definitions, &usage);
                    if table.is_empty() {
                        println!("No dependencies found.");
                    } else {
                        println!("{}", table);
                    }
                }
                "json" => {
                    let definitions = resolver.definitions(&types)?;
                    let usage = resolver.usage(&types)?;
                    println!("{}", output::render_groupings_json(&definitions, &usage)?);
                }
                other => anyhow::bail!("unknown format: {} (expected graph, table or json)", other),
            }
        }

        Commands::Stats { database } => {
            let database = database
                .or(database_from_config)
                .unwrap_or_else(config::default_database_path);
            let store = SqliteStore::open(&database)?;
            println!("Depvis statistics ({})", database.display());
            println!("{}", store.stats()?);
        }

        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            let template = config::DepvisConfig {
                root: Some("/var/www/html".to_string()),
                database: Some(config::default_database_path().display().to_string()),
                ignored_dirs: None,
                file_size_limit: None,
            };
            config::write_config(&path, &template, force)?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

fn parse_types(input: &str) -> anyhow::Result<Vec<IdentifierType>> {
    let mut types = Vec::new();
    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        types.push(part.parse::<IdentifierType>()?);
    }
    if types.is_empty() {
        anyhow::bail!("no identifier types given");
    }
    Ok(types)
}
