use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use constellation::commands;
use constellation::config::ConstellationSettings;
use constellation::layout::{Jitter, LayoutConfig};
use constellation::studio::run_studio;
use constellation::tree::NodeDraft;
use constellation::tree::store::TreeStore;

#[derive(Debug, Parser)]
#[command(name = "constellation", about = "3D radial explorer for a knowledge tree")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open the interactive constellation view.
    View,
    /// Print the stored tree as an indented outline.
    Tree,
    /// Print the computed layout as JSON.
    Layout {
        /// Seed for the horizontal jitter; omit to use the configured jitter.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Append a child node.
    Add {
        #[arg(long)]
        parent: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Replace the notes of a node.
    Notes { node_id: String, text: String },
    /// Replace the stored tree with a JSON or YAML seed document.
    Import { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = ConstellationSettings::from_env().context("failed to load configuration")?;
    let _file_log_guard = init_tracing(&settings)?;

    let cli = Cli::parse();
    let store = TreeStore::new(settings.tree_path.clone());

    match cli.command {
        Commands::View => run_studio(&settings).await?,
        Commands::Tree => {
            let tree = store.load_or_seed()?;
            print!("{}", commands::tree_outline(&tree));
        }
        Commands::Layout { seed } => {
            let tree = store.load_or_seed()?;
            let config = match seed {
                Some(seed) => LayoutConfig {
                    jitter: Jitter::Seeded(seed),
                    ..settings.layout_config()
                },
                None => settings.layout_config(),
            };
            let rows = commands::layout_rows(&tree, &config);
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize layout")?
            );
        }
        Commands::Add {
            parent,
            title,
            description,
            tags,
        } => {
            let node_id = commands::add_node(
                &store,
                &parent,
                NodeDraft {
                    title,
                    description,
                    tags,
                },
            )?;
            println!("{node_id}");
        }
        Commands::Notes { node_id, text } => commands::set_notes(&store, &node_id, &text)?,
        Commands::Import { path } => {
            let nodes = commands::import(&store, &path)?;
            println!("imported {nodes} nodes into {}", store.path().display());
        }
    }

    Ok(())
}

fn init_tracing(settings: &ConstellationSettings) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,constellation=debug"));
    let console_layer = fmt::layer()
        .with_target(false)
        .compact()
        .with_filter(env_filter);

    let (file_layer, guard) = match &settings.log_dir {
        Some(log_dir) => {
            let file_filter = EnvFilter::try_new(&settings.file_log_filter)
                .context("failed to parse CONSTELLATION_FILE_LOG")?;
            let appender = tracing_appender::rolling::daily(log_dir, "constellation.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(file_filter);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(guard)
}
