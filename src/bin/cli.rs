//! DSOMM CLI
//!
//! Command-line interface for dataset operations:
//! - Validate the dataset
//! - Look up activities
//! - List teams and groups
//! - Export YAML files

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use dsomm::config::{generate_default_config, Config};
use dsomm::loader::{HttpFetcher, Loader, TextFetcher, YamlClient};

#[derive(Parser)]
#[command(name = "dsomm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "DevSecOps maturity model dataset tool")]
#[command(
    long_about = "Load, validate and query a DSOMM YAML dataset.\nThe dataset location comes from config.toml or the --base-url flag."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the YAML assets (overrides config)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Meta file path below the base URL (overrides config)
    #[arg(long, global = true)]
    pub meta_file: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the dataset and report validation problems
    Validate,

    /// Look up one activity by uuid or name
    Activity {
        /// Activity uuid or name
        id: String,
    },

    /// List teams and team groups
    Teams,

    /// Export a dataset file as YAML
    Export {
        /// Which file to export
        what: ExportTarget,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportTarget {
    Teams,
    Progress,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("cannot write {}", path.display()))?;
                println!("Config written to {}", path.display());
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let mut config = Config::load_default();
    if let Some(base_url) = cli.base_url {
        config.dataset.base_url = base_url;
    }
    if let Some(meta_file) = cli.meta_file {
        config.dataset.meta_file = meta_file;
    }

    let fetcher = HttpFetcher::new(
        config.dataset.base_url.clone(),
        config.dataset.request_timeout_ms,
    )?;
    let client = YamlClient::new(Arc::new(fetcher) as Arc<dyn TextFetcher>);
    let loader = Loader::new(client, config.dataset.meta_file.clone());

    match cli.command {
        Commands::Validate => {
            match loader.load().await {
                Ok(store) => {
                    println!(
                        "Dataset OK: {} activities, {} teams, version {}",
                        store.activities.len(),
                        store.meta.teams.len(),
                        store.meta.dataset_version.as_deref().unwrap_or("unknown")
                    );
                }
                Err(e) => {
                    eprintln!("Dataset invalid:\n{}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Activity { id } => {
            let store = loader.load().await.map_err(|e| anyhow::anyhow!("{}", e))?;
            // The argument may be either key; try it as both
            let activity = store
                .activities
                .activity(&id, &id)
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            println!("{}", serde_yaml::to_string(activity)?);
        }

        Commands::Teams => {
            let store = loader.load().await.map_err(|e| anyhow::anyhow!("{}", e))?;
            println!("Teams:");
            for team in &store.meta.teams {
                println!("  {}", team);
            }
            if !store.meta.team_groups.is_empty() {
                println!("Groups:");
                for (group, members) in &store.meta.team_groups {
                    println!("  {}: {}", group, members.join(", "));
                }
            }
        }

        Commands::Export { what, output } => {
            let store = loader.load().await.map_err(|e| anyhow::anyhow!("{}", e))?;
            let yaml = match what {
                ExportTarget::Teams => store.meta.teams_yaml()?,
                ExportTarget::Progress => store.progress.as_yaml_string(),
            };
            match output {
                Some(path) => {
                    std::fs::write(&path, yaml)
                        .with_context(|| format!("cannot write {}", path.display()))?;
                    println!("Written to {}", path.display());
                }
                None => print!("{}", yaml),
            }
        }

        Commands::Config { .. } => unreachable!("handled above"),
    }

    Ok(())
}
