use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use newsmap::config::{parse_list, Config, StrategyKind};
use newsmap::extract::ExtractedRecord;
use newsmap::output::terminal;
use newsmap::pipeline::{normalize_records, ArticleRecord};
use newsmap::topics::{ClusterStrategy, TopicClusterer};

/// Newsmap: normalize LLM-produced news annotations.
///
/// Clusters free-text topic labels, recovers structured data from model
/// output and resolves partial person names.
#[derive(Parser)]
#[command(name = "newsmap", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a JSON array of annotated article records
    Normalize {
        /// Input file with `[{"newspaper", "topic", "persons"}, ...]`
        #[arg(long)]
        input: PathBuf,

        /// Where to write the normalized records (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,

        /// density or centroid (default: NEWSMAP_STRATEGY)
        #[arg(long)]
        strategy: Option<StrategyKind>,

        /// Comma-separated canonical topics (default: NEWSMAP_CANONICAL_TOPICS)
        #[arg(long)]
        canonical_topics: Option<String>,
    },

    /// Cluster topics given on the command line and print their labels
    Cluster {
        topics: Vec<String>,

        /// Comma-separated canonical topics; switches to forced mode
        #[arg(long)]
        canonical_topics: Option<String>,
    },

    /// Recover the JSON object embedded in raw model output
    Extract {
        /// Read from this file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,

        /// Require the per-article record shape (newspaper, topic, persons)
        #[arg(long)]
        record: bool,
    },

    /// Resolve bare surnames to full names
    Canonicalize { names: Vec<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("newsmap=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize {
            input,
            output,
            strategy,
            canonical_topics,
        } => {
            let mut config = Config::load()?;
            if let Some(list) = canonical_topics {
                config.canonical_topics = parse_list(&list);
            }
            let strategy = strategy.unwrap_or(config.strategy);
            let clusterer = build_clusterer(&config, strategy)?;

            let raw = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let records: Vec<ArticleRecord> = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a JSON array of records", input.display()))?;
            info!(records = records.len(), path = %input.display(), "Loaded records");

            let normalized = normalize_records(records, &clusterer, config.surname_policy).await?;
            let json = serde_json::to_string_pretty(&normalized)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    terminal::display_batch_summary(&normalized);
                    println!("\nNormalized records written to: {}", path.display());
                }
                None => println!("{json}"),
            }
        }

        Commands::Cluster {
            topics,
            canonical_topics,
        } => {
            if topics.is_empty() {
                anyhow::bail!("Give at least one topic to cluster.");
            }
            let config = Config::load()?;
            let canonical = canonical_topics.map(|l| parse_list(&l)).unwrap_or_default();
            let strategy = if canonical.is_empty() {
                ClusterStrategy::Density
            } else {
                ClusterStrategy::Centroid { canonical }
            };
            let clusterer = TopicClusterer::new(strategy).with_params(config.word2vec.clone());
            let labels = clusterer.assign(&topics).await?;
            terminal::display_assignments(&topics, &labels);
        }

        Commands::Extract { input, record } => {
            let raw = match input {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read stdin")?;
                    buf
                }
            };
            if record {
                match newsmap::extract::extract_as::<ExtractedRecord>(&raw) {
                    Some(parsed) => println!("{}", serde_json::to_string_pretty(&parsed)?),
                    None => anyhow::bail!("No article record could be recovered."),
                }
            } else {
                let value = newsmap::extract::extract(&raw);
                if newsmap::extract::is_empty_value(&value) {
                    eprintln!("{}", "No structured object could be recovered.".dimmed());
                }
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
        }

        Commands::Canonicalize { names } => {
            let config = Config::load()?;
            let canonical = newsmap::persons::canonicalize_with(&names, config.surname_policy);
            for (name, resolved) in names.iter().zip(&canonical) {
                if name == resolved {
                    println!("  {name}");
                } else {
                    println!("  {:<24} -> {}", name, resolved.green());
                }
            }
        }
    }

    Ok(())
}

/// Build the clusterer for a CLI run. Delegated clustering needs a live
/// text generator, which the CLI does not have.
fn build_clusterer(config: &Config, strategy: StrategyKind) -> Result<TopicClusterer> {
    let strategy = match strategy {
        StrategyKind::Density => ClusterStrategy::Density,
        StrategyKind::Centroid => {
            config.require_canonical_topics()?;
            ClusterStrategy::Centroid {
                canonical: config.canonical_topics.clone(),
            }
        }
        StrategyKind::Delegated => anyhow::bail!(
            "Delegated clustering needs a text generation provider and is only \
             available through the library (ClusterStrategy::Delegated).\n\
             Use --strategy density or --strategy centroid."
        ),
    };
    Ok(TopicClusterer::new(strategy).with_params(config.word2vec.clone()))
}
