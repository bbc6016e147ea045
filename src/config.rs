use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm::RateLimiter;
use crate::persons::SurnamePolicy;
use crate::pipeline::{AnnotateOptions, DateWindow};
use crate::topics::Word2VecParams;

/// Which clustering strategy to run over a batch's topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Density clustering, labels discovered from the batch (default)
    Density,
    /// Forced assignment to NEWSMAP_CANONICAL_TOPICS
    Centroid,
    /// Grouping done by the text generator
    Delegated,
}

impl FromStr for StrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "density" | "free" => Ok(Self::Density),
            "centroid" | "forced" => Ok(Self::Centroid),
            "delegated" | "llm" => Ok(Self::Delegated),
            other => anyhow::bail!(
                "unknown clustering strategy {other:?} (expected density, centroid or delegated)"
            ),
        }
    }
}

/// Central configuration loaded from environment variables.
///
/// Every value has a default. The .env file is loaded at startup via
/// dotenvy, before `load` runs.
#[derive(Debug, Clone)]
pub struct Config {
    pub strategy: StrategyKind,
    /// Canonical taxonomy for forced clustering (NEWSMAP_CANONICAL_TOPICS, comma-separated)
    pub canonical_topics: Vec<String>,
    pub word2vec: Word2VecParams,
    pub surname_policy: SurnamePolicy,
    /// Minimum spacing between text generator calls
    pub min_interval: Duration,
    pub concurrency: usize,
    pub max_output_tokens: u32,
    /// Articles at or above this many characters are not annotated
    pub max_text_chars: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables take their defaults; set but malformed ones are an error.
    pub fn load() -> Result<Self> {
        let defaults = Word2VecParams::default();
        let word2vec = Word2VecParams {
            dim: env_parse("NEWSMAP_EMBEDDING_DIM", defaults.dim)?,
            window: env_parse("NEWSMAP_WINDOW", defaults.window)?,
            min_count: env_parse("NEWSMAP_MIN_COUNT", defaults.min_count)?,
            epochs: env_parse("NEWSMAP_EPOCHS", defaults.epochs)?,
            seed: env_parse("NEWSMAP_SEED", defaults.seed)?,
            ..defaults
        };
        if word2vec.dim == 0 {
            anyhow::bail!("NEWSMAP_EMBEDDING_DIM must be at least 1");
        }

        Ok(Self {
            strategy: env_parse("NEWSMAP_STRATEGY", StrategyKind::Density)?,
            canonical_topics: parse_list(&env::var("NEWSMAP_CANONICAL_TOPICS").unwrap_or_default()),
            word2vec,
            surname_policy: env_parse("NEWSMAP_SURNAME_POLICY", SurnamePolicy::default())?,
            min_interval: Duration::from_millis(env_parse("NEWSMAP_MIN_INTERVAL_MS", 3000u64)?),
            concurrency: env_parse("NEWSMAP_CONCURRENCY", 4usize)?.max(1),
            max_output_tokens: env_parse("NEWSMAP_MAX_OUTPUT_TOKENS", 1024u32)?,
            max_text_chars: env_parse("NEWSMAP_MAX_TEXT_CHARS", 15_000usize)?,
        })
    }

    /// Check that a canonical topic list is configured.
    /// Call this before forced (centroid) clustering.
    pub fn require_canonical_topics(&self) -> Result<()> {
        if self.canonical_topics.is_empty() {
            anyhow::bail!(
                "NEWSMAP_CANONICAL_TOPICS not set. Centroid clustering needs a \
                 comma-separated list of canonical topics.\n\
                 Add it to your .env file or pass --canonical-topics."
            );
        }
        Ok(())
    }

    /// Limiter spacing text generator calls by NEWSMAP_MIN_INTERVAL_MS.
    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.min_interval)
    }

    /// Annotation options derived from this config, windowed on the last month.
    pub fn annotate_options(&self) -> AnnotateOptions {
        AnnotateOptions {
            canonical: self.canonical_topics.clone(),
            window: Some(DateWindow::last_month(chrono::Local::now().date_naive())),
            max_text_chars: self.max_text_chars,
            max_output_tokens: self.max_output_tokens,
            concurrency: self.concurrency,
            ..AnnotateOptions::default()
        }
    }
}

/// Read and parse `key`, falling back to `default` when it is unset or blank.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw, default),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(default);
    }
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("invalid value {raw:?} for {key}"))
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
