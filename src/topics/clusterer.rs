// Topic clusterer: one label per input topic, same order.
//
// Forced mode (canonical topics supplied): topics and canonical topics are
// vectorized in two separate training runs, the canonical vectors seed
// k-means as fixed initial centroids, and each topic takes the canonical
// label of its cluster. Free mode: density clustering over the topic
// vectors, each cluster labelled by its most frequent member string.
// Delegated mode hands the batch to a text generator instead.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::delegated::cluster_delegated;
use super::hdbscan::{self, HdbscanParams};
use super::kmeans::{fit_from_centroids, MAX_ITERATIONS};
use super::vectorizer::vectorize_with;
use super::word2vec::Word2VecParams;
use crate::error::ClusteringError;
use crate::llm::TextGenerator;

/// Label given to outliers and to clusters too small to be representative.
pub const OUTLIER_LABEL: &str = "__outlier__";

/// Smallest cluster that gets a representative label in free mode.
pub const MIN_CLUSTER_MEMBERS: usize = 2;

/// Cluster with default vectorizer parameters.
///
/// `Some` non-empty `canonical` selects forced mode; `None` or an empty
/// list selects free mode.
pub fn cluster(
    topics: &[String],
    canonical: Option<&[String]>,
) -> Result<Vec<String>, ClusteringError> {
    cluster_with(topics, canonical, &Word2VecParams::default())
}

pub fn cluster_with(
    topics: &[String],
    canonical: Option<&[String]>,
    params: &Word2VecParams,
) -> Result<Vec<String>, ClusteringError> {
    match canonical {
        Some(canonical) if !canonical.is_empty() => cluster_centroid(topics, canonical, params),
        _ => cluster_density(topics, params),
    }
}

/// Forced mode: every output label is a member of `canonical`.
pub fn cluster_centroid(
    topics: &[String],
    canonical: &[String],
    params: &Word2VecParams,
) -> Result<Vec<String>, ClusteringError> {
    if topics.is_empty() {
        return Err(ClusteringError::EmptyInput);
    }
    if canonical.is_empty() {
        return Err(ClusteringError::NoCanonicalTopics);
    }

    let topic_vectors = vectorize_with(topics, params)?;
    let canonical_vectors = vectorize_with(canonical, params)?;

    let k = canonical.len().min(topics.len());
    let initial: Vec<Vec<f64>> = canonical_vectors[..k].to_vec();

    let mut data = topic_vectors;
    data.extend(canonical_vectors);

    let fit = fit_from_centroids(&data, initial, MAX_ITERATIONS)?;

    debug!(
        topics = topics.len(),
        canonical = canonical.len(),
        k = k,
        "Centroid clustering converged"
    );

    Ok(fit.assignments[..topics.len()]
        .iter()
        .map(|&id| canonical[id].clone())
        .collect())
}

/// Free mode: density clusters labelled by their stable mode.
pub fn cluster_density(
    topics: &[String],
    params: &Word2VecParams,
) -> Result<Vec<String>, ClusteringError> {
    if topics.is_empty() {
        return Err(ClusteringError::EmptyInput);
    }

    let vectors = vectorize_with(topics, params)?;
    let hdbscan_params = HdbscanParams {
        min_cluster_size: MIN_CLUSTER_MEMBERS,
        ..HdbscanParams::default()
    };
    let ids = hdbscan::fit(&vectors, &hdbscan_params);
    let labels = label_clusters(topics, &ids);

    let outliers = labels.iter().filter(|l| *l == OUTLIER_LABEL).count();
    debug!(
        topics = topics.len(),
        outliers = outliers,
        "Density clustering finished"
    );

    Ok(labels)
}

/// Map every topic to its cluster's representative label.
///
/// The representative is the most frequent member string, ties going to
/// the one seen first. `None` ids and clusters with fewer than
/// `MIN_CLUSTER_MEMBERS` members get `OUTLIER_LABEL`.
pub fn label_clusters(topics: &[String], ids: &[Option<usize>]) -> Vec<String> {
    // cluster id -> member strings with counts, in first-seen order
    let mut members: HashMap<usize, Vec<(&str, usize)>> = HashMap::new();
    let mut sizes: HashMap<usize, usize> = HashMap::new();

    for (topic, id) in topics.iter().zip(ids.iter()) {
        let Some(id) = id else { continue };
        *sizes.entry(*id).or_default() += 1;
        let counts = members.entry(*id).or_default();
        match counts.iter_mut().find(|(t, _)| *t == topic.as_str()) {
            Some((_, n)) => *n += 1,
            None => counts.push((topic.as_str(), 1)),
        }
    }

    let representatives: HashMap<usize, &str> = members
        .iter()
        .filter(|(id, _)| sizes[*id] >= MIN_CLUSTER_MEMBERS)
        .filter_map(|(id, counts)| {
            let mut best: Option<(&str, usize)> = None;
            for &(topic, n) in counts {
                if best.map_or(true, |(_, top)| n > top) {
                    best = Some((topic, n));
                }
            }
            best.map(|(topic, _)| (*id, topic))
        })
        .collect();

    ids.iter()
        .map(|id| {
            id.and_then(|id| representatives.get(&id))
                .map_or_else(|| OUTLIER_LABEL.to_string(), |t| t.to_string())
        })
        .collect()
}

/// How a batch of topics is clustered.
#[derive(Clone)]
pub enum ClusterStrategy {
    /// Unsupervised density clustering.
    Density,
    /// Forced assignment to a canonical taxonomy.
    Centroid { canonical: Vec<String> },
    /// One call to an external text generator.
    Delegated {
        generator: Arc<dyn TextGenerator>,
        canonical: Vec<String>,
        max_output_tokens: u32,
    },
}

impl ClusterStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Density => "density",
            Self::Centroid { .. } => "centroid",
            Self::Delegated { .. } => "delegated",
        }
    }
}

impl std::fmt::Debug for ClusterStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Density => f.write_str("Density"),
            Self::Centroid { canonical } => f
                .debug_struct("Centroid")
                .field("canonical", canonical)
                .finish(),
            Self::Delegated {
                canonical,
                max_output_tokens,
                ..
            } => f
                .debug_struct("Delegated")
                .field("canonical", canonical)
                .field("max_output_tokens", max_output_tokens)
                .finish_non_exhaustive(),
        }
    }
}

/// Clusters topic batches with a configured strategy.
#[derive(Debug, Clone)]
pub struct TopicClusterer {
    pub strategy: ClusterStrategy,
    pub params: Word2VecParams,
}

impl TopicClusterer {
    pub fn new(strategy: ClusterStrategy) -> Self {
        Self {
            strategy,
            params: Word2VecParams::default(),
        }
    }

    pub fn with_params(mut self, params: Word2VecParams) -> Self {
        self.params = params;
        self
    }

    /// One label per topic, same order, for whichever strategy is set.
    pub async fn assign(&self, topics: &[String]) -> Result<Vec<String>, ClusteringError> {
        let labels = match &self.strategy {
            ClusterStrategy::Density => cluster_density(topics, &self.params)?,
            ClusterStrategy::Centroid { canonical } => {
                cluster_centroid(topics, canonical, &self.params)?
            }
            ClusterStrategy::Delegated {
                generator,
                canonical,
                max_output_tokens,
            } => {
                cluster_delegated(generator.as_ref(), topics, canonical, *max_output_tokens)
                    .await?
            }
        };

        let mut distinct: Vec<&str> = labels.iter().map(String::as_str).collect();
        distinct.sort_unstable();
        distinct.dedup();
        info!(
            strategy = self.strategy.name(),
            topics = topics.len(),
            labels = distinct.len(),
            "Clustered topics"
        );

        Ok(labels)
    }
}
