// Error taxonomy for the normalization core.
//
// Vectorization and clustering errors are caller contract violations (an
// empty batch, a forced run without canonical topics) and are returned to
// the caller. Extraction failures never leave the `extract` module: they are
// logged and downgraded to the empty value there.

use thiserror::Error;

/// Raised when a batch of topics cannot be turned into vectors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VectorizationError {
    #[error("no topics to vectorize")]
    EmptyInput,

    #[error("topic at index {index} has no tokens")]
    EmptyTopic { index: usize },

    /// Every token of the topic fell below the minimum frequency.
    #[error("topic at index {index} ({topic:?}) has no token in the trained vocabulary")]
    NoKnownTokens { index: usize, topic: String },
}

/// Raised by every clustering strategy.
#[derive(Debug, Error)]
pub enum ClusteringError {
    #[error("no topics to cluster")]
    EmptyInput,

    #[error("centroid clustering requested without canonical topics")]
    NoCanonicalTopics,

    #[error(transparent)]
    Vectorization(#[from] VectorizationError),

    #[error("centroid partitioning failed: {0}")]
    Partition(#[from] linfa_clustering::KMeansError),

    /// The text-generation capability failed during delegated clustering.
    #[error("text generation failed: {0:#}")]
    Generation(anyhow::Error),
}
