// Topic normalization: per-batch vectors, clustering and labelling.

pub mod clusterer;
pub mod delegated;
pub mod hdbscan;
pub mod kmeans;
pub mod vectorizer;
pub mod vectors;
pub mod word2vec;

pub use clusterer::{cluster, cluster_with, ClusterStrategy, TopicClusterer, OUTLIER_LABEL};
pub use vectorizer::{vectorize, vectorize_with};
pub use word2vec::Word2VecParams;
