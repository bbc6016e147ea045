// Topic vectorizer: one vector per topic string, trained on the batch itself.
//
// Each topic is one training sentence (tokens = whitespace split). After
// training, a topic's vector is the mean of its tokens' vectors. Vectors
// from two different calls live in different spaces and must not be
// stored or compared across batches.

use tracing::debug;

use super::vectors::mean_vector;
use super::word2vec::{Word2VecParams, WordVectors};
use crate::error::VectorizationError;

/// Vectorize `topics` with the default parameters.
pub fn vectorize(topics: &[String]) -> Result<Vec<Vec<f64>>, VectorizationError> {
    vectorize_with(topics, &Word2VecParams::default())
}

/// Vectorize `topics`, preserving input order and cardinality.
///
/// Fails on an empty batch, on a topic with no tokens, and on a topic
/// whose tokens were all dropped by `min_count`.
pub fn vectorize_with(
    topics: &[String],
    params: &Word2VecParams,
) -> Result<Vec<Vec<f64>>, VectorizationError> {
    if topics.is_empty() {
        return Err(VectorizationError::EmptyInput);
    }

    let sentences: Vec<Vec<&str>> = topics
        .iter()
        .map(|t| t.split_whitespace().collect())
        .collect();

    if let Some(index) = sentences.iter().position(Vec::is_empty) {
        return Err(VectorizationError::EmptyTopic { index });
    }

    let model = WordVectors::train(&sentences, params);

    let vectors = sentences
        .iter()
        .enumerate()
        .map(|(index, tokens)| {
            let known: Vec<&[f64]> = tokens.iter().filter_map(|t| model.get(t)).collect();
            if known.is_empty() {
                return Err(VectorizationError::NoKnownTokens {
                    index,
                    topic: topics[index].clone(),
                });
            }
            Ok(mean_vector(&known, model.dim()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        topics = topics.len(),
        vocab = model.len(),
        "Vectorized topic batch"
    );

    Ok(vectors)
}
