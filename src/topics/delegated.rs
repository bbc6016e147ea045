// Delegated clustering: the text generator groups the topics itself.
//
// The batch goes out as one prompt listing each distinct topic once. The
// reply is expected to be `{"label": ["topic", ...]}`; it is recovered with
// `extract`, inverted, and applied as a substitution over the topic column.
// Topics the reply does not mention keep their original string.

use tracing::{debug, warn};

use crate::error::ClusteringError;
use crate::extract::{self, mapping};
use crate::llm::{prompts, TextGenerator};

/// Distinct values in first-seen order.
pub fn unique_in_order(values: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .iter()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}

pub async fn cluster_delegated(
    generator: &dyn TextGenerator,
    topics: &[String],
    canonical: &[String],
    max_output_tokens: u32,
) -> Result<Vec<String>, ClusteringError> {
    if topics.is_empty() {
        return Err(ClusteringError::EmptyInput);
    }

    let distinct = unique_in_order(topics);
    let prompt = prompts::cluster_prompt(&distinct, canonical);
    let response = generator
        .complete(&prompt, max_output_tokens)
        .await
        .map_err(ClusteringError::Generation)?;

    let groups = extract::extract(&response);
    let Some(map) = groups.as_object().filter(|m| !m.is_empty()) else {
        warn!(
            topics = distinct.len(),
            "Delegated clustering returned no usable mapping, keeping topics as-is"
        );
        return Ok(topics.to_vec());
    };

    if !canonical.is_empty() {
        let unknown: Vec<&String> = map.keys().filter(|k| !canonical.contains(*k)).collect();
        if !unknown.is_empty() {
            warn!(labels = ?unknown, "Delegated clustering used labels outside the canonical list");
        }
    }

    let normalized = mapping::replace_from_groups(topics, &groups);
    let unchanged = topics
        .iter()
        .zip(&normalized)
        .filter(|(before, after)| before == after)
        .count();
    debug!(
        clusters = map.len(),
        topics = distinct.len(),
        unchanged = unchanged,
        "Applied delegated clustering"
    );

    Ok(normalized)
}
