// Batch normalization of annotated records.
//
// Drops rows without a topic, replaces every topic with its cluster label,
// then fixes up persons: title-case, flatten to one mention per row,
// resolve bare surnames across the whole batch, and regroup per article.

use tracing::{info, warn};

use super::records::ArticleRecord;
use crate::error::ClusteringError;
use crate::persons::{canonicalize_with, title_case, SurnamePolicy};
use crate::topics::TopicClusterer;

/// Normalize a batch. Output keeps input order, minus empty rows.
pub async fn normalize_records(
    records: Vec<ArticleRecord>,
    clusterer: &TopicClusterer,
    policy: SurnamePolicy,
) -> Result<Vec<ArticleRecord>, ClusteringError> {
    let total = records.len();
    let mut records: Vec<ArticleRecord> = records.into_iter().filter(|r| !r.is_empty()).collect();
    if records.len() < total {
        warn!(
            dropped = total - records.len(),
            "Dropped records without a topic"
        );
    }
    if records.is_empty() {
        warn!("Nothing left to normalize");
        return Ok(records);
    }

    let topics: Vec<String> = records.iter().map(|r| r.topic.clone()).collect();
    let labels = clusterer.assign(&topics).await?;
    for (record, label) in records.iter_mut().zip(labels) {
        record.topic = label;
    }

    let persons: Vec<Vec<String>> = records
        .iter()
        .map(|r| r.persons.clone())
        .collect();
    for (record, names) in records.iter_mut().zip(normalize_persons(&persons, policy)) {
        record.persons = names;
    }

    info!(records = records.len(), "Normalized batch");
    Ok(records)
}

/// Title-case and canonicalize person lists across a batch.
///
/// Surnames resolve against full names from any article in the batch.
/// Blank names are dropped and duplicates within one article collapse to
/// their first occurrence.
pub fn normalize_persons(persons: &[Vec<String>], policy: SurnamePolicy) -> Vec<Vec<String>> {
    // One (article, name) row per mention
    let mut owners = Vec::new();
    let mut names = Vec::new();
    for (row, list) in persons.iter().enumerate() {
        for name in list {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            owners.push(row);
            names.push(title_case(name));
        }
    }

    let canonical = canonicalize_with(&names, policy);

    let mut grouped: Vec<Vec<String>> = vec![Vec::new(); persons.len()];
    for (row, name) in owners.into_iter().zip(canonical) {
        if !grouped[row].contains(&name) {
            grouped[row].push(name);
        }
    }
    grouped
}
