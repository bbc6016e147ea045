// Unit tests for the topic clusterer.
//
// Covers both deterministic regimes: forced assignment to a canonical list
// (k-means seeded with the canonical vectors) and free density clustering
// with the outlier sentinel.

use std::collections::HashMap;

use newsmap::error::ClusteringError;
use newsmap::topics::clusterer::label_clusters;
use newsmap::topics::{cluster, ClusterStrategy, TopicClusterer, OUTLIER_LABEL};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================
// Forced mode
// ============================================================

#[test]
fn forced_mode_assigns_canonical_labels() {
    let topics = strings(&["elezioni regionali", "elezioni comunali", "sport calcio"]);
    let canonical = strings(&["elezioni", "sport"]);
    let labels = cluster(&topics, Some(&canonical)).unwrap();
    assert_eq!(labels, strings(&["elezioni", "elezioni", "sport"]));
}

#[test]
fn forced_mode_labels_are_always_canonical() {
    let topics = strings(&[
        "riforma fiscale",
        "mercato del lavoro",
        "campionato di calcio",
        "elezioni europee",
        "inflazione",
        "riforma fiscale",
        "ciclismo",
    ]);
    let canonical = strings(&["economia", "sport", "politica"]);
    let labels = cluster(&topics, Some(&canonical)).unwrap();
    assert_eq!(labels.len(), topics.len());
    assert!(labels.iter().all(|l| canonical.contains(l)));
    // Same string, same label
    assert_eq!(labels[0], labels[5]);
}

#[test]
fn forced_mode_caps_k_at_topic_count() {
    let topics = strings(&["sport", "sport"]);
    let canonical = strings(&["sport", "economia", "politica", "cronaca"]);
    let labels = cluster(&topics, Some(&canonical)).unwrap();
    assert!(labels.iter().all(|l| l == "sport" || l == "economia"));
    assert_eq!(labels[0], labels[1]);
}

// ============================================================
// Free mode
// ============================================================

#[test]
fn free_mode_groups_repeated_topics() {
    let topics = strings(&["economia", "sport", "economia", "sport", "economia"]);
    let labels = cluster(&topics, None).unwrap();
    assert_eq!(
        labels,
        strings(&["economia", "sport", "economia", "sport", "economia"])
    );
}

#[test]
fn free_mode_small_clusters_are_outliers() {
    let topics = strings(&[
        "guerra in medio oriente",
        "festival di sanremo",
        "legge di bilancio",
        "sciopero dei trasporti",
        "guerra in medio oriente",
        "maltempo al nord",
        "legge di bilancio",
    ]);
    let labels = cluster(&topics, None).unwrap();
    assert_eq!(labels.len(), topics.len());

    let mut sizes: HashMap<&str, usize> = HashMap::new();
    for label in &labels {
        *sizes.entry(label.as_str()).or_default() += 1;
    }
    for (label, size) in sizes {
        if label != OUTLIER_LABEL {
            assert!(size >= 2, "{label:?} labels a cluster of {size}");
            assert!(topics.iter().any(|t| t == label));
        }
    }
}

#[test]
fn single_topic_is_an_outlier() {
    let labels = cluster(&strings(&["meteo"]), None).unwrap();
    assert_eq!(labels, vec![OUTLIER_LABEL.to_string()]);
}

#[test]
fn representative_is_stable_mode() {
    let topics = strings(&["voto", "elezioni", "elezioni", "voto", "urne"]);
    let ids = vec![Some(3); 5];
    assert_eq!(label_clusters(&topics, &ids), vec!["voto"; 5]);
}

// ============================================================
// Errors and strategy dispatch
// ============================================================

#[test]
fn empty_batch_is_an_error() {
    assert!(matches!(cluster(&[], None), Err(ClusteringError::EmptyInput)));
}

#[test]
fn blank_topic_surfaces_vectorization_error() {
    let err = cluster(&strings(&["sport", ""]), None).unwrap_err();
    assert!(matches!(err, ClusteringError::Vectorization(_)));
}

#[tokio::test]
async fn centroid_strategy_requires_canonical_topics() {
    let clusterer = TopicClusterer::new(ClusterStrategy::Centroid {
        canonical: Vec::new(),
    });
    let err = clusterer.assign(&strings(&["sport"])).await.unwrap_err();
    assert!(matches!(err, ClusteringError::NoCanonicalTopics));
}

#[tokio::test]
async fn strategy_matches_free_function() {
    let topics = strings(&["elezioni regionali", "elezioni comunali", "sport calcio"]);
    let canonical = strings(&["elezioni", "sport"]);
    let clusterer = TopicClusterer::new(ClusterStrategy::Centroid {
        canonical: canonical.clone(),
    });
    assert_eq!(
        clusterer.assign(&topics).await.unwrap(),
        cluster(&topics, Some(&canonical)).unwrap()
    );
}
