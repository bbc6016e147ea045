// Composition tests: verifying that the stages chain together correctly.
//
// These tests exercise the data flow between modules:
//   TextGenerator -> extract -> ArticleRecord -> cluster + canonicalize
// with scripted generators standing in for a model provider. No network
// calls and no filesystem side effects.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use newsmap::error::ClusteringError;
use newsmap::llm::{RateLimiter, TextGenerator, Throttled};
use newsmap::persons::SurnamePolicy;
use newsmap::pipeline::{
    annotate_articles, normalize_records, AnnotateOptions, Article, ArticleRecord,
};
use newsmap::topics::delegated::cluster_delegated;
use newsmap::topics::{ClusterStrategy, TopicClusterer};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// One scripted article: the text it is recognised by and the raw answers
/// the "model" gives for it.
struct Script {
    marker: &'static str,
    topic: &'static str,
    persons: &'static str,
    delay_ms: u64,
    fail: bool,
}

/// Answers topic and persons prompts by looking up the article marker.
struct ScriptedGenerator {
    scripts: Vec<Script>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, prompt: &str, _max_output_tokens: u32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        let script = self
            .scripts
            .iter()
            .find(|s| prompt.contains(s.marker))
            .ok_or_else(|| anyhow::anyhow!("unscripted prompt"))?;

        tokio::time::sleep(Duration::from_millis(script.delay_ms)).await;
        if script.fail {
            anyhow::bail!("provider returned 503");
        }
        if prompt.contains("\"persons\"") {
            Ok(script.persons.to_string())
        } else {
            Ok(script.topic.to_string())
        }
    }
}

/// Returns the same canned answer to every prompt and records the prompts.
struct CannedGenerator {
    answer: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl CannedGenerator {
    fn ok(answer: &str) -> Self {
        Self {
            answer: Ok(answer.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            answer: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn complete(&self, prompt: &str, _max_output_tokens: u32) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer.clone().map_err(anyhow::Error::msg)
    }
}

fn article(newspaper: &str, text: &str) -> Article {
    Article {
        newspaper: newspaper.to_string(),
        text: text.to_string(),
        published: None,
    }
}

fn options() -> AnnotateOptions {
    AnnotateOptions {
        window: None,
        max_text_chars: 200,
        concurrency: 3,
        ..AnnotateOptions::default()
    }
}

// ============================================================
// Chain: annotate -> normalize
// ============================================================

#[tokio::test]
async fn annotate_then_normalize_forced() {
    let generator = ScriptedGenerator::new(vec![
        Script {
            marker: "[A1]",
            topic: r#"Certo! {"topic": "elezioni regionali"}"#,
            persons: r#"{"persons": ["mario rossi"]}"#,
            delay_ms: 0,
            fail: false,
        },
        Script {
            marker: "[A2]",
            topic: "{'topic': 'elezioni comunali'}",
            persons: "{'persons': ['Rossi']}",
            delay_ms: 0,
            fail: false,
        },
        Script {
            marker: "[A3]",
            topic: "Ecco: {\u{201C}topic\u{201D}: \u{201C}sport calcio\u{201D}}",
            persons: r#"{"persons": ["Bianchi"]}"#,
            delay_ms: 0,
            fail: false,
        },
        Script {
            marker: "[A4]",
            topic: "Non sono in grado di rispondere.",
            persons: r#"{"persons": []}"#,
            delay_ms: 0,
            fail: false,
        },
    ]);

    let long_text = format!("[A5] {}", "x".repeat(300));
    let articles = vec![
        article("Corriere", "[A1] Si vota in regione."),
        article("Repubblica", "[A2] Si vota in comune."),
        article("La Stampa", "[A3] Partita di campionato."),
        article("Il Giornale", "[A4] Articolo illeggibile."),
        article("Il Messaggero", &long_text),
    ];

    let records = annotate_articles(&generator, &articles, &options())
        .await
        .unwrap();

    // A4 had no recoverable topic; A5 was too long to send
    assert_eq!(records.len(), 3);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 8);
    assert!(generator
        .prompts
        .lock()
        .unwrap()
        .iter()
        .all(|p| !p.contains("[A5]")));

    let clusterer = TopicClusterer::new(ClusterStrategy::Centroid {
        canonical: strings(&["elezioni", "sport"]),
    });
    let normalized = normalize_records(records, &clusterer, SurnamePolicy::default())
        .await
        .unwrap();

    let topics: Vec<&str> = normalized.iter().map(|r| r.topic.as_str()).collect();
    assert_eq!(topics, vec!["elezioni", "elezioni", "sport"]);
    let newspapers: Vec<&str> = normalized.iter().map(|r| r.newspaper.as_str()).collect();
    assert_eq!(newspapers, vec!["Corriere", "Repubblica", "La Stampa"]);
    assert_eq!(normalized[0].persons, strings(&["Mario Rossi"]));
    assert_eq!(normalized[1].persons, strings(&["Mario Rossi"]));
    assert_eq!(normalized[2].persons, strings(&["Bianchi"]));
}

#[tokio::test]
async fn results_follow_input_order_not_completion_order() {
    // Earlier articles answer slower, so they complete last
    let scripts: Vec<Script> = vec![
        ("[B0]", r#"{"topic": "zero"}"#, 120),
        ("[B1]", r#"{"topic": "uno"}"#, 80),
        ("[B2]", r#"{"topic": "due"}"#, 40),
        ("[B3]", r#"{"topic": "tre"}"#, 0),
    ]
    .into_iter()
    .map(|(marker, topic, delay_ms)| Script {
        marker,
        topic,
        persons: r#"{"persons": []}"#,
        delay_ms,
        fail: false,
    })
    .collect();
    let generator = ScriptedGenerator::new(scripts);

    let articles: Vec<Article> = (0..4)
        .map(|i| article("Il Post", &format!("[B{i}] testo")))
        .collect();
    let options = AnnotateOptions {
        concurrency: 4,
        ..options()
    };

    let records = annotate_articles(&generator, &articles, &options)
        .await
        .unwrap();
    let topics: Vec<&str> = records.iter().map(|r| r.topic.as_str()).collect();
    assert_eq!(topics, vec!["zero", "uno", "due", "tre"]);
}

#[tokio::test]
async fn failed_call_drops_only_that_article() {
    let generator = ScriptedGenerator::new(vec![
        Script {
            marker: "[C1]",
            topic: r#"{"topic": "meteo"}"#,
            persons: r#"{"persons": []}"#,
            delay_ms: 0,
            fail: false,
        },
        Script {
            marker: "[C2]",
            topic: "",
            persons: "",
            delay_ms: 0,
            fail: true,
        },
    ]);
    let articles = vec![
        article("Avvenire", "[C1] Pioggia."),
        article("Avvenire", "[C2] Errore."),
    ];

    let records = annotate_articles(&generator, &articles, &options())
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].topic, "meteo");
}

#[tokio::test]
async fn canonical_topics_reach_the_topic_prompt() {
    let generator = CannedGenerator::ok(r#"{"topic": "sport", "persons": []}"#);
    let options = AnnotateOptions {
        canonical: strings(&["sport", "politica"]),
        ..options()
    };
    let records = annotate_articles(&generator, &[article("Il Foglio", "testo")], &options)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);

    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts
        .iter()
        .any(|p| p.contains("\"topic\"") && p.contains("[\"sport\", \"politica\"]")));
}

#[tokio::test]
async fn normalize_drops_empty_records_first() {
    let record = |topic: &str, persons: &[&str]| ArticleRecord {
        newspaper: "Il Post".to_string(),
        topic: topic.to_string(),
        persons: strings(persons),
        published: None,
    };
    let records = vec![
        record("", &["Rossi"]),
        record("economia", &["Rossi", "Mario Rossi"]),
        record("sport", &[]),
        record("economia", &[]),
        record("sport", &["Bianchi"]),
    ];

    let clusterer = TopicClusterer::new(ClusterStrategy::Density);
    let normalized = normalize_records(records, &clusterer, SurnamePolicy::default())
        .await
        .unwrap();

    let topics: Vec<&str> = normalized.iter().map(|r| r.topic.as_str()).collect();
    assert_eq!(topics, vec!["economia", "sport", "economia", "sport"]);
    // Both mentions resolve to the same person and collapse
    assert_eq!(normalized[0].persons, strings(&["Mario Rossi"]));
    assert_eq!(normalized[3].persons, strings(&["Bianchi"]));
}

// ============================================================
// Delegated clustering
// ============================================================

#[tokio::test]
async fn delegated_mapping_is_applied_to_topic_column() {
    let generator = CannedGenerator::ok(
        "Ecco i cluster: {'sport': ['calcio', 'tennis'], 'politica': ['elezioni europee']} spero vada bene {x}",
    );
    let topics = strings(&["calcio", "elezioni europee", "tennis", "meteo", "calcio"]);

    let labels = cluster_delegated(&generator, &topics, &[], 512).await.unwrap();
    assert_eq!(
        labels,
        strings(&["sport", "politica", "sport", "meteo", "sport"])
    );

    // Each distinct topic is listed once
    let prompts = generator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].matches("\"calcio\"").count(), 1);
}

#[tokio::test]
async fn delegated_topic_under_two_labels_takes_the_later() {
    let generator = CannedGenerator::ok(r#"{"economia": ["borsa", "tasse"], "politica": ["tasse"]}"#);
    let topics = strings(&["tasse", "borsa"]);
    let labels = cluster_delegated(&generator, &topics, &[], 512).await.unwrap();
    assert_eq!(labels, strings(&["politica", "economia"]));
}

#[tokio::test]
async fn delegated_garbage_keeps_topics() {
    let generator = CannedGenerator::ok("Mi dispiace, non posso aiutarti.");
    let topics = strings(&["calcio", "meteo"]);
    let labels = cluster_delegated(&generator, &topics, &[], 512).await.unwrap();
    assert_eq!(labels, topics);
}

#[tokio::test]
async fn delegated_generator_failure_is_surfaced() {
    let generator = CannedGenerator::failing("quota exceeded");
    let err = cluster_delegated(&generator, &strings(&["calcio"]), &[], 512)
        .await
        .unwrap_err();
    assert!(matches!(err, ClusteringError::Generation(_)));
    assert!(err.to_string().contains("quota exceeded"));
}

#[tokio::test]
async fn delegated_strategy_through_clusterer() {
    let generator: Arc<dyn TextGenerator> =
        Arc::new(CannedGenerator::ok(r#"{"economia": ["tasse", "inflazione"]}"#));
    let clusterer = TopicClusterer::new(ClusterStrategy::Delegated {
        generator,
        canonical: strings(&["economia"]),
        max_output_tokens: 256,
    });
    let labels = clusterer
        .assign(&strings(&["inflazione", "tasse"]))
        .await
        .unwrap();
    assert_eq!(labels, strings(&["economia", "economia"]));
}

// ============================================================
// Rate limiting at the capability boundary
// ============================================================

#[tokio::test]
async fn throttled_generator_spaces_calls() {
    let throttled = Throttled::new(
        CannedGenerator::ok("{}"),
        RateLimiter::new(Duration::from_millis(100)),
    );

    let start = tokio::time::Instant::now();
    for _ in 0..3 {
        throttled.complete("ping", 8).await.unwrap();
    }
    let elapsed = start.elapsed();
    assert!(
        elapsed >= Duration::from_millis(180),
        "Expected ~200ms for three calls, got {:?}",
        elapsed
    );
    assert_eq!(throttled.into_inner().prompts.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn throttled_generator_in_annotation() {
    let generator = Throttled::new(
        CannedGenerator::ok(r#"{"topic": "cronaca", "persons": ["Sergio Mattarella"]}"#),
        RateLimiter::new(Duration::from_millis(30)),
    );
    let articles = vec![article("Il Resto del Carlino", "a"), article("Il Tempo", "b")];

    let start = tokio::time::Instant::now();
    let records = annotate_articles(&generator, &articles, &options())
        .await
        .unwrap();
    // Four calls, three gaps
    assert!(start.elapsed() >= Duration::from_millis(80));
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].newspaper, "Il Tempo");
}
