// Colored terminal output for normalized batches.
//
// main.rs delegates all display here: topic distributions, person
// mentions and per-topic cluster assignments.

use std::collections::HashMap;

use colored::Colorize;

use crate::pipeline::ArticleRecord;
use crate::topics::OUTLIER_LABEL;

/// Count occurrences, most frequent first; ties keep first-seen order.
pub fn frequencies<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        let n = counts.entry(value).or_insert(0);
        if *n == 0 {
            order.push(value);
        }
        *n += 1;
    }
    let mut out: Vec<(&str, usize)> = order.into_iter().map(|v| (v, counts[v])).collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

/// Display the topic distribution and most-mentioned persons of a batch.
pub fn display_batch_summary(records: &[ArticleRecord]) {
    if records.is_empty() {
        println!("No records left after normalization.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Normalized batch ({} articles) ===", records.len()).bold()
    );
    println!();

    let topics = frequencies(records.iter().map(|r| r.topic.as_str()));
    let widest = topics.first().map_or(1, |(_, n)| *n);
    println!("  {:<32} {:>5}", "Topic".dimmed(), "Count".dimmed());
    println!("  {}", "-".repeat(60).dimmed());
    for (topic, count) in &topics {
        let bar = "#".repeat((count * 20).div_ceil(widest));
        println!(
            "  {:<32} {:>5}  {}",
            colorize_label(&crate::output::truncate_chars(topic, 30)),
            count,
            bar.cyan()
        );
    }

    let persons = frequencies(
        records
            .iter()
            .flat_map(|r| r.persons.iter().map(String::as_str)),
    );
    if !persons.is_empty() {
        println!("\n  {}", "Most mentioned".bold());
        for (name, count) in persons.iter().take(10) {
            println!("    {:<30} {}", name, count.to_string().dimmed());
        }
    }

    let newspapers = frequencies(records.iter().map(|r| r.newspaper.as_str()));
    println!(
        "\n  {} {} newspapers",
        "~".yellow(),
        newspapers.len()
    );
}

/// Display each input topic next to the label it was assigned.
pub fn display_assignments(topics: &[String], labels: &[String]) {
    println!("\n{}", format!("=== {} topics ===", topics.len()).bold());
    println!();
    for (topic, label) in topics.iter().zip(labels) {
        println!("  {:<40} -> {}", topic, colorize_label(label));
    }
    let outliers = labels.iter().filter(|l| *l == OUTLIER_LABEL).count();
    if outliers > 0 {
        println!("\n  {} {} outliers", "!".bright_red(), outliers);
    }
}

/// Outliers stand out, real labels are green.
fn colorize_label(label: &str) -> colored::ColoredString {
    if label == OUTLIER_LABEL {
        label.dimmed()
    } else {
        label.green()
    }
}
