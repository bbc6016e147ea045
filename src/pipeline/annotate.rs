// Annotation stage: ask the text generator for each article's topic and
// persons.
//
// Articles outside the date window, or too long to send, are skipped up
// front. The rest run with bounded concurrency. Completion order is not
// submission order, so every result carries its batch offset and the output
// is re-sorted on it. A failed call or an unrecoverable response drops that
// one article and never the batch.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use super::records::{Article, ArticleRecord, DateWindow};
use crate::extract::{extract_as, PersonsAnnotation, TopicAnnotation};
use crate::llm::{prompts, TextGenerator};

/// Tuning for `annotate_articles`.
#[derive(Debug, Clone)]
pub struct AnnotateOptions {
    /// When non-empty, the topic prompt restricts answers to this list
    pub canonical: Vec<String>,
    /// Articles dated outside this window are skipped. Undated articles are kept.
    pub window: Option<DateWindow>,
    /// Articles whose text has at least this many characters are skipped
    pub max_text_chars: usize,
    /// Summarize before asking for topic and persons
    pub summarize: bool,
    pub summary_max_tokens: u32,
    pub max_output_tokens: u32,
    pub concurrency: usize,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            canonical: Vec::new(),
            window: Some(DateWindow::last_month(chrono::Local::now().date_naive())),
            max_text_chars: 15_000,
            summarize: false,
            summary_max_tokens: 200,
            max_output_tokens: 1024,
            concurrency: 4,
        }
    }
}

/// Why an article never reached the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    OutsideWindow,
    TooLong,
}

/// Decide whether `article` should be annotated at all.
pub fn skip_reason(article: &Article, options: &AnnotateOptions) -> Option<SkipReason> {
    if let (Some(window), Some(published)) = (options.window, article.published) {
        if !window.contains(published) {
            return Some(SkipReason::OutsideWindow);
        }
    }
    if article.text.chars().count() >= options.max_text_chars {
        return Some(SkipReason::TooLong);
    }
    None
}

/// Annotate every eligible article, in input order.
pub async fn annotate_articles(
    generator: &dyn TextGenerator,
    articles: &[Article],
    options: &AnnotateOptions,
) -> Result<Vec<ArticleRecord>> {
    let mut eligible = Vec::with_capacity(articles.len());
    for (index, article) in articles.iter().enumerate() {
        match skip_reason(article, options) {
            Some(reason) => debug!(
                index = index,
                newspaper = %article.newspaper,
                reason = ?reason,
                "Skipping article"
            ),
            None => eligible.push((index, article)),
        }
    }

    info!(
        articles = articles.len(),
        eligible = eligible.len(),
        concurrency = options.concurrency,
        "Annotating articles"
    );

    let pb = ProgressBar::new(eligible.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Annotating [{bar:30}] {pos}/{len} ({eta})")
            .context("invalid progress bar template")?,
    );

    let mut results: Vec<(usize, Result<Option<ArticleRecord>>)> =
        stream::iter(eligible.into_iter().map(|(index, article)| async move {
            let result = annotate_one(generator, article, options).await;
            (index, result)
        }))
        .buffer_unordered(options.concurrency.max(1))
        .inspect(|_| pb.inc(1))
        .collect()
        .await;
    pb.finish_and_clear();

    results.sort_by_key(|(index, _)| *index);

    let mut records = Vec::with_capacity(results.len());
    let mut dropped = 0usize;
    for (index, result) in results {
        match result {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {
                dropped += 1;
                warn!(index = index, "Annotation not recoverable, dropping article");
            }
            Err(e) => {
                dropped += 1;
                warn!(index = index, error = %e, "Failed to annotate article, skipping");
            }
        }
    }

    info!(
        annotated = records.len(),
        dropped = dropped,
        "Annotation finished"
    );
    Ok(records)
}

/// Annotate one article. `Ok(None)` means a response came back but held no
/// usable object.
pub async fn annotate_one(
    generator: &dyn TextGenerator,
    article: &Article,
    options: &AnnotateOptions,
) -> Result<Option<ArticleRecord>> {
    let text = if options.summarize {
        generator
            .complete(&prompts::summary_prompt(&article.text), options.summary_max_tokens)
            .await
            .context("summary call failed")?
    } else {
        article.text.clone()
    };

    let topic_raw = generator
        .complete(
            &prompts::topic_prompt(&text, &options.canonical),
            options.max_output_tokens,
        )
        .await
        .context("topic call failed")?;
    let persons_raw = generator
        .complete(&prompts::persons_prompt(&text), options.max_output_tokens)
        .await
        .context("persons call failed")?;

    let (Some(topic), Some(persons)) = (
        extract_as::<TopicAnnotation>(&topic_raw),
        extract_as::<PersonsAnnotation>(&persons_raw),
    ) else {
        return Ok(None);
    };

    Ok(Some(ArticleRecord {
        newspaper: article.newspaper.clone(),
        topic: topic.topic,
        persons: persons.persons,
        published: article.published,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn article(text: &str, published: Option<NaiveDate>) -> Article {
        Article {
            newspaper: "Il Foglio".to_string(),
            text: text.to_string(),
            published,
        }
    }

    #[test]
    fn test_skip_reasons() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();
        let options = AnnotateOptions {
            window: Some(DateWindow::new(day(1), day(10))),
            max_text_chars: 5,
            ..AnnotateOptions::default()
        };

        assert_eq!(skip_reason(&article("abc", Some(day(5))), &options), None);
        assert_eq!(skip_reason(&article("abc", None), &options), None);
        assert_eq!(
            skip_reason(&article("abc", Some(day(11))), &options),
            Some(SkipReason::OutsideWindow)
        );
        assert_eq!(
            skip_reason(&article("abcde", Some(day(5))), &options),
            Some(SkipReason::TooLong)
        );
    }
}
