// Per-batch word embeddings: a small CBOW word2vec trained from scratch.
//
// Every call trains a fresh model on exactly the sentences it is given, so
// vectors are only comparable within one training run. Word vectors start
// from a deterministic per-word seed (xxh3 of the word plus the run seed),
// which means the same word starts at the same point in two separate runs.
// On topic-sized corpora training only nudges those starting points, so two
// independent runs over overlapping vocabularies stay geometrically aligned.
//
// Training is single-threaded and fully seeded: the same sentences and
// parameters always produce the same vectors.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Default embedding dimensionality.
pub const EMBEDDING_DIM: usize = 100;

/// Training hyperparameters. Defaults follow the usual word2vec settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Word2VecParams {
    /// Vector dimensionality
    pub dim: usize,
    /// Maximum distance between the target word and a context word
    pub window: usize,
    /// Words seen fewer times than this are dropped from the vocabulary
    pub min_count: usize,
    /// Passes over the corpus
    pub epochs: usize,
    /// Negative samples drawn per target word
    pub negative: usize,
    /// Initial learning rate, decayed linearly to `min_alpha`
    pub alpha: f64,
    pub min_alpha: f64,
    /// Seed for initialization and sampling
    pub seed: u64,
}

impl Default for Word2VecParams {
    fn default() -> Self {
        Self {
            dim: EMBEDDING_DIM,
            window: 5,
            min_count: 1,
            epochs: 5,
            negative: 5,
            alpha: 0.025,
            min_alpha: 0.0001,
            seed: 1,
        }
    }
}

/// Trained word vectors for one batch.
#[derive(Debug, Clone)]
pub struct WordVectors {
    index: HashMap<String, usize>,
    vectors: Vec<Vec<f64>>,
    dim: usize,
}

impl WordVectors {
    /// Train a CBOW model with negative sampling on `sentences`.
    ///
    /// Each sentence is a list of tokens. The vocabulary is built in
    /// first-seen order from tokens occurring at least `min_count` times.
    pub fn train(sentences: &[Vec<&str>], params: &Word2VecParams) -> Self {
        let dim = params.dim.max(1);

        // Vocabulary in first-seen order so indices are reproducible
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for sentence in sentences {
            for &token in sentence {
                let count = counts.entry(token).or_insert(0);
                if *count == 0 {
                    order.push(token);
                }
                *count += 1;
            }
        }

        let vocab: Vec<&str> = order
            .into_iter()
            .filter(|w| counts[w] >= params.min_count)
            .collect();
        let index: HashMap<String, usize> = vocab
            .iter()
            .enumerate()
            .map(|(i, w)| (w.to_string(), i))
            .collect();

        let mut input: Vec<Vec<f64>> = vocab
            .iter()
            .map(|w| seeded_vector(w, dim, params.seed))
            .collect();

        if vocab.is_empty() {
            return Self {
                index,
                vectors: input,
                dim,
            };
        }

        let corpus: Vec<Vec<usize>> = sentences
            .iter()
            .map(|s| s.iter().filter_map(|t| index.get(*t).copied()).collect())
            .collect();

        let unigram = cumulative_unigram(&vocab, &counts);
        let mut output: Vec<Vec<f64>> = vec![vec![0.0; dim]; vocab.len()];
        let mut rng = StdRng::seed_from_u64(params.seed);

        let words_per_epoch: usize = corpus.iter().map(Vec::len).sum();
        let total = (words_per_epoch * params.epochs).max(1) as f64;
        let mut processed = 0usize;
        let mut updates = 0usize;

        for _ in 0..params.epochs {
            for sentence in &corpus {
                for pos in 0..sentence.len() {
                    let progress = processed as f64 / total;
                    let alpha = (params.alpha - (params.alpha - params.min_alpha) * progress)
                        .max(params.min_alpha);
                    processed += 1;

                    // Reduced window, as in the reference word2vec
                    let shrink = if params.window > 0 {
                        rng.random_range(0..params.window)
                    } else {
                        0
                    };
                    let reach = params.window - shrink;
                    let start = pos.saturating_sub(reach);
                    let end = (pos + reach).min(sentence.len() - 1);
                    let context: Vec<usize> = (start..=end)
                        .filter(|&j| j != pos)
                        .map(|j| sentence[j])
                        .collect();
                    if context.is_empty() {
                        continue;
                    }

                    let context_vectors: Vec<&[f64]> =
                        context.iter().map(|&c| input[c].as_slice()).collect();
                    let hidden = super::vectors::mean_vector(&context_vectors, dim);
                    let mut error = vec![0.0_f64; dim];

                    let target = sentence[pos];
                    for d in 0..=params.negative {
                        let (word, label) = if d == 0 {
                            (target, 1.0)
                        } else {
                            let sample = sample_unigram(&unigram, &mut rng);
                            if sample == target {
                                continue;
                            }
                            (sample, 0.0)
                        };

                        let out = &mut output[word];
                        let dot: f64 = hidden.iter().zip(out.iter()).map(|(h, o)| h * o).sum();
                        let g = (label - sigmoid(dot)) * alpha;
                        for k in 0..dim {
                            error[k] += g * out[k];
                            out[k] += g * hidden[k];
                        }
                    }

                    for &c in &context {
                        for (slot, e) in input[c].iter_mut().zip(error.iter()) {
                            *slot += e;
                        }
                    }
                    updates += 1;
                }
            }
        }

        debug!(
            vocab = vocab.len(),
            sentences = sentences.len(),
            updates = updates,
            dim = dim,
            "Trained per-batch word vectors"
        );

        Self {
            index,
            vectors: input,
            dim,
        }
    }

    /// Vector for `word`, if it made it into the vocabulary.
    pub fn get(&self, word: &str) -> Option<&[f64]> {
        self.index.get(word).map(|&i| self.vectors[i].as_slice())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

/// Starting vector for a word: uniform in [-0.5, 0.5) / dim, seeded by the word itself.
fn seeded_vector(word: &str, dim: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(xxh3_64_with_seed(word.as_bytes(), seed));
    (0..dim)
        .map(|_| (rng.random::<f64>() - 0.5) / dim as f64)
        .collect()
}

/// Cumulative count^0.75 distribution used for negative sampling.
fn cumulative_unigram(vocab: &[&str], counts: &HashMap<&str, usize>) -> Vec<f64> {
    let mut acc = 0.0;
    vocab
        .iter()
        .map(|w| {
            acc += (counts[w] as f64).powf(0.75);
            acc
        })
        .collect()
}

fn sample_unigram(cumulative: &[f64], rng: &mut StdRng) -> usize {
    let total = cumulative.last().copied().unwrap_or(0.0);
    let r = rng.random::<f64>() * total;
    cumulative
        .partition_point(|&c| c <= r)
        .min(cumulative.len() - 1)
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentences<'a>(topics: &'a [&'a str]) -> Vec<Vec<&'a str>> {
        topics.iter().map(|t| t.split_whitespace().collect()).collect()
    }

    #[test]
    fn test_vocab_in_first_seen_order() {
        let model = WordVectors::train(
            &sentences(&["elezioni regionali", "elezioni comunali"]),
            &Word2VecParams::default(),
        );
        assert_eq!(model.len(), 3);
        assert_eq!(model.index["elezioni"], 0);
        assert_eq!(model.index["regionali"], 1);
        assert_eq!(model.index["comunali"], 2);
    }

    #[test]
    fn test_min_count_drops_rare_words() {
        let params = Word2VecParams {
            min_count: 2,
            ..Word2VecParams::default()
        };
        let model = WordVectors::train(&sentences(&["a b", "a c"]), &params);
        assert!(model.get("a").is_some());
        assert!(model.get("b").is_none());
        assert!(model.get("c").is_none());
    }

    #[test]
    fn test_training_is_deterministic() {
        let corpus = sentences(&["sport calcio", "sport tennis", "calcio serie a"]);
        let params = Word2VecParams::default();
        let a = WordVectors::train(&corpus, &params);
        let b = WordVectors::train(&corpus, &params);
        assert_eq!(a.get("calcio"), b.get("calcio"));
        assert_eq!(a.get("serie"), b.get("serie"));
    }

    #[test]
    fn test_single_word_sentence_keeps_seeded_vector() {
        // No context means no update, so the word sits at its seeded start
        let params = Word2VecParams::default();
        let model = WordVectors::train(&sentences(&["elezioni"]), &params);
        let expected = seeded_vector("elezioni", params.dim, params.seed);
        assert_eq!(model.get("elezioni"), Some(expected.as_slice()));
    }

    #[test]
    fn test_seeded_vector_range() {
        let v = seeded_vector("economia", 100, 1);
        assert_eq!(v.len(), 100);
        assert!(v.iter().all(|x| x.abs() <= 0.5 / 100.0));
    }

    #[test]
    fn test_empty_corpus() {
        let model = WordVectors::train(&[], &Word2VecParams::default());
        assert!(model.is_empty());
        assert_eq!(model.dim(), EMBEDDING_DIM);
    }
}
