// Small dense-vector helpers shared by the vectorizer and both clusterers.

/// Element-wise mean of a set of equal-length vectors.
///
/// Used to turn a topic's per-word vectors into a single topic vector.
/// Returns a zero vector of length `dim` when `vectors` is empty; entries
/// beyond `dim` are ignored.
pub fn mean_vector(vectors: &[&[f64]], dim: usize) -> Vec<f64> {
    let mut mean = vec![0.0_f64; dim];
    if vectors.is_empty() {
        return mean;
    }

    for v in vectors {
        for (slot, &val) in mean.iter_mut().zip(v.iter()) {
            *slot += val;
        }
    }

    let n = vectors.len() as f64;
    for val in &mut mean {
        *val /= n;
    }

    mean
}

/// Squared euclidean distance. Mismatched lengths compare over the shorter prefix.
pub fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    squared_euclidean(a, b).sqrt()
}
