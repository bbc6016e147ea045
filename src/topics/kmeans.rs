// K-means from fixed initial centroids, on top of linfa.
//
// Forced clustering pins each cluster to a canonical topic, so there is a
// single initialization pass: the supplied centroids, no random restarts.
// Cluster ids are the row indices of the initial centroids.

use linfa::dataset::AsTargets;
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_clustering::{KMeans, KMeansError, KMeansInit};
use ndarray::Array2;
use tracing::debug;

/// Upper bound on k-means iterations.
pub const MAX_ITERATIONS: u64 = 300;

/// Centroid movement below which a run counts as converged.
pub const TOLERANCE: f64 = 1e-8;

/// Result of a k-means run.
#[derive(Debug, Clone)]
pub struct KMeansFit {
    /// Cluster id per input point, in input order
    pub assignments: Vec<usize>,
    /// Final centroid per cluster id
    pub centroids: Vec<Vec<f64>>,
}

/// Pack equal-length rows into an `n x dim` matrix.
fn to_matrix(rows: &[Vec<f64>], dim: usize) -> Array2<f64> {
    let mut matrix = Array2::zeros((rows.len(), dim));
    for (i, row) in rows.iter().enumerate() {
        for (j, &val) in row.iter().enumerate() {
            matrix[[i, j]] = val;
        }
    }
    matrix
}

/// Run k-means starting from `initial` centroids.
///
/// Points go to the nearest centroid (lowest id on ties). A cluster that
/// loses all its points keeps its previous centroid, so ids stay aligned
/// with the rows of `initial`.
pub fn fit_from_centroids(
    data: &[Vec<f64>],
    initial: Vec<Vec<f64>>,
    max_iterations: u64,
) -> Result<KMeansFit, KMeansError> {
    if data.is_empty() || initial.is_empty() {
        return Ok(KMeansFit {
            assignments: Vec::new(),
            centroids: initial,
        });
    }

    let k = initial.len();
    let dim = data[0].len();
    let dataset = DatasetBase::from(to_matrix(data, dim));

    let model = KMeans::params(k)
        .init_method(KMeansInit::Precomputed(to_matrix(&initial, dim)))
        .n_runs(1)
        .max_n_iterations(max_iterations)
        .tolerance(TOLERANCE)
        .fit(&dataset)?;

    let predictions = model.predict(&dataset);
    let assignments: Vec<usize> = predictions.as_targets().iter().copied().collect();
    let centroids = model
        .centroids()
        .rows()
        .into_iter()
        .map(|row| row.to_vec())
        .collect();

    debug!(points = data.len(), clusters = k, "K-means converged");

    Ok(KMeansFit {
        assignments,
        centroids,
    })
}
