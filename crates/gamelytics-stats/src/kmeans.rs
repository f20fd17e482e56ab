//! k-means clustering with k-means++ seeding and multiple restarts.
//!
//! The implementation is Lloyd's algorithm over dense `f64` rows using
//! squared Euclidean distance. Every restart draws its initial centroids from
//! its own PCG stream derived from the caller's seed, so a fit is fully
//! reproducible for a given `(points, params)` pair.
//!
//! # Examples
//!
//! ```
//! use gamelytics_stats::kmeans::{KMeansParams, fit};
//!
//! let points = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.0],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.0],
//! ];
//! let result = fit(&points, &KMeansParams::new(2, 42)).unwrap();
//! assert_eq!(result.assignments[0], result.assignments[1]);
//! assert_ne!(result.assignments[0], result.assignments[2]);
//! ```

use rand::Rng as _;
use rand_pcg::Pcg32;

/// Parameters of a k-means fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KMeansParams {
    /// Number of clusters.
    pub k: usize,
    /// Number of independent restarts; the lowest-inertia fit is kept.
    pub restarts: usize,
    /// Maximum Lloyd iterations per restart.
    pub max_iterations: usize,
    /// Seed for centroid initialization.
    pub seed: u64,
}

impl KMeansParams {
    pub const DEFAULT_RESTARTS: usize = 10;
    pub const DEFAULT_MAX_ITERATIONS: usize = 300;

    #[must_use]
    pub fn new(k: usize, seed: u64) -> Self {
        Self {
            k,
            restarts: Self::DEFAULT_RESTARTS,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            seed,
        }
    }
}

/// Result of a k-means fit.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// Final centroid of each cluster.
    pub centroids: Vec<Vec<f64>>,
    /// Cluster index of each input point, in input order.
    pub assignments: Vec<usize>,
    /// Sum of squared distances from each point to its centroid.
    pub inertia: f64,
    /// Lloyd iterations run by the winning restart.
    pub iterations: usize,
}

impl KMeansFit {
    /// Number of points assigned to each cluster.
    #[must_use]
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for &cluster in &self.assignments {
            sizes[cluster] += 1;
        }
        sizes
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum KMeansError {
    #[display("number of clusters must be positive")]
    ZeroClusters,
    #[display("need at least {k} samples to form {k} clusters, got {samples}")]
    TooFewSamples { k: usize, samples: usize },
}

/// Fits k-means on `points` (one row per sample, all rows of equal length).
///
/// Every cluster of the returned fit has at least one member: clusters that
/// become empty during iteration take over the point farthest from its
/// centroid among clusters with more than one member.
pub fn fit(points: &[Vec<f64>], params: &KMeansParams) -> Result<KMeansFit, KMeansError> {
    if params.k == 0 {
        return Err(KMeansError::ZeroClusters);
    }
    if points.len() < params.k {
        return Err(KMeansError::TooFewSamples {
            k: params.k,
            samples: points.len(),
        });
    }

    let run = |restart: usize| {
        let mut rng = Pcg32::new(params.seed, restart as u64);
        let centroids = init_plus_plus(points, params.k, &mut rng);
        lloyd(points, centroids, params.max_iterations.max(1))
    };

    let mut best = run(0);
    for restart in 1..params.restarts {
        let candidate = run(restart);
        if candidate.inertia < best.inertia {
            best = candidate;
        }
    }
    Ok(best)
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (idx, centroid) in centroids.iter().enumerate() {
        let distance = squared_distance(point, centroid);
        if distance < best.1 {
            best = (idx, distance);
        }
    }
    best
}

fn init_plus_plus(points: &[Vec<f64>], k: usize, rng: &mut Pcg32) -> Vec<Vec<f64>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.random_range(0..points.len())].clone());

    let mut distances = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect::<Vec<_>>();

    while centroids.len() < k {
        let total = distances.iter().sum::<f64>();
        let chosen = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut cumulative = 0.0;
            distances
                .iter()
                .position(|d| {
                    cumulative += d;
                    cumulative > target
                })
                .unwrap_or_else(|| distances.iter().rposition(|d| *d > 0.0).unwrap_or(0))
        } else {
            // All remaining points coincide with existing centroids
            rng.random_range(0..points.len())
        };
        let centroid = points[chosen].clone();
        for (distance, point) in distances.iter_mut().zip(points) {
            *distance = distance.min(squared_distance(point, &centroid));
        }
        centroids.push(centroid);
    }
    centroids
}

fn lloyd(points: &[Vec<f64>], mut centroids: Vec<Vec<f64>>, max_iterations: usize) -> KMeansFit {
    let k = centroids.len();
    let mut assignments = vec![usize::MAX; points.len()];
    let mut iterations = 0;

    loop {
        let mut changed = false;
        for (assignment, point) in assignments.iter_mut().zip(points) {
            let (cluster, _) = nearest(point, &centroids);
            if *assignment != cluster {
                *assignment = cluster;
                changed = true;
            }
        }
        let refilled = refill_empty_clusters(points, &centroids, &mut assignments, k);
        update_centroids(points, &mut centroids, &assignments);
        iterations += 1;

        if (!changed && !refilled) || iterations >= max_iterations {
            break;
        }
    }

    let inertia = points
        .iter()
        .zip(&assignments)
        .map(|(point, &cluster)| squared_distance(point, &centroids[cluster]))
        .sum();

    KMeansFit {
        centroids,
        assignments,
        inertia,
        iterations,
    }
}

fn refill_empty_clusters(
    points: &[Vec<f64>],
    centroids: &[Vec<f64>],
    assignments: &mut [usize],
    k: usize,
) -> bool {
    let mut sizes = vec![0_usize; k];
    for &cluster in assignments.iter() {
        sizes[cluster] += 1;
    }

    let mut refilled = false;
    for empty in 0..k {
        if sizes[empty] > 0 {
            continue;
        }
        let donor = assignments
            .iter()
            .enumerate()
            .filter(|&(_, &cluster)| sizes[cluster] > 1)
            .map(|(idx, &cluster)| (idx, squared_distance(&points[idx], &centroids[cluster])))
            .fold(None, |best: Option<(usize, f64)>, (idx, distance)| match best {
                Some((_, best_distance)) if best_distance >= distance => best,
                _ => Some((idx, distance)),
            });
        if let Some((idx, _)) = donor {
            sizes[assignments[idx]] -= 1;
            sizes[empty] += 1;
            assignments[idx] = empty;
            refilled = true;
        }
    }
    refilled
}

#[expect(clippy::cast_precision_loss)]
fn update_centroids(points: &[Vec<f64>], centroids: &mut [Vec<f64>], assignments: &[usize]) {
    let dims = points.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0; dims]; centroids.len()];
    let mut counts = vec![0_usize; centroids.len()];
    for (point, &cluster) in points.iter().zip(assignments) {
        counts[cluster] += 1;
        for (sum, value) in sums[cluster].iter_mut().zip(point) {
            *sum += value;
        }
    }
    for ((centroid, sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
        if count > 0 {
            *centroid = sum.into_iter().map(|s| s / count as f64).collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<Vec<f64>> {
        let mut points = vec![];
        for (cx, cy) in [(0.0, 0.0), (20.0, 0.0), (0.0, 20.0), (20.0, 20.0)] {
            for i in 0..10 {
                let offset = f64::from(i) * 0.1;
                points.push(vec![cx + offset, cy - offset]);
            }
        }
        points
    }

    #[test]
    fn test_separates_well_separated_blobs() {
        let points = blobs();
        let result = fit(&points, &KMeansParams::new(4, 42)).unwrap();
        for blob in 0..4 {
            let first = result.assignments[blob * 10];
            assert!(
                result.assignments[blob * 10..(blob + 1) * 10]
                    .iter()
                    .all(|&c| c == first)
            );
        }
        assert_eq!(result.cluster_sizes(), vec![10; 4]);
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let points = blobs();
        let a = fit(&points, &KMeansParams::new(3, 7)).unwrap();
        let b = fit(&points, &KMeansParams::new(3, 7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_few_samples() {
        let points = vec![vec![0.0], vec![1.0]];
        assert!(matches!(
            fit(&points, &KMeansParams::new(4, 0)),
            Err(KMeansError::TooFewSamples { k: 4, samples: 2 })
        ));
    }

    #[test]
    fn test_zero_clusters() {
        assert!(matches!(
            fit(&[vec![0.0]], &KMeansParams::new(0, 0)),
            Err(KMeansError::ZeroClusters)
        ));
    }

    #[test]
    fn test_identical_points_still_fill_every_cluster() {
        let points = vec![vec![1.0, 1.0]; 6];
        let result = fit(&points, &KMeansParams::new(4, 1)).unwrap();
        assert!(result.cluster_sizes().iter().all(|&size| size > 0));
        assert_eq!(result.inertia, 0.0);
    }
}
