//! Distance metric implementations for HNSW search.
//!
//! Supports three distance functions: cosine, euclidean (L2²), and dot product.
//! Kernels use 8-lane chunked accumulators so the compiler can vectorize them.
//! Cosine has a prenormalized variant that takes cached inverse norms, which is
//! what the graph uses on its hot path.

use serde::{Deserialize, Serialize};

const LANES: usize = 8;

/// Distance metric used for vector similarity computation.
///
/// All metrics return a distance value where **lower is better** (more similar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Cosine distance: `1 - cosine_similarity`. Range: \[0, 2\].
    #[default]
    Cosine,
    /// Squared Euclidean distance (L2²). Range: \[0, ∞).
    Euclidean,
    /// Negative dot product: `-dot(a, b)`. Lower = higher similarity.
    DotProduct,
}

impl DistanceMetric {
    /// Exact distance between two vectors of equal length.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
            DistanceMetric::Euclidean => euclidean_sq(a, b),
            DistanceMetric::DotProduct => -dot(a, b),
        }
    }

    /// Distance using precomputed inverse norms (`1 / ||v||`, or 0 for a zero vector).
    /// Norms are ignored by non-cosine metrics.
    #[inline]
    pub fn distance_prenorm(&self, a: &[f32], a_inv_norm: f32, b: &[f32], b_inv_norm: f32) -> f32 {
        match self {
            DistanceMetric::Cosine => 1.0 - dot(a, b) * a_inv_norm * b_inv_norm,
            DistanceMetric::Euclidean => euclidean_sq(a, b),
            DistanceMetric::DotProduct => -dot(a, b),
        }
    }

    /// Lowercase name, as accepted by `FromStr`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::DotProduct => "dot",
        }
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            "dot" | "ip" | "inner_product" => Ok(DistanceMetric::DotProduct),
            other => Err(format!("unknown distance metric '{other}'")),
        }
    }
}

/// Dot product of two equal-length slices.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = [0.0f32; LANES];
    let chunks_a = a.chunks_exact(LANES);
    let chunks_b = b.chunks_exact(LANES);
    let tail: f32 = chunks_a
        .remainder()
        .iter()
        .zip(chunks_b.remainder())
        .map(|(x, y)| x * y)
        .sum();
    for (ca, cb) in chunks_a.zip(chunks_b) {
        for i in 0..LANES {
            acc[i] += ca[i] * cb[i];
        }
    }
    acc.iter().sum::<f32>() + tail
}

/// Squared Euclidean distance of two equal-length slices.
#[inline]
pub fn euclidean_sq(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = [0.0f32; LANES];
    let chunks_a = a.chunks_exact(LANES);
    let chunks_b = b.chunks_exact(LANES);
    let tail: f32 = chunks_a
        .remainder()
        .iter()
        .zip(chunks_b.remainder())
        .map(|(x, y)| (x - y) * (x - y))
        .sum();
    for (ca, cb) in chunks_a.zip(chunks_b) {
        for i in 0..LANES {
            let d = ca[i] - cb[i];
            acc[i] += d * d;
        }
    }
    acc.iter().sum::<f32>() + tail
}

/// `1 / ||v||`, or 0 when the norm is too small to divide by (zero vector).
#[inline]
pub fn inverse_norm(v: &[f32]) -> f32 {
    let norm = dot(v, v).sqrt();
    if norm < 1e-10 {
        0.0
    } else {
        1.0 / norm
    }
}

/// Cosine similarity; 0 when either vector is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    dot(a, b) * inverse_norm(a) * inverse_norm(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical() {
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let d = DistanceMetric::Cosine.distance(&a, &a);
        assert!(d.abs() < 1e-6, "self-distance should be ~0, got {d}");
    }

    #[test]
    fn test_cosine_scale_invariant() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![10.0, 20.0, 30.0];
        let d = DistanceMetric::Cosine.distance(&a, &b);
        assert!(d.abs() < 1e-6, "scaled copy should have distance ~0, got {d}");
    }

    #[test]
    fn test_cosine_orthogonal_and_opposite() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let c = vec![-1.0, 0.0, 0.0];
        assert!((DistanceMetric::Cosine.distance(&a, &b) - 1.0).abs() < 1e-6);
        assert!((DistanceMetric::Cosine.distance(&a, &c) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 0.0];
        assert_eq!(DistanceMetric::Cosine.distance(&a, &b), 1.0);
        assert_eq!(inverse_norm(&a), 0.0);
    }

    #[test]
    fn test_prenorm_matches_exact() {
        let a: Vec<f32> = (0..19).map(|i| (i as f32 * 0.37).sin()).collect();
        let b: Vec<f32> = (0..19).map(|i| (i as f32 * 0.11).cos()).collect();
        for metric in [
            DistanceMetric::Cosine,
            DistanceMetric::Euclidean,
            DistanceMetric::DotProduct,
        ] {
            let exact = metric.distance(&a, &b);
            let pre = metric.distance_prenorm(&a, inverse_norm(&a), &b, inverse_norm(&b));
            assert!((exact - pre).abs() < 1e-5, "{metric:?}: {exact} vs {pre}");
        }
    }

    #[test]
    fn test_euclidean() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![3.0, 4.0, 0.0];
        let d = DistanceMetric::Euclidean.distance(&a, &b);
        assert!((d - 25.0).abs() < 1e-4, "squared euclidean should be 25, got {d}");
    }

    #[test]
    fn test_dot_product() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![4.0, 5.0, 6.0];
        let d = DistanceMetric::DotProduct.distance(&a, &b);
        assert!((d + 32.0).abs() < 1e-4, "negative dot product should be -32, got {d}");
    }

    #[test]
    fn test_chunked_dot_matches_naive() {
        let a: Vec<f32> = (0..37).map(|i| i as f32 * 0.5 - 3.0).collect();
        let b: Vec<f32> = (0..37).map(|i| 1.0 / (i as f32 + 1.0)).collect();
        let naive: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        assert!((dot(&a, &b) - naive).abs() < 1e-3);
    }

    #[test]
    fn test_parse_metric() {
        assert_eq!("cosine".parse::<DistanceMetric>(), Ok(DistanceMetric::Cosine));
        assert_eq!("L2".parse::<DistanceMetric>(), Ok(DistanceMetric::Euclidean));
        assert_eq!("ip".parse::<DistanceMetric>(), Ok(DistanceMetric::DotProduct));
        assert!("hamming".parse::<DistanceMetric>().is_err());
    }
}
