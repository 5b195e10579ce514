//! Pairwise similarity between frequency stores.

use smallvec::SmallVec;
use tally_types::TermId;

use super::{Document, Frequencies};

impl Document {
    /// Set overlap of the two documents' non-zero terms.
    ///
    /// `|A ∩ B| / |A ∪ B|`, ignoring weights. Returns 0 when both stores are
    /// empty.
    #[must_use]
    pub fn jaccard_similarity(a: &Document, b: &Document) -> f64 {
        jaccard(&a.frequencies, &b.frequencies)
    }

    /// Cosine of the angle between the two frequency vectors.
    ///
    /// Returns 0 when either vector has zero norm.
    #[must_use]
    pub fn cosine_similarity(a: &Document, b: &Document) -> f64 {
        cosine(&a.frequencies, &b.frequencies)
    }
}

/// Jaccard similarity over raw frequency maps. Zero weights are not members.
pub fn jaccard(a: &Frequencies, b: &Frequencies) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    let size_a = nonzero_terms(a);
    let size_b = nonzero_terms(b);

    let shared = small
        .iter()
        .filter(|&(term, &f)| f != 0.0 && large.get(term).is_some_and(|&g| g != 0.0))
        .count();

    let union = size_a + size_b - shared;
    if union == 0 {
        return 0.0;
    }
    shared as f64 / union as f64
}

/// Cosine similarity over raw frequency maps.
///
/// Each vector is divided by its largest absolute weight before squaring, so
/// very large or very small weights neither overflow nor underflow. Shared
/// products are summed in term id order so that `cosine(a, b)` and
/// `cosine(b, a)` are bit-for-bit identical.
///
/// Returns 0 when either vector has zero norm or holds a non-finite weight.
pub fn cosine(a: &Frequencies, b: &Frequencies) -> f64 {
    let (Some(scale_a), Some(scale_b)) = (max_weight(a), max_weight(b)) else {
        return 0.0;
    };

    let norm_a = scaled_norm(a, scale_a);
    let norm_b = scaled_norm(b, scale_b);

    let (small, large, scale_small, scale_large) = if a.len() <= b.len() {
        (a, b, scale_a, scale_b)
    } else {
        (b, a, scale_b, scale_a)
    };

    let mut products: SmallVec<[(TermId, f64); 64]> = small
        .iter()
        .filter_map(|(&term, &f)| {
            large
                .get(&term)
                .map(|&g| (term, (f / scale_small) * (g / scale_large)))
        })
        .collect();
    products.sort_unstable_by_key(|&(term, _)| term);

    let dot: f64 = products.iter().map(|&(_, p)| p).sum();
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

#[inline]
fn nonzero_terms(freqs: &Frequencies) -> usize {
    freqs.values().filter(|&&f| f != 0.0).count()
}

/// Largest absolute weight, `None` when it is zero or not finite.
fn max_weight(freqs: &Frequencies) -> Option<f64> {
    let max = freqs.values().fold(0.0f64, |acc, f| acc.max(f.abs()));
    (max > 0.0 && max.is_finite() && freqs.values().all(|f| f.is_finite())).then_some(max)
}

/// Euclidean norm of `freqs / scale`; at least 1 when `scale` is the
/// largest absolute weight.
#[inline]
fn scaled_norm(freqs: &Frequencies, scale: f64) -> f64 {
    freqs
        .values()
        .map(|f| {
            let x = f / scale;
            x * x
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(terms: &[(TermId, f64)]) -> Document {
        let mut d = Document::new("sim", 0);
        for &(t, f) in terms {
            d.increment(t, f);
        }
        d
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn jaccard_identical() {
        let a = doc(&[(1, 2.0), (2, 5.0), (3, 1.0)]);
        assert!(approx(Document::jaccard_similarity(&a, &a), 1.0));
    }

    #[test]
    fn jaccard_disjoint() {
        let a = doc(&[(1, 2.0), (2, 1.0)]);
        let b = doc(&[(3, 2.0), (4, 1.0)]);
        assert_eq!(Document::jaccard_similarity(&a, &b), 0.0);
    }

    #[test]
    fn jaccard_partial_ignores_weights() {
        let a = doc(&[(1, 100.0), (2, 1.0), (3, 1.0)]);
        let b = doc(&[(2, 7.0), (3, 0.5), (4, 1.0)]);
        // {2,3} / {1,2,3,4}
        assert!(approx(Document::jaccard_similarity(&a, &b), 0.5));
        assert_eq!(
            Document::jaccard_similarity(&a, &b),
            Document::jaccard_similarity(&b, &a)
        );
    }

    #[test]
    fn jaccard_skips_zeroed_terms() {
        let a = doc(&[(1, 1.0), (2, 1.0), (2, -1.0)]);
        let b = doc(&[(1, 1.0), (2, 3.0)]);
        // A = {1}, B = {1,2}
        assert!(approx(Document::jaccard_similarity(&a, &b), 0.5));
    }

    #[test]
    fn jaccard_empty() {
        let empty = doc(&[]);
        let a = doc(&[(1, 1.0)]);
        assert_eq!(Document::jaccard_similarity(&empty, &empty), 0.0);
        assert_eq!(Document::jaccard_similarity(&empty, &a), 0.0);
    }

    #[test]
    fn cosine_identical() {
        let a = doc(&[(1, 3.0), (2, 4.0)]);
        assert!(approx(Document::cosine_similarity(&a, &a), 1.0));
    }

    #[test]
    fn cosine_known_value() {
        let a = doc(&[(1, 1.0), (2, 1.0)]);
        let b = doc(&[(1, 1.0)]);
        // dot 1, norms sqrt(2) and 1
        assert!(approx(
            Document::cosine_similarity(&a, &b),
            1.0 / 2f64.sqrt()
        ));
    }

    #[test]
    fn cosine_is_symmetric() {
        let a = doc(&[(1, 0.3), (2, 1.7), (5, 2.2), (8, 0.1)]);
        let b = doc(&[(2, 0.9), (5, 3.3), (8, 4.4), (9, 1.0)]);
        assert_eq!(
            Document::cosine_similarity(&a, &b),
            Document::cosine_similarity(&b, &a)
        );
    }

    #[test]
    fn cosine_scale_invariant() {
        let a = doc(&[(1, 1.0), (2, 2.0)]);
        let b = doc(&[(1, 10.0), (2, 20.0)]);
        assert!(approx(Document::cosine_similarity(&a, &b), 1.0));
    }

    #[test]
    fn cosine_zero_norm() {
        let empty = doc(&[]);
        let a = doc(&[(1, 1.0)]);
        let zeroed = doc(&[(1, 1.0), (1, -1.0)]);
        assert_eq!(Document::cosine_similarity(&empty, &empty), 0.0);
        assert_eq!(Document::cosine_similarity(&a, &empty), 0.0);
        assert_eq!(Document::cosine_similarity(&a, &zeroed), 0.0);
    }

    #[test]
    fn cosine_huge_weights() {
        let a = doc(&[(1, 1e200)]);
        assert!(approx(Document::cosine_similarity(&a, &a), 1.0));

        let b = doc(&[(1, 1e200), (2, 1e200)]);
        assert!(approx(
            Document::cosine_similarity(&a, &b),
            1.0 / 2f64.sqrt()
        ));
        assert!(approx(
            Document::cosine_similarity(&b, &doc(&[(1, 1.0), (2, 1.0)])),
            1.0
        ));
    }

    #[test]
    fn cosine_tiny_weights() {
        let a = doc(&[(1, 1e-200), (2, 3e-200)]);
        assert!(approx(Document::cosine_similarity(&a, &a), 1.0));
    }

    #[test]
    fn cosine_non_finite_weights() {
        let a = doc(&[(1, 1.0)]);
        let inf = doc(&[(1, f64::INFINITY)]);
        let nan = doc(&[(1, f64::NAN)]);
        assert_eq!(Document::cosine_similarity(&a, &inf), 0.0);
        assert_eq!(Document::cosine_similarity(&nan, &a), 0.0);
    }

    #[test]
    fn cosine_disjoint() {
        let a = doc(&[(1, 1.0)]);
        let b = doc(&[(2, 1.0)]);
        assert_eq!(Document::cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn free_functions_match_methods() {
        let a = doc(&[(1, 1.0), (2, 2.0)]);
        let b = doc(&[(2, 1.0), (3, 2.0)]);
        assert_eq!(
            jaccard(a.frequencies(), b.frequencies()),
            Document::jaccard_similarity(&a, &b)
        );
        assert_eq!(
            cosine(a.frequencies(), b.frequencies()),
            Document::cosine_similarity(&a, &b)
        );
    }
}
