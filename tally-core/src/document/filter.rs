//! Feature filtering: derive documents restricted to an allow-list of terms.

use rustc_hash::FxHashSet;
use tally_types::TermId;
use tracing::debug;

use super::{Document, Frequencies};

impl Document {
    /// Returns a copy of `doc` keeping only the terms listed in `features`.
    ///
    /// Only the term ids of `features` matter; their weights are ignored.
    /// Surviving terms keep their original weight and `length` is recomputed
    /// from them. `doc` itself is not modified.
    #[must_use]
    pub fn filter_features(doc: &Document, features: &[(TermId, f64)]) -> Document {
        doc.retain_terms(&feature_set(features))
    }

    /// Applies [`Document::filter_features`] to every document, preserving
    /// order.
    #[must_use]
    pub fn filter_features_batch(docs: &[Document], features: &[(TermId, f64)]) -> Vec<Document> {
        let keep = feature_set(features);
        debug!(
            documents = docs.len(),
            features = keep.len(),
            "Filtering documents to feature set"
        );
        docs.iter().map(|doc| doc.retain_terms(&keep)).collect()
    }

    fn retain_terms(&self, keep: &FxHashSet<TermId>) -> Document {
        let frequencies: Frequencies = self
            .frequencies
            .iter()
            .filter(|(term, _)| keep.contains(*term))
            .map(|(&term, &f)| (term, f))
            .collect();
        self.restricted_to(frequencies)
    }
}

fn feature_set(features: &[(TermId, f64)]) -> FxHashSet<TermId> {
    features.iter().map(|&(term, _)| term).collect()
}
