//! The document model: a sparse, weighted bag of terms.
//!
//! A [`Document`] is built once per source unit and then fed by repeated
//! [`Document::increment`] calls, usually from a tokenizer. Once complete it
//! is read-mostly:
//!
//! - **Similarity**: [`Document::jaccard_similarity`], [`Document::cosine_similarity`]
//! - **Filtering**: [`Document::filter_features`] produces new documents
//! - **Export**: [`Document::get_slda_term_data`], [`Document::get_slda_label_data`]
//!
//! Threading:
//! - `Document` is `Send + Sync`. Readers may share it freely as long as no
//!   writer is incrementing it at the same time.

mod filter;
mod similarity;
mod slda;

pub use similarity::{cosine, jaccard};
pub use slda::{SldaTerms, SldaWriter};

use memchr::memrchr2;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tally_types::{ClassLabel, DocId, TermId};

/// Sparse term weights: absent keys weigh 0.
pub type Frequencies = FxHashMap<TermId, f64>;

/// One indexable unit of text, modelled as term frequencies.
///
/// `length` is the running sum of every increment, not the number of
/// distinct terms.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    id: DocId,
    path: String,
    name: String,
    label: ClassLabel,
    length: f64,
    frequencies: Frequencies,
    content: Option<String>,
}

impl Document {
    /// Creates an empty, unlabelled document.
    ///
    /// The label is the `[NONE]` sentinel and `name` is the last component
    /// of `path`.
    pub fn new(path: impl Into<String>, id: DocId) -> Self {
        Self::with_label(path, id, ClassLabel::default())
    }

    /// Creates an empty document carrying `label`.
    pub fn with_label(path: impl Into<String>, id: DocId, label: impl Into<ClassLabel>) -> Self {
        let path = path.into();
        let name = file_name(&path).to_owned();
        Self {
            id,
            path,
            name,
            label: label.into(),
            length: 0.0,
            frequencies: Frequencies::default(),
            content: None,
        }
    }

    /// Adds `amount` to the weight of `term` and to the document length.
    ///
    /// The final state only depends on the multiset of `(term, amount)`
    /// pairs applied, never on their order.
    ///
    /// `amount` is not validated. Callers that need non-negative weights
    /// downstream must not drive a term below zero.
    #[inline]
    pub fn increment(&mut self, term: TermId, amount: f64) {
        *self.frequencies.entry(term).or_insert(0.0) += amount;
        self.length += amount;
    }

    /// Accumulated weight of `term`, 0 if it was never incremented.
    #[inline]
    #[must_use]
    pub fn frequency(&self, term: TermId) -> f64 {
        self.frequencies.get(&term).copied().unwrap_or(0.0)
    }

    /// All term weights, in no particular order.
    #[inline(always)]
    #[must_use]
    pub fn frequencies(&self) -> &Frequencies {
        &self.frequencies
    }

    /// Sum of all weights, O(1).
    #[inline(always)]
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Number of distinct terms in the store.
    #[inline(always)]
    #[must_use]
    pub fn unique_terms(&self) -> usize {
        self.frequencies.len()
    }

    /// Returns `true` if no term was ever incremented.
    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Stores a copy of the raw text. Frequencies and length are untouched.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = Some(content.into());
    }

    /// The raw text, if it was stored with [`Document::set_content`].
    #[inline]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Returns `true` once content has been set.
    #[inline(always)]
    pub fn contains_content(&self) -> bool {
        self.content.is_some()
    }

    /// Replaces the classification label.
    pub fn set_label(&mut self, label: impl Into<ClassLabel>) {
        self.label = label.into();
    }

    #[inline(always)]
    pub fn label(&self) -> &ClassLabel {
        &self.label
    }

    #[inline(always)]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Short display name: the final component of [`Document::path`].
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn id(&self) -> DocId {
        self.id
    }

    /// Copy of every scalar field with `frequencies`, a subset of this
    /// document's own entries.
    ///
    /// Keeping every entry keeps the accumulated `length` as is. A strict
    /// subset is summed in term id order so the result does not depend on
    /// hash iteration order.
    pub(crate) fn restricted_to(&self, frequencies: Frequencies) -> Self {
        debug_assert!(frequencies.len() <= self.frequencies.len());
        let length = if frequencies.len() == self.frequencies.len() {
            self.length
        } else {
            let mut kept: SmallVec<[(TermId, f64); 64]> =
                frequencies.iter().map(|(&term, &f)| (term, f)).collect();
            kept.sort_unstable_by_key(|&(term, _)| term);
            kept.iter().map(|&(_, f)| f).sum()
        };
        Self {
            id: self.id,
            path: self.path.clone(),
            name: self.name.clone(),
            label: self.label.clone(),
            length,
            frequencies,
            content: self.content.clone(),
        }
    }
}

/// Last component of `path`, accepting `/` and `\` as separators.
///
/// Trailing separators are ignored, so `"a/b/"` names `"b"`.
fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    match memrchr2(b'/', b'\\', trimmed.as_bytes()) {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    }
}
