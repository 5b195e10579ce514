//! Export to the sLDA (supervised LDA) text input format.
//!
//! Each document contributes one line to a term-data file and one line to a
//! label-data file:
//!
//! ```text
//! terms:  <distinct_terms> <term>:<freq> <term>:<freq> ...
//! labels: <label_id>
//! ```
//!
//! ## Number formatting
//!
//! Frequencies use Rust's `{:?}` float formatting: the shortest decimal that
//! parses back to the same `f64`, always with a `.` or an exponent
//! (`2.0`, `0.1`, `1e20`). Fractional weights are never truncated.
//!
//! Pairs are written in ascending term id order. The format does not need
//! it, but it keeps exports reproducible across runs.

use core::fmt;
use std::io::{self, Write};

use smallvec::SmallVec;
use tally_types::{LabelMapping, MappingError, TermId};
use tracing::{debug, trace};

use super::Document;

impl Document {
    /// Term counts as a single sLDA term-data line (no trailing newline).
    ///
    /// The leading count is the number of distinct terms, not `length`.
    #[must_use]
    pub fn get_slda_term_data(&self) -> String {
        self.slda_terms().to_string()
    }

    /// Streaming form of [`Document::get_slda_term_data`].
    #[inline]
    pub fn slda_terms(&self) -> SldaTerms<'_> {
        SldaTerms { doc: self }
    }

    /// Integer id of this document's label, as a string.
    ///
    /// Labels already in `mapping` reuse their id. Unknown labels are
    /// registered under the next unused integer, which mutates `mapping`.
    ///
    /// `mapping` is shared by every document of an export session. When
    /// documents are exported from several threads, hold one lock (e.g. a
    /// `Mutex<LabelMapping>`) across the whole call: the lookup and the
    /// insertion must not interleave with another writer.
    ///
    /// # Panics
    ///
    /// Panics if `mapping` already holds `2^32` labels, see
    /// [`LabelMapping::intern`]. [`SldaWriter`] reports that case as an I/O
    /// error instead.
    pub fn get_slda_label_data(&self, mapping: &mut LabelMapping) -> String {
        match self.slda_label_id(mapping) {
            Ok(id) => id.to_string(),
            Err(err) => panic!("cannot allocate sLDA label id: {err}"),
        }
    }

    fn slda_label_id(&self, mapping: &mut LabelMapping) -> Result<u32, MappingError> {
        let known = mapping.contains_key(&self.label);
        let id = mapping.try_intern(&self.label)?;
        if !known {
            trace!(label = %self.label, id, "Registered sLDA label");
        }
        Ok(id)
    }
}

/// Lazily formatted sLDA term-data line, see [`Document::slda_terms`].
pub struct SldaTerms<'a> {
    doc: &'a Document,
}

impl fmt::Display for SldaTerms<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs: SmallVec<[(TermId, f64); 64]> = self
            .doc
            .frequencies
            .iter()
            .map(|(&term, &freq)| (term, freq))
            .collect();
        pairs.sort_unstable_by_key(|&(term, _)| term);

        write!(f, "{}", pairs.len())?;
        for (term, freq) in pairs {
            write!(f, " {term}:{freq:?}")?;
        }
        Ok(())
    }
}

/// Writes documents to a pair of sLDA sinks, one line per document each.
///
/// Owns the [`LabelMapping`] for the session; recover it with
/// [`SldaWriter::into_parts`] to persist the label ids.
pub struct SldaWriter<T: Write, L: Write> {
    terms: T,
    labels: L,
    mapping: LabelMapping,
    written: usize,
}

impl<T: Write, L: Write> SldaWriter<T, L> {
    /// Creates a writer with an empty label mapping.
    pub fn new(terms: T, labels: L) -> Self {
        Self::with_mapping(terms, labels, LabelMapping::new())
    }

    /// Creates a writer continuing an existing label mapping.
    pub fn with_mapping(terms: T, labels: L, mapping: LabelMapping) -> Self {
        Self {
            terms,
            labels,
            mapping,
            written: 0,
        }
    }

    /// Appends `doc` to both sinks.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error from the underlying writers, and reports an
    /// exhausted label mapping as [`io::ErrorKind::Other`]. A failure after
    /// the term line leaves that line already written.
    pub fn write_document(&mut self, doc: &Document) -> io::Result<()> {
        writeln!(self.terms, "{}", doc.slda_terms())?;
        let id = doc
            .slda_label_id(&mut self.mapping)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        writeln!(self.labels, "{id}")?;
        self.written += 1;
        Ok(())
    }

    /// Appends every document in order.
    ///
    /// # Errors
    ///
    /// Stops at the first I/O error.
    pub fn write_all<'a, I>(&mut self, docs: I) -> io::Result<()>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        for doc in docs {
            self.write_document(doc)?;
        }
        debug!(
            documents = self.written,
            labels = self.mapping.len(),
            "Wrote sLDA data"
        );
        Ok(())
    }

    /// Number of documents written so far.
    #[inline(always)]
    pub fn written(&self) -> usize {
        self.written
    }

    #[inline(always)]
    pub fn mapping(&self) -> &LabelMapping {
        &self.mapping
    }

    /// Flushes both sinks.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from either sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.terms.flush()?;
        self.labels.flush()
    }

    /// Returns the sinks and the label mapping.
    pub fn into_parts(self) -> (T, L, LabelMapping) {
        (self.terms, self.labels, self.mapping)
    }
}
