//! Sparse bag-of-terms documents for text-analysis pipelines.
//!
//! A [`Document`] accumulates term weights handed to it by a tokenizer and
//! then serves three kinds of consumers:
//!
//! - **Similarity**: Jaccard and cosine measures between two documents
//! - **Filtering**: copies restricted to a feature allow-list
//! - **Export**: the sLDA term-data and label-data line formats
//!
//! Tokenization, corpus storage and the learners reading the export are
//! collaborators and live elsewhere.
//!
//! ```
//! use tally_core::Document;
//! use tally_types::LabelMapping;
//!
//! let mut doc = Document::with_label("/corpus/doc1.txt", 1, "sports");
//! doc.increment(1, 3.0);
//! doc.increment(2, 1.0);
//!
//! assert_eq!(doc.name(), "doc1.txt");
//! assert_eq!(doc.length(), 4.0);
//! assert_eq!(doc.get_slda_term_data(), "2 1:3.0 2:1.0");
//!
//! let mut mapping = LabelMapping::new();
//! assert_eq!(doc.get_slda_label_data(&mut mapping), "0");
//! ```

pub mod document;

pub use document::{cosine, jaccard, Document, Frequencies, SldaTerms, SldaWriter};
pub use tally_types::{ClassLabel, DocId, InvertibleMap, LabelMapping, MappingError, TermId};
