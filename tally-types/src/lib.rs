//! Core types shared by the tally document crates.
//!
//! This crate holds the vocabulary that producers (tokenizers), the
//! [`Document`] model and consumers (exporters, corpus layers) agree on:
//!
//! - **Identifiers**: [`TermId`] and [`DocId`] are opaque integers assigned
//!   by external collaborators
//! - **Labels**: [`ClassLabel`] with the `[NONE]` sentinel
//! - **Mappings**: [`mapping::InvertibleMap`], the bidirectional registry used
//!   to turn labels into small integers during export
//!
//! [`Document`]: https://docs.rs/tally-core

#![warn(missing_docs)]

use core::borrow::Borrow;
use core::fmt;

pub use mapping::{InvertibleMap, LabelMapping, MappingError};

/// Opaque vocabulary entry identifier.
///
/// Assignment from raw text is the tokenizer's business; the document model
/// never interprets the value.
pub type TermId = u64;

/// Caller-assigned document identifier, unique within a corpus.
pub type DocId = u64;

/// Classification category attached to a document.
///
/// Compares, hashes and borrows exactly like the `str` it wraps, so maps keyed
/// by `ClassLabel` can be queried with a plain `&str`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ClassLabel(String);

impl ClassLabel {
    /// Sentinel used when a document has not been labelled.
    pub const NONE: &'static str = "[NONE]";

    /// Creates a label from anything string-like.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Returns the `[NONE]` sentinel label.
    pub fn none() -> Self {
        Self(Self::NONE.to_owned())
    }

    /// Returns `true` if this is the `[NONE]` sentinel.
    #[inline]
    pub fn is_none(&self) -> bool {
        self.0 == Self::NONE
    }

    /// Returns the label text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClassLabel {
    fn default() -> Self {
        Self::none()
    }
}

impl From<&str> for ClassLabel {
    fn from(label: &str) -> Self {
        Self(label.to_owned())
    }
}

impl From<String> for ClassLabel {
    fn from(label: String) -> Self {
        Self(label)
    }
}

impl AsRef<str> for ClassLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ClassLabel {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bidirectional maps between keys and values.
///
/// An [`InvertibleMap`] keeps a forward and a backward hash map in lock step,
/// so both `key -> value` and `value -> key` lookups are O(1) expected time.
/// Every key maps to exactly one value and every value to exactly one key.
pub mod mapping {
    use core::borrow::Borrow;
    use core::fmt;
    use core::hash::Hash;

    use rustc_hash::FxHashMap;
    use thiserror::Error;

    use crate::ClassLabel;

    /// Registry turning class labels into the small integers a trainer expects.
    ///
    /// One instance is shared by every document of an export session.
    pub type LabelMapping = InvertibleMap<ClassLabel, u32>;

    /// Errors raised when an insertion would break the one-to-one invariant
    /// or no integer is left to allocate.
    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum MappingError {
        /// The key is already associated with a different value.
        #[error("key {key} is already mapped to {existing}")]
        KeyAlreadyMapped {
            /// Debug rendering of the rejected key.
            key: String,
            /// Debug rendering of the value it is bound to.
            existing: String,
        },
        /// The value is already associated with a different key.
        #[error("value {value} is already mapped from {existing}")]
        ValueAlreadyMapped {
            /// Debug rendering of the rejected value.
            value: String,
            /// Debug rendering of the key it is bound to.
            existing: String,
        },
        /// Every `u32` is already allocated.
        #[error("no unused integer left to allocate")]
        Exhausted,
    }

    /// A one-to-one map that can be queried in both directions.
    #[derive(Clone)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(
        feature = "serde",
        serde(
            try_from = "Vec<(K, V)>",
            into = "Vec<(K, V)>",
            bound(
                serialize = "K: serde::Serialize + Hash + Eq + Clone + Ord + fmt::Debug, \
                             V: serde::Serialize + Hash + Eq + Clone + Ord + fmt::Debug",
                deserialize = "K: serde::Deserialize<'de> + Hash + Eq + Clone + fmt::Debug, \
                               V: serde::Deserialize<'de> + Hash + Eq + Clone + fmt::Debug"
            )
        )
    )]
    pub struct InvertibleMap<K, V> {
        forward: FxHashMap<K, V>,
        backward: FxHashMap<V, K>,
    }

    impl<K, V> Default for InvertibleMap<K, V> {
        fn default() -> Self {
            Self {
                forward: FxHashMap::default(),
                backward: FxHashMap::default(),
            }
        }
    }

    impl<K, V> InvertibleMap<K, V>
    where
        K: Hash + Eq + Clone,
        V: Hash + Eq + Clone,
    {
        /// Creates an empty map.
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of associations.
        #[inline]
        #[must_use]
        pub fn len(&self) -> usize {
            self.forward.len()
        }

        /// Returns `true` if the map holds no associations.
        #[inline]
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.forward.is_empty()
        }

        /// Looks up the value associated with `key`.
        pub fn get_value<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Hash + Eq + ?Sized,
        {
            self.forward.get(key)
        }

        /// Looks up the key associated with `value`.
        pub fn get_key<Q>(&self, value: &Q) -> Option<&K>
        where
            V: Borrow<Q>,
            Q: Hash + Eq + ?Sized,
        {
            self.backward.get(value)
        }

        /// Returns `true` if `key` is associated with some value.
        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Hash + Eq + ?Sized,
        {
            self.forward.contains_key(key)
        }

        /// Returns `true` if `value` is associated with some key.
        pub fn contains_value<Q>(&self, value: &Q) -> bool
        where
            V: Borrow<Q>,
            Q: Hash + Eq + ?Sized,
        {
            self.backward.contains_key(value)
        }

        /// Associates `key` with `value`.
        ///
        /// Re-inserting an existing pair is a no-op. Binding either side to
        /// something new is rejected, leaving the map unchanged.
        ///
        /// # Errors
        ///
        /// Returns [`MappingError::KeyAlreadyMapped`] or
        /// [`MappingError::ValueAlreadyMapped`] when the pair would break the
        /// one-to-one invariant.
        pub fn insert(&mut self, key: K, value: V) -> Result<(), MappingError>
        where
            K: fmt::Debug,
            V: fmt::Debug,
        {
            if let Some(existing) = self.forward.get(&key) {
                if *existing == value {
                    return Ok(());
                }
                return Err(MappingError::KeyAlreadyMapped {
                    key: format!("{key:?}"),
                    existing: format!("{existing:?}"),
                });
            }
            if let Some(existing) = self.backward.get(&value) {
                return Err(MappingError::ValueAlreadyMapped {
                    value: format!("{value:?}"),
                    existing: format!("{existing:?}"),
                });
            }

            self.backward.insert(value.clone(), key.clone());
            self.forward.insert(key, value);
            Ok(())
        }

        /// Iterates over `(key, value)` pairs in unspecified order.
        pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
            self.forward.iter()
        }

        /// Removes every association.
        pub fn clear(&mut self) {
            self.forward.clear();
            self.backward.clear();
        }
    }

    impl<K> InvertibleMap<K, u32>
    where
        K: Hash + Eq + Clone,
    {
        /// Returns the integer bound to `key`, allocating one if needed.
        ///
        /// New keys receive the smallest unused integer not below `len()`,
        /// which is simply `len()` for a map populated only through this
        /// method. If every integer from `len()` to `u32::MAX` is taken, the
        /// search wraps around to the unused integers below `len()`.
        ///
        /// The lookup and the insertion form one critical section: sharing a
        /// map between threads requires holding a lock across the whole call
        /// (the `&mut self` receiver makes that the only way to do it).
        ///
        /// # Errors
        ///
        /// Returns [`MappingError::Exhausted`] when the map already holds
        /// `2^32` keys and no `u32` is left to allocate.
        pub fn try_intern(&mut self, key: &K) -> Result<u32, MappingError> {
            if let Some(&value) = self.forward.get(key) {
                return Ok(value);
            }

            let start = u32::try_from(self.forward.len()).map_err(|_| MappingError::Exhausted)?;
            let next = (start..=u32::MAX)
                .chain(0..start)
                .find(|candidate| !self.backward.contains_key(candidate))
                .ok_or(MappingError::Exhausted)?;

            self.backward.insert(next, key.clone());
            self.forward.insert(key.clone(), next);
            Ok(next)
        }

        /// Infallible form of [`InvertibleMap::try_intern`].
        ///
        /// # Panics
        ///
        /// Panics if all `2^32` integers are already allocated. Holding that
        /// many keys needs far more memory than any export session uses.
        pub fn intern(&mut self, key: &K) -> u32 {
            match self.try_intern(key) {
                Ok(value) => value,
                Err(err) => panic!("cannot intern key: {err}"),
            }
        }
    }

    impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for InvertibleMap<K, V> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_map().entries(self.forward.iter()).finish()
        }
    }

    impl<K, V> PartialEq for InvertibleMap<K, V>
    where
        K: Hash + Eq,
        V: PartialEq,
    {
        fn eq(&self, other: &Self) -> bool {
            self.forward == other.forward
        }
    }

    impl<K, V> TryFrom<Vec<(K, V)>> for InvertibleMap<K, V>
    where
        K: Hash + Eq + Clone + fmt::Debug,
        V: Hash + Eq + Clone + fmt::Debug,
    {
        type Error = MappingError;

        fn try_from(pairs: Vec<(K, V)>) -> Result<Self, Self::Error> {
            let mut map = Self::new();
            for (key, value) in pairs {
                map.insert(key, value)?;
            }
            Ok(map)
        }
    }

    // Sorted so persisted mappings diff cleanly.
    impl<K, V> From<InvertibleMap<K, V>> for Vec<(K, V)>
    where
        K: Ord,
        V: Ord,
    {
        fn from(map: InvertibleMap<K, V>) -> Self {
            let mut pairs: Vec<(K, V)> = map.forward.into_iter().collect();
            pairs.sort_unstable_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
            pairs
        }
    }
}
