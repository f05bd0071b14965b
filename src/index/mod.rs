//! Row index construction: scan → durable key buffer → ordered key list.
//!
//! [`build_index`] streams keys from a full scan into a [`KeyBuffer`];
//! [`materialize`] reads the sealed buffer back into a [`RowIndex`]. Only the
//! final index has to fit in memory.

mod buffer;
mod builder;
mod error;
mod materialize;

pub use buffer::{KeyBuffer, SealedKeyBuffer};
pub use builder::build_index;
pub use error::{IndexCorruptError, MaterializeError, ScanError};
pub use materialize::materialize;

/// Ordered primary keys of a collection, in scan-delivery order.
///
/// The order is whatever the server produced and may differ between scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIndex<K> {
    keys: Vec<K>,
}

impl<K> RowIndex<K> {
    /// Wrap keys that are already in index order.
    pub fn new(keys: Vec<K>) -> Self {
        Self { keys }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the index holds no rows.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The first `n` keys, or all of them when fewer exist.
    pub fn first(&self, n: usize) -> &[K] {
        &self.keys[..n.min(self.keys.len())]
    }

    /// Key at row position `pos`.
    pub fn get(&self, pos: usize) -> Option<&K> {
        self.keys.get(pos)
    }

    /// Iterate keys in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, K> {
        self.keys.iter()
    }

    /// All keys as a slice.
    pub fn as_slice(&self) -> &[K] {
        &self.keys
    }

    /// Take the keys out of the index.
    pub fn into_vec(self) -> Vec<K> {
        self.keys
    }
}

impl<K> Default for RowIndex<K> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<K> IntoIterator for RowIndex<K> {
    type Item = K;
    type IntoIter = std::vec::IntoIter<K>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}

impl<'a, K> IntoIterator for &'a RowIndex<K> {
    type Item = &'a K;
    type IntoIter = std::slice::Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

impl<K> FromIterator<K> for RowIndex<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_clamps_to_length() {
        let index: RowIndex<i64> = (1..=5).collect();
        assert_eq!(index.first(3), &[1, 2, 3]);
        assert_eq!(index.first(50), &[1, 2, 3, 4, 5]);
        assert!(index.first(0).is_empty());
        assert!(RowIndex::<i64>::default().first(5).is_empty());
    }

    #[test]
    fn positional_access() {
        let index = RowIndex::new(vec!["b".to_string(), "a".to_string()]);
        assert_eq!(index.get(0).map(String::as_str), Some("b"));
        assert_eq!(index.get(2), None);
        let collected: Vec<&String> = index.iter().collect();
        assert_eq!(collected.len(), 2);
        assert_eq!(index.into_vec(), vec!["b", "a"]);
    }
}
