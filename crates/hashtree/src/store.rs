//! Leaf storage
//!
//! Leaves live in a map from digest to raw value, alongside the ordered list
//! of digests that becomes the bottom level of the tree. The list is not a
//! set: a value inserted twice contributes two leaf nodes unless the caller
//! asks for deduplication.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use hashtree_types::Digest;

use crate::policy::DigestPolicy;

/// Digest-keyed leaf values plus their sorted digest list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafStore {
    values: BTreeMap<Digest, Vec<u8>>,
    ordered: Vec<Digest>,
}

impl LeafStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash and store each value, then re-sort
    ///
    /// An existing entry for the same digest has its value overwritten. The
    /// digest is appended to the ordered list again unless `deduplicate` is
    /// set and the digest is already present. Returns the digest of every
    /// value in input order.
    pub fn insert<P, I, V>(&mut self, policy: &P, values: I, deduplicate: bool) -> Vec<Digest>
    where
        P: DigestPolicy + ?Sized,
        I: IntoIterator<Item = V>,
        V: AsRef<[u8]>,
    {
        let mut digests = Vec::new();
        for value in values {
            let value = value.as_ref();
            let digest = policy.digest(value);
            let existed = self.values.insert(digest.clone(), value.to_vec()).is_some();
            if !(deduplicate && existed) {
                self.ordered.push(digest.clone());
            }
            digests.push(digest);
        }
        self.sort(policy);
        digests
    }

    /// Remove each digest from the map and every occurrence from the list
    ///
    /// Returns how many ordered entries were removed.
    pub fn delete<P, I>(&mut self, policy: &P, digests: I) -> usize
    where
        P: DigestPolicy + ?Sized,
        I: IntoIterator,
        I::Item: Borrow<Digest>,
    {
        let before = self.ordered.len();
        for digest in digests {
            let digest = digest.borrow();
            self.values.remove(digest);
            self.ordered.retain(|d| d != digest);
        }
        self.sort(policy);
        before - self.ordered.len()
    }

    /// Sort the ordered list with the policy comparator
    pub fn sort<P: DigestPolicy + ?Sized>(&mut self, policy: &P) {
        self.ordered.sort_by(|a, b| policy.compare(a, b));
    }

    /// Stored value for an exact digest match
    pub fn get(&self, digest: &Digest) -> Option<&[u8]> {
        self.values.get(digest).map(Vec::as_slice)
    }

    /// True if the digest has a stored value
    pub fn contains(&self, digest: &Digest) -> bool {
        self.values.contains_key(digest)
    }

    /// Number of entries in the ordered list, duplicates included
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// True when there are no leaves
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// The sorted digest list
    pub fn ordered(&self) -> &[Digest] {
        &self.ordered
    }

    /// The digest to value map
    pub fn values(&self) -> &BTreeMap<Digest, Vec<u8>> {
        &self.values
    }

    /// Drop every leaf
    pub fn clear(&mut self) {
        self.values.clear();
        self.ordered.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{FnPolicy, Sha256Policy};

    #[test]
    fn test_insert_sorts() {
        let policy = Sha256Policy::new();
        let mut store = LeafStore::new();
        let digests = store.insert(&policy, ["c", "a", "b"], false);

        assert_eq!(digests.len(), 3);
        assert_eq!(store.len(), 3);
        let mut expected = digests.clone();
        expected.sort();
        assert_eq!(store.ordered(), expected.as_slice());
    }

    #[test]
    fn test_insert_uses_policy_order() {
        let policy = FnPolicy::new().with_compare(|a, b| b.cmp(a));
        let mut store = LeafStore::new();
        store.insert(&policy, ["c", "a", "b"], false);

        let ordered = store.ordered();
        assert!(ordered.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_duplicate_insert_keeps_both_entries() {
        let policy = Sha256Policy::new();
        let mut store = LeafStore::new();
        store.insert(&policy, ["dup", "dup"], false);

        assert_eq!(store.len(), 2);
        assert_eq!(store.values().len(), 1);
        assert_eq!(store.ordered()[0], store.ordered()[1]);
    }

    #[test]
    fn test_duplicate_insert_deduplicated() {
        let policy = Sha256Policy::new();
        let mut store = LeafStore::new();
        store.insert(&policy, ["dup"], true);
        store.insert(&policy, ["dup"], true);

        assert_eq!(store.len(), 1);
        assert_eq!(store.values().len(), 1);
    }

    #[test]
    fn test_overwrite_value_for_same_digest() {
        // Every value collides under this hash
        let policy = FnPolicy::new().with_hash(|_| Digest::from([7u8]));
        let mut store = LeafStore::new();
        store.insert(&policy, ["first", "second"], false);

        assert_eq!(store.get(&Digest::from([7u8])), Some(&b"second"[..]));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_delete_removes_all_occurrences() {
        let policy = Sha256Policy::new();
        let mut store = LeafStore::new();
        let digests = store.insert(&policy, ["a", "a", "b"], false);

        let removed = store.delete(&policy, [&digests[0]]);
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
        assert!(!store.contains(&digests[0]));
        assert!(store.contains(&digests[2]));
        assert_eq!(store.get(&digests[0]), None);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let policy = Sha256Policy::new();
        let mut store = LeafStore::new();
        store.insert(&policy, ["a"], false);

        let removed = store.delete(&policy, [policy.digest(b"zzz")]);
        assert_eq!(removed, 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear() {
        let policy = Sha256Policy::new();
        let mut store = LeafStore::new();
        store.insert(&policy, ["a", "b"], false);
        store.clear();

        assert!(store.is_empty());
        assert!(store.values().is_empty());
    }
}
