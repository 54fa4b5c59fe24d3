//! Merkle tree construction and state
//!
//! The tree is rebuilt from scratch on every [`MerkleTree::build`]. Levels
//! are stored root first: `levels()[0]` holds the root and the last level
//! holds the sorted leaf digests. A parent is `digest(left || right)`; the
//! trailing node of an odd-sized level is carried up unchanged.
//!
//! ```text
//!   level 0:        H(H(a||b)||c)
//!   level 1:     H(a||b)         c
//!   level 2:     a     b         c
//! ```

use std::borrow::Borrow;
use std::collections::BTreeMap;

use hashtree_types::Digest;

use crate::error::{Error, Result};
use crate::policy::{hash_children, DigestPolicy, Sha256Policy};
use crate::proof::{generate_proof, verify_proof, Proof};
use crate::store::LeafStore;

/// One row of the tree
pub type Level = Vec<Digest>;

/// Compute the parent level of `level`
pub fn next_level<P: DigestPolicy + ?Sized>(policy: &P, level: &[Digest]) -> Level {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => hash_children(policy, left, right),
            // odd node out is promoted as-is
            _ => pair[0].clone(),
        })
        .collect()
}

/// Build the full level hierarchy, root first, from sorted leaf digests
///
/// An empty leaf list yields no levels.
pub fn build_levels<P: DigestPolicy + ?Sized>(policy: &P, leaves: &[Digest]) -> Vec<Level> {
    if leaves.is_empty() {
        return Vec::new();
    }

    let mut levels = vec![leaves.to_vec()];
    while let Some(top) = levels.last().filter(|top| top.len() > 1) {
        let parent = next_level(policy, top);
        levels.push(parent);
    }
    levels.reverse();
    levels
}

/// Options controlling how leaves are registered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeOptions {
    /// Skip the ordering entry for a digest that is already a leaf
    ///
    /// Off by default: inserting the same value twice yields two leaf nodes.
    pub deduplicate_leaves: bool,
}

impl TreeOptions {
    /// Options that keep each digest in the leaf level at most once
    pub fn deduplicated() -> Self {
        Self {
            deduplicate_leaves: true,
        }
    }

    /// Set whether repeated digests are deduplicated
    pub fn with_deduplicate_leaves(mut self, deduplicate: bool) -> Self {
        self.deduplicate_leaves = deduplicate;
        self
    }
}

/// Merkle tree over a mutable set of leaves
///
/// Mutations mark the tree stale; queries that depend on the level
/// hierarchy return `None` until [`MerkleTree::build`] runs again.
///
/// # Examples
///
/// ```
/// use hashtree::MerkleTree;
///
/// let mut tree = MerkleTree::new();
/// let digests = tree.insert(["foo", "bar", "baz"]);
/// tree.build();
///
/// let root = tree.root_hash().unwrap().clone();
/// let proof = tree.get_proof(&digests[0]).unwrap();
/// assert!(tree.verify(&digests[0], &proof).is_ok());
///
/// tree.delete(&digests[1..2]);
/// assert!(tree.root_hash().is_none());
/// tree.build();
/// assert_ne!(tree.root_hash(), Some(&root));
/// ```
///
/// Mutation requires `&mut self`. Share a tree across threads by wrapping it
/// in a `Mutex` or `RwLock`.
#[derive(Debug, Clone)]
pub struct MerkleTree<P: DigestPolicy = Sha256Policy> {
    policy: P,
    options: TreeOptions,
    store: LeafStore,
    levels: Vec<Level>,
    ready: bool,
}

impl MerkleTree {
    /// Create an empty SHA-256 tree
    pub fn new() -> Self {
        Self::with_policy(Sha256Policy::new())
    }

    /// Create a SHA-256 tree from values and build it
    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[u8]>,
    {
        Self::from_values_with_policy(values, Sha256Policy::new())
    }
}

impl Default for MerkleTree {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: DigestPolicy> MerkleTree<P> {
    /// Create an empty tree with a custom policy
    pub fn with_policy(policy: P) -> Self {
        Self::with_options(policy, TreeOptions::default())
    }

    /// Create an empty tree with a custom policy and options
    pub fn with_options(policy: P, options: TreeOptions) -> Self {
        Self {
            policy,
            options,
            store: LeafStore::new(),
            levels: Vec::new(),
            ready: false,
        }
    }

    /// Create a tree with a custom policy from values and build it
    pub fn from_values_with_policy<I, V>(values: I, policy: P) -> Self
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[u8]>,
    {
        let mut tree = Self::with_policy(policy);
        tree.insert(values);
        tree.build();
        tree
    }

    /// Insert one or many raw values, returning their digests in input order
    pub fn insert<I, V>(&mut self, values: I) -> Vec<Digest>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[u8]>,
    {
        self.ready = false;
        let digests = self
            .store
            .insert(&self.policy, values, self.options.deduplicate_leaves);
        tracing::debug!(
            inserted = digests.len(),
            leaves = self.store.len(),
            "inserted leaves"
        );
        digests
    }

    /// Insert a single raw value
    pub fn insert_one(&mut self, value: impl AsRef<[u8]>) -> Digest {
        let mut digests = self.insert(std::iter::once(value));
        // one value in, one digest out
        digests.swap_remove(0)
    }

    /// Delete one or many leaves by digest, removing every occurrence
    pub fn delete<I>(&mut self, digests: I) -> usize
    where
        I: IntoIterator,
        I::Item: Borrow<Digest>,
    {
        self.ready = false;
        let removed = self.store.delete(&self.policy, digests);
        tracing::debug!(removed, leaves = self.store.len(), "deleted leaves");
        removed
    }

    /// Delete a single leaf by digest
    pub fn delete_one(&mut self, digest: &Digest) -> usize {
        self.delete(std::iter::once(digest))
    }

    /// Stored value for an exact digest match
    pub fn find_one(&self, digest: &Digest) -> Option<&[u8]> {
        self.store.get(digest)
    }

    /// Stored value looked up by the base64url text key of its digest
    pub fn find_by_key(&self, key: &str) -> Result<Option<&[u8]>> {
        let digest = Digest::from_base64url(key)?;
        Ok(self.store.get(&digest))
    }

    /// True if a leaf with this digest is stored
    pub fn contains(&self, digest: &Digest) -> bool {
        self.store.contains(digest)
    }

    /// Drop all leaves and levels
    pub fn reset(&mut self) {
        self.store.clear();
        self.levels.clear();
        self.ready = false;
    }

    /// Re-sort the leaf digests with the policy comparator
    pub fn sort(&mut self) {
        self.store.sort(&self.policy);
    }

    /// Recompute every level from the current leaves
    pub fn build(&mut self) {
        self.levels = build_levels(&self.policy, self.store.ordered());
        self.ready = true;
        tracing::debug!(
            leaves = self.store.len(),
            height = self.levels.len(),
            root = ?self.root_hash().map(Digest::to_hex),
            "built merkle tree"
        );
    }

    /// True when the levels reflect the current leaves
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// The root digest, or `None` if the tree is empty or stale
    pub fn root_hash(&self) -> Option<&Digest> {
        if !self.ready {
            return None;
        }
        match self.levels.first().map(Vec::as_slice) {
            Some([root]) => Some(root),
            _ => None,
        }
    }

    /// The root digest as lowercase hex
    pub fn root_hex(&self) -> Option<String> {
        self.root_hash().map(Digest::to_hex)
    }

    /// Number of leaf entries, duplicates included
    pub fn leaf_count(&self) -> usize {
        self.store.len()
    }

    /// Leaf values keyed by digest
    pub fn leaves(&self) -> &BTreeMap<Digest, Vec<u8>> {
        self.store.values()
    }

    /// Leaf values keyed by the base64url encoding of their digest
    pub fn leaves_by_key(&self) -> BTreeMap<String, &[u8]> {
        self.store
            .values()
            .iter()
            .map(|(digest, value)| (digest.to_base64url(), value.as_slice()))
            .collect()
    }

    /// Sorted leaf digests as they will appear in the bottom level
    pub fn leaf_digests(&self) -> &[Digest] {
        self.store.ordered()
    }

    /// Levels from the last build, root first
    ///
    /// After a mutation this still holds the previous build; check
    /// [`MerkleTree::is_ready`] first.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Number of levels in the last build, 0 for an empty tree
    pub fn height(&self) -> usize {
        self.levels.len()
    }

    /// Inclusion proof for a leaf digest, or `None` if the tree is stale or
    /// the digest is not a leaf
    pub fn get_proof(&self, digest: &Digest) -> Option<Proof> {
        self.try_proof(digest).ok()
    }

    /// Inclusion proof for a leaf digest, reporting why one is unavailable
    pub fn try_proof(&self, digest: &Digest) -> Result<Proof> {
        if !self.ready {
            return Err(Error::TreeNotReady);
        }
        generate_proof(&self.levels, digest).ok_or_else(|| {
            tracing::trace!(leaf = %digest, "no proof for digest");
            Error::LeafNotFound(digest.to_hex())
        })
    }

    /// Verify a proof against this tree's root with its own policy
    ///
    /// The proof must carry exactly one step per level below the root.
    pub fn verify(&self, digest: &Digest, proof: &Proof) -> Result<()> {
        let root = self.root_hash().ok_or(Error::TreeNotReady)?;
        let expected = self.height() - 1;
        if proof.len() != expected {
            return Err(Error::InvalidProof(format!(
                "expected {} proof steps, got {}",
                expected,
                proof.len()
            )));
        }
        verify_proof(&self.policy, digest, proof, root)
    }

    /// The digest policy
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// The tree options
    pub fn options(&self) -> &TreeOptions {
        &self.options
    }
}
