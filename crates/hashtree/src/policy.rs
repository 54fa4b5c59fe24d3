//! Digest policies
//!
//! A policy supplies the two capabilities the tree needs from the outside
//! world: turning bytes into a [`Digest`] and ordering two digests. The
//! default is SHA-256 with byte-lexicographic ordering.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use hashtree_types::Digest;
use sha2::{Sha256, Sha512};

/// Hash and ordering capabilities used to build a tree
pub trait DigestPolicy: Send + Sync {
    /// Hash a byte sequence into a digest
    fn digest(&self, data: &[u8]) -> Digest;

    /// Order two digests; leaves are sorted with this before every build
    fn compare(&self, a: &Digest, b: &Digest) -> Ordering {
        a.cmp(b)
    }
}

impl<P: DigestPolicy + ?Sized> DigestPolicy for Box<P> {
    fn digest(&self, data: &[u8]) -> Digest {
        (**self).digest(data)
    }

    fn compare(&self, a: &Digest, b: &Digest) -> Ordering {
        (**self).compare(a, b)
    }
}

impl<P: DigestPolicy + ?Sized> DigestPolicy for Arc<P> {
    fn digest(&self, data: &[u8]) -> Digest {
        (**self).digest(data)
    }

    fn compare(&self, a: &Digest, b: &Digest) -> Ordering {
        (**self).compare(a, b)
    }
}

/// Hash two child nodes to create a parent node
///
/// Returns: digest(left || right)
pub fn hash_children<P: DigestPolicy + ?Sized>(
    policy: &P,
    left: &Digest,
    right: &Digest,
) -> Digest {
    policy.digest(&Digest::concat(left, right))
}

/// Policy backed by any RustCrypto hasher, ordering digests byte-wise
pub struct HashPolicy<D> {
    _hasher: PhantomData<fn() -> D>,
}

/// SHA-256 policy, the default for [`crate::MerkleTree`]
pub type Sha256Policy = HashPolicy<Sha256>;

/// SHA-512 policy
pub type Sha512Policy = HashPolicy<Sha512>;

impl<D> HashPolicy<D> {
    /// Create a new hash policy
    pub fn new() -> Self {
        Self {
            _hasher: PhantomData,
        }
    }
}

impl<D> Default for HashPolicy<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Clone for HashPolicy<D> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<D> fmt::Debug for HashPolicy<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashPolicy")
            .field("hasher", &std::any::type_name::<D>())
            .finish()
    }
}

impl<D: sha2::Digest> DigestPolicy for HashPolicy<D> {
    fn digest(&self, data: &[u8]) -> Digest {
        let mut hasher = D::new();
        hasher.update(data);
        Digest::from_bytes(hasher.finalize().to_vec())
    }
}

type HashFn = dyn Fn(&[u8]) -> Digest + Send + Sync;
type CompareFn = dyn Fn(&Digest, &Digest) -> Ordering + Send + Sync;

/// Policy assembled from closures
///
/// Either closure may be left out; the missing capability falls back to the
/// SHA-256 / byte-lexicographic default.
///
/// # Example
///
/// ```
/// use hashtree::{FnPolicy, MerkleTree};
///
/// // Same hash as the default, leaves kept in descending order
/// let policy = FnPolicy::new().with_compare(|a, b| b.cmp(a));
/// let tree = MerkleTree::from_values_with_policy(["a", "b", "c"], policy);
/// assert!(tree.root_hash().is_some());
/// ```
#[derive(Default, Clone)]
pub struct FnPolicy {
    hash: Option<Arc<HashFn>>,
    compare: Option<Arc<CompareFn>>,
    fallback: Sha256Policy,
}

impl FnPolicy {
    /// Create a policy with both capabilities at their defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom hash function
    pub fn with_hash<F>(mut self, hash: F) -> Self
    where
        F: Fn(&[u8]) -> Digest + Send + Sync + 'static,
    {
        self.hash = Some(Arc::new(hash));
        self
    }

    /// Use a custom digest comparator
    pub fn with_compare<F>(mut self, compare: F) -> Self
    where
        F: Fn(&Digest, &Digest) -> Ordering + Send + Sync + 'static,
    {
        self.compare = Some(Arc::new(compare));
        self
    }

    /// True if a custom hash function was supplied
    pub fn has_custom_hash(&self) -> bool {
        self.hash.is_some()
    }

    /// True if a custom comparator was supplied
    pub fn has_custom_compare(&self) -> bool {
        self.compare.is_some()
    }
}

impl fmt::Debug for FnPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPolicy")
            .field("custom_hash", &self.has_custom_hash())
            .field("custom_compare", &self.has_custom_compare())
            .finish()
    }
}

impl DigestPolicy for FnPolicy {
    fn digest(&self, data: &[u8]) -> Digest {
        match &self.hash {
            Some(hash) => hash(data),
            None => self.fallback.digest(data),
        }
    }

    fn compare(&self, a: &Digest, b: &Digest) -> Ordering {
        match &self.compare {
            Some(compare) => compare(a, b),
            None => self.fallback.compare(a, b),
        }
    }
}
