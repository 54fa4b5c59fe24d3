//! Sorted binary Merkle tree with inclusion proofs
//!
//! This crate builds a Merkle tree over a mutable set of opaque leaves.
//! Leaves are identified by the digest of their value, kept sorted by a
//! pluggable comparator, and hashed pairwise level by level up to a single
//! root. Odd-sized levels carry their last node up unchanged.
//!
//! Hashing and ordering come from a [`DigestPolicy`]; the default is SHA-256
//! with byte-lexicographic ordering.
//!
//! ```
//! use hashtree::{verify_proof, MerkleTree, Sha256Policy};
//!
//! let tree = MerkleTree::from_values(["111_data", "222_data", "333_data"]);
//! let leaf = &tree.leaf_digests()[2];
//! let proof = tree.get_proof(leaf).expect("leaf is in the tree");
//! let root = tree.root_hash().expect("tree is built");
//! assert!(verify_proof(&Sha256Policy::new(), leaf, &proof, root).is_ok());
//! ```

pub mod error;
pub mod policy;
pub mod proof;
pub mod store;
pub mod tree;

pub use error::{Error, Result};
pub use hashtree_types::Digest;
pub use policy::{hash_children, DigestPolicy, FnPolicy, HashPolicy, Sha256Policy, Sha512Policy};
pub use proof::{generate_proof, verify_proof, Proof, ProofNode, Side};
pub use store::LeafStore;
pub use tree::{build_levels, next_level, Level, MerkleTree, TreeOptions};
