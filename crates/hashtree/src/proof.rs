//! Merkle inclusion proofs
//!
//! A proof lists, from the leaf level upward, the node each step combines
//! with. Levels with an odd node count carry their last node up unhashed;
//! a leaf on that path gets a [`Side::Promoted`] entry holding its own
//! value so the proof keeps one entry per level below the root.

use hashtree_types::Digest;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::policy::{hash_children, DigestPolicy};
use crate::tree::Level;

/// Where the entry sits relative to the node being proven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Sibling is the left child; the proven node is on the right
    Left,
    /// Sibling is the right child; the proven node is on the left
    Right,
    /// No sibling; the node was carried up unchanged
    Promoted,
}

/// One step of a proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofNode {
    /// Sibling digest, or the node's own digest for [`Side::Promoted`]
    pub digest: Digest,
    /// Position of the entry
    pub side: Side,
}

/// Chain of proof steps from the leaf level up to just below the root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Proof(Vec<ProofNode>);

impl Proof {
    /// Wrap a list of steps, leaf level first
    pub fn new(nodes: Vec<ProofNode>) -> Self {
        Proof(nodes)
    }

    /// The steps, leaf level first
    pub fn nodes(&self) -> &[ProofNode] {
        &self.0
    }

    /// Iterate over steps, leaf level first
    pub fn iter(&self) -> std::slice::Iter<'_, ProofNode> {
        self.0.iter()
    }

    /// Steps in replay order, from the entry beside the leaf to the entry
    /// beside the root's child
    pub fn leaf_to_root(&self) -> std::slice::Iter<'_, ProofNode> {
        self.0.iter()
    }

    /// Number of steps, equal to the tree height minus one
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the proof of a single-leaf tree
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replay the proof from a leaf digest and return the resulting root
    pub fn compute_root<P: DigestPolicy + ?Sized>(
        &self,
        policy: &P,
        leaf: &Digest,
    ) -> Result<Digest> {
        let mut hash = leaf.clone();
        for (step, node) in self.0.iter().enumerate() {
            hash = match node.side {
                Side::Left => hash_children(policy, &node.digest, &hash),
                Side::Right => hash_children(policy, &hash, &node.digest),
                Side::Promoted => {
                    if node.digest != hash {
                        return Err(Error::InvalidProof(format!(
                            "promoted entry at step {} is {}, expected {}",
                            step, node.digest, hash
                        )));
                    }
                    hash
                }
            };
        }
        Ok(hash)
    }
}

impl IntoIterator for Proof {
    type Item = ProofNode;
    type IntoIter = std::vec::IntoIter<ProofNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Proof {
    type Item = &'a ProofNode;
    type IntoIter = std::slice::Iter<'a, ProofNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Derive the proof for `leaf` from a level hierarchy stored root first
///
/// Returns `None` if the hierarchy is empty or the digest is not in the leaf
/// level. With duplicate leaves the first occurrence is proven. A hierarchy
/// whose level sizes do not halve (rounding up) toward the root also yields
/// `None`.
pub fn generate_proof(levels: &[Level], leaf: &Digest) -> Option<Proof> {
    let leaf_level = levels.last()?;
    let mut index = leaf_level.iter().position(|d| d == leaf)?;
    let mut nodes = Vec::with_capacity(levels.len().saturating_sub(1));

    // every level except the root, walked from the leaves upward
    for level in levels.iter().skip(1).rev() {
        let last = level.len().checked_sub(1)?;
        let node = if level.len() % 2 == 1 && index == last {
            ProofNode {
                digest: level.get(index)?.clone(),
                side: Side::Promoted,
            }
        } else if index % 2 == 1 {
            ProofNode {
                digest: level.get(index - 1)?.clone(),
                side: Side::Left,
            }
        } else {
            ProofNode {
                digest: level.get(index + 1)?.clone(),
                side: Side::Right,
            }
        };
        nodes.push(node);
        // integer halving gives the parent's index
        index /= 2;
    }

    Some(Proof(nodes))
}

/// Verify an inclusion proof for a leaf digest
///
/// # Arguments
/// * `policy` - The policy the tree was built with
/// * `leaf` - The digest of the leaf value
/// * `proof` - The proof returned for that leaf
/// * `expected_root` - The root to verify against
///
/// # Returns
/// * `Ok(())` if replaying the proof reproduces `expected_root`
/// * `Err(...)` otherwise
pub fn verify_proof<P: DigestPolicy + ?Sized>(
    policy: &P,
    leaf: &Digest,
    proof: &Proof,
    expected_root: &Digest,
) -> Result<()> {
    let root = proof.compute_root(policy, leaf)?;
    if &root != expected_root {
        tracing::debug!(leaf = %leaf, "inclusion proof does not reproduce root");
        return Err(Error::HashMismatch {
            expected: expected_root.to_hex(),
            actual: root.to_hex(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Sha256Policy;
    use crate::tree::build_levels;

    fn leaves(n: u8) -> Vec<Digest> {
        (0..n).map(|i| Digest::from([i; 4])).collect()
    }

    #[test]
    fn test_empty_levels() {
        assert!(generate_proof(&[], &Digest::from([0u8; 4])).is_none());
    }

    #[test]
    fn test_single_leaf_proof_is_empty() {
        let policy = Sha256Policy::new();
        let levels = build_levels(&policy, &leaves(1));
        let proof = generate_proof(&levels, &leaves(1)[0]).unwrap();
        assert!(proof.is_empty());
        assert!(verify_proof(&policy, &leaves(1)[0], &proof, &levels[0][0]).is_ok());
    }

    #[test]
    fn test_two_leaf_sides() {
        let policy = Sha256Policy::new();
        let leaves = leaves(2);
        let levels = build_levels(&policy, &leaves);

        let proof = generate_proof(&levels, &leaves[0]).unwrap();
        assert_eq!(
            proof.nodes(),
            &[ProofNode {
                digest: leaves[1].clone(),
                side: Side::Right
            }]
        );

        let proof = generate_proof(&levels, &leaves[1]).unwrap();
        assert_eq!(
            proof.nodes(),
            &[ProofNode {
                digest: leaves[0].clone(),
                side: Side::Left
            }]
        );
    }

    #[test]
    fn test_promoted_leaf() {
        let policy = Sha256Policy::new();
        let leaves = leaves(3);
        let levels = build_levels(&policy, &leaves);

        let proof = generate_proof(&levels, &leaves[2]).unwrap();
        assert_eq!(proof.len(), 2);
        assert_eq!(proof.nodes()[0].side, Side::Promoted);
        assert_eq!(proof.nodes()[0].digest, leaves[2]);
        assert_eq!(proof.nodes()[1].side, Side::Left);
        assert_eq!(proof.nodes()[1].digest, levels[1][0]);
        assert!(verify_proof(&policy, &leaves[2], &proof, &levels[0][0]).is_ok());
    }

    #[test]
    fn test_missing_leaf() {
        let policy = Sha256Policy::new();
        let levels = build_levels(&policy, &leaves(4));
        assert!(generate_proof(&levels, &Digest::from([9u8; 4])).is_none());
    }

    #[test]
    fn test_malformed_levels_return_none() {
        let d = |n: u8| Digest::from([n]);

        // interior level too short for the leaf level below it
        let levels = vec![vec![d(0)], vec![d(9)], vec![d(1), d(2), d(3), d(4), d(5)]];
        assert!(generate_proof(&levels, &d(5)).is_none());

        // empty interior level
        let levels = vec![vec![d(0)], vec![], vec![d(1), d(2)]];
        assert!(generate_proof(&levels, &d(1)).is_none());
    }

    #[test]
    fn test_leaf_to_root_order() {
        let policy = Sha256Policy::new();
        let leaves = leaves(4);
        let levels = build_levels(&policy, &leaves);
        let proof = generate_proof(&levels, &leaves[0]).unwrap();

        let steps: Vec<&ProofNode> = proof.leaf_to_root().collect();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].digest, leaves[1]);
        assert_eq!(steps[0].side, Side::Right);
        assert_eq!(steps[1].digest, levels[1][1]);
        assert_eq!(steps[1].side, Side::Right);
    }

    #[test]
    fn test_empty_digest_proof_json() {
        let proof = Proof::new(vec![ProofNode {
            digest: Digest::from_bytes(Vec::new()),
            side: Side::Left,
        }]);
        let json = serde_json::to_string(&proof).unwrap();
        assert_eq!(json, r#"[{"digest":"","side":"left"}]"#);
        let back: Proof = serde_json::from_str(&json).unwrap();
        assert_eq!(back, proof);
    }

    #[test]
    fn test_wrong_root_mismatch() {
        let policy = Sha256Policy::new();
        let leaves = leaves(4);
        let levels = build_levels(&policy, &leaves);
        let proof = generate_proof(&levels, &leaves[1]).unwrap();

        let result = verify_proof(&policy, &leaves[1], &proof, &leaves[0]);
        assert!(matches!(result, Err(Error::HashMismatch { .. })));
    }

    #[test]
    fn test_tampered_promoted_entry() {
        let policy = Sha256Policy::new();
        let leaves = leaves(3);
        let levels = build_levels(&policy, &leaves);
        let mut nodes: Vec<ProofNode> = generate_proof(&levels, &leaves[2])
            .unwrap()
            .into_iter()
            .collect();
        nodes[0].digest = leaves[0].clone();

        let result = verify_proof(&policy, &leaves[2], &Proof::new(nodes), &levels[0][0]);
        assert!(matches!(result, Err(Error::InvalidProof(_))));
    }
}
