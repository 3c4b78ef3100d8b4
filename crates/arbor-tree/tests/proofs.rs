//! Append-only proof scenarios: build, compress, verify, perturb.

use arbor_core::{hash_bytes, Hash32, LeafIndex, NodeIndex, TREE_LEVELS};
use arbor_tree::{
    key_to_index, verify_append_only_proof, PathWalk, ProofTree, SparseTree,
};

struct LeafStream {
    key: [u8; 32],
}

impl LeafStream {
    fn new(seed: u64) -> Self {
        let mut key = [0u8; 32];
        key[24..].copy_from_slice(&seed.to_be_bytes());
        Self { key }
    }

    fn next_leaf(&mut self) -> (LeafIndex, Hash32) {
        self.key = *hash_bytes(&self.key).as_bytes();
        let data = hash_bytes(format!("Data for leaf {}", hex::encode(self.key)).as_bytes());
        (NodeIndex(self.key), data)
    }
}

fn seeded_tree() -> SparseTree {
    let mut tree = SparseTree::new(TREE_LEVELS);
    tree.insert(NodeIndex::zero(), hash_bytes(b"Dummy leaf"), None)
        .unwrap();
    tree
}

/// Run one proof batch of `count` leaves and return `(proof, r0, r1)`.
/// The proof is compressed and the tree's new-node flags are cleared, as
/// the driver does between batches.
fn run_batch(tree: &mut SparseTree, stream: &mut LeafStream, count: usize) -> (ProofTree, Hash32, Hash32) {
    let mut proof = ProofTree::new();
    let old_root = tree.root_hash().unwrap();
    for _ in 0..count {
        let (leaf, data) = stream.next_leaf();
        tree.insert(leaf, data, Some(&mut proof)).unwrap();
    }
    let new_root = tree.root_hash().unwrap();
    proof.compress();
    tree.clear_new_flags();
    (proof, old_root, new_root)
}

/// Snapshot of a proof tree's contents for shape comparisons.
fn proof_snapshot(proof: &ProofTree) -> Vec<(usize, [u8; 32], Hash32, bool)> {
    let mut nodes: Vec<(usize, [u8; 32], Hash32, bool)> = (0..TREE_LEVELS)
        .flat_map(|level| {
            proof
                .as_tree()
                .iter_level(level)
                .map(move |(key, node)| (level, *key, node.hash, node.is_new))
        })
        .collect();
    nodes.sort_by_key(|(level, key, _, _)| (*level, *key));
    nodes
}

#[test]
fn single_append_round_trips() {
    let mut tree = seeded_tree();
    let mut stream = LeafStream::new(1);
    let (proof, r0, r1) = run_batch(&mut tree, &mut stream, 1);

    assert_ne!(r0, r1);
    assert!(proof.verify(&r0, &r1));
    assert!(verify_append_only_proof(&proof, &r0, &r1));

    // The proof binds both roots: swapping either one in must fail.
    assert!(!proof.verify(&r0, &r0));
    assert!(!proof.verify(&r1, &r1));
}

#[test]
fn single_append_proof_size_is_bounded() {
    let mut tree = seeded_tree();
    let mut stream = LeafStream::new(1);

    let mut proof = ProofTree::new();
    let r0 = tree.root_hash().unwrap();
    let (leaf, data) = stream.next_leaf();
    tree.insert(leaf, data, Some(&mut proof)).unwrap();
    let r1 = tree.root_hash().unwrap();

    let uncompressed = proof.node_count();
    assert!(uncompressed <= 2 * 256, "uncompressed: {uncompressed}");

    // A single append is already an antichain; compression is a no-op and
    // verification agrees before and after.
    assert!(proof.verify(&r0, &r1));
    let before = proof_snapshot(&proof);
    proof.compress();
    assert_eq!(proof_snapshot(&proof), before);
    assert!(proof.node_count() <= 256);
    assert!(proof.verify(&r0, &r1));
}

#[test]
fn hundred_leaf_batch_verifies_and_rejects_perturbation() {
    let mut tree = seeded_tree();
    let mut stream = LeafStream::new(1);
    let (mut proof, r0, r1) = run_batch(&mut tree, &mut stream, 100);

    assert!(proof.verify(&r0, &r1));

    // Corrupt one byte of one recorded hash; verification must fail.
    let (level, key, node) = (0..TREE_LEVELS)
        .rev()
        .find_map(|level| {
            proof
                .as_tree()
                .iter_level(level)
                .next()
                .map(|(key, node)| (level, *key, *node))
        })
        .unwrap();
    let mut corrupted = node;
    corrupted.hash.0[0] ^= 0xff;
    proof
        .as_tree_mut()
        .put(level, NodeIndex(key), corrupted);
    assert!(!proof.verify(&r0, &r1));
}

#[test]
fn perturbing_either_root_rejects() {
    let mut tree = seeded_tree();
    let mut stream = LeafStream::new(7);
    let (proof, r0, r1) = run_batch(&mut tree, &mut stream, 25);

    assert!(proof.verify(&r0, &r1));

    for byte in [0usize, 13, 31] {
        let mut bad_old = r0;
        bad_old.0[byte] ^= 0x01;
        assert!(!proof.verify(&bad_old, &r1));

        let mut bad_new = r1;
        bad_new.0[byte] ^= 0x01;
        assert!(!proof.verify(&r0, &bad_new));
    }
}

#[test]
fn compression_is_idempotent() {
    let mut tree = seeded_tree();
    let mut stream = LeafStream::new(11);
    let (mut proof, r0, r1) = run_batch(&mut tree, &mut stream, 60);

    let once = proof_snapshot(&proof);
    proof.compress();
    assert_eq!(proof_snapshot(&proof), once);
    assert!(proof.verify(&r0, &r1));
}

#[test]
fn compressed_proof_is_an_antichain() {
    let mut tree = seeded_tree();
    let mut stream = LeafStream::new(5);
    let (proof, _, _) = run_batch(&mut tree, &mut stream, 80);

    for (level, key, _, _) in proof_snapshot(&proof) {
        for step in PathWalk::from_key(level, &key) {
            if step.level == level {
                continue;
            }
            let ancestor = NodeIndex(arbor_tree::index_to_key(&step.index));
            assert!(
                proof.as_tree().get(step.level, &ancestor).is_none(),
                "node at level {level} still has an ancestor at level {}",
                step.level
            );
        }
    }
}

#[test]
fn empty_siblings_are_counted() {
    let mut tree = seeded_tree();

    // A leaf sharing the dummy path's leading zero byte intersects it at
    // least eight levels down, so the levels above the intersection all
    // contribute absent (empty-hash) siblings to the proof.
    let mut addr = [0u8; 32];
    addr[1] = 0x80;
    let mut proof = ProofTree::new();
    let r0 = tree.root_hash().unwrap();
    tree.insert(NodeIndex(addr), hash_bytes(b"nearby leaf"), Some(&mut proof))
        .unwrap();
    let r1 = tree.root_hash().unwrap();
    proof.compress();
    tree.clear_new_flags();

    assert!(proof.verify(&r0, &r1));
    let empties = proof.empty_sibling_count();
    assert!(empties >= 8);
    assert!(empties < proof.node_count());
}

#[test]
fn successive_batches_each_verify_after_reset() {
    let mut tree = seeded_tree();
    let mut stream = LeafStream::new(1);

    for batch in 0..3 {
        let (proof, r0, r1) = run_batch(&mut tree, &mut stream, 20 + batch);
        assert!(proof.verify(&r0, &r1), "batch {batch}");
        for level in 0..TREE_LEVELS {
            assert!(
                tree.iter_level(level).all(|(_, node)| !node.is_new),
                "stale new flag on level {level} after batch {batch}"
            );
        }
    }
}

#[test]
fn proof_for_one_batch_does_not_verify_another() {
    let mut tree = seeded_tree();
    let mut stream = LeafStream::new(1);
    let (first_proof, first_r0, first_r1) = run_batch(&mut tree, &mut stream, 10);
    let (_, second_r0, second_r1) = run_batch(&mut tree, &mut stream, 10);

    assert!(first_proof.verify(&first_r0, &first_r1));
    assert!(!first_proof.verify(&second_r0, &second_r1));
    assert_eq!(first_r1, second_r0);
}

#[test]
fn key_to_index_is_the_walks_inverse() {
    // Sanity for the helpers the antichain check relies on.
    let key = *hash_bytes(b"anchor").as_bytes();
    let n = key_to_index(&key);
    assert_eq!(arbor_tree::index_to_key(&n), key);
}
