#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Append-only proof size measurement driver.
//!
//! Seeds a 257-level sparse Merkle dictionary with a dummy leaf, then
//! appends seeded pseudo-random leaves in batches. Each batch builds an
//! append-only proof incrementally, compresses it, verifies it against the
//! roots captured before and after the batch, and records the proof size
//! and verification time per dictionary size in a CSV file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use arbor_core::{hash_bytes, Hash32, LeafIndex, NodeIndex, TREE_LEVELS};
use arbor_tree::{verify_append_only_proof, ProofTree, SparseTree};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "arbor-bench", version, about = "Measures append-only proof sizes for a sparse Merkle dictionary")]
struct Cli {
    /// Seed for the pseudo-random leaf key stream.
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// CSV output path.
    #[arg(long, default_value = "append-proof.csv")]
    csv: PathBuf,

    /// Cumulative dictionary sizes after each batch.
    #[arg(default_values_t = [100usize, 200, 300, 400, 500])]
    sizes: Vec<usize>,

    /// Print a per-level node count summary after the run.
    #[arg(long)]
    summary: bool,
}

/// Seeded leaf stream: keys iterate `SHA256(key)` starting from the 32-byte
/// big-endian encoding of the seed; each data hash covers the key's hex
/// form.
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

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    ensure!(!cli.sizes.is_empty(), "at least one dictionary size is required");
    ensure!(
        cli.sizes[0] > 1 && cli.sizes.windows(2).all(|w| w[0] < w[1]),
        "sizes must be strictly increasing and greater than 1"
    );
    println!("Sizes: {:?}, seed: {}", cli.sizes, cli.seed);

    let run_start = Instant::now();
    run(&cli)?;
    println!("Took {:?}", run_start.elapsed());
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let mut tree = SparseTree::new(TREE_LEVELS);

    // Seed with the all-zero leaf so every proof batch starts from a
    // non-empty tree.
    tree.insert(NodeIndex::zero(), hash_bytes(b"Dummy leaf"), None)?;
    ensure!(
        tree.node_count() == TREE_LEVELS as u64,
        "seeded tree must hold one node per level"
    );

    let mut csv = BufWriter::new(
        File::create(&cli.csv)
            .with_context(|| format!("creating {}", cli.csv.display()))?,
    );
    writeln!(csv, "dictSize,appendOnlyProofSize,verifyUsec")?;

    let mut stream = LeafStream::new(cli.seed);
    let mut prev_size = 1usize;

    for &new_size in &cli.sizes {
        let batch = new_size - prev_size;
        println!("\nAppending new batch of {batch} leaves ...");

        let mut proof = ProofTree::new();
        let old_root = tree.root_hash()?;
        tree.reserve_batch(batch);

        let insert_start = Instant::now();
        for _ in 0..batch {
            let (leaf, data) = stream.next_leaf();
            tree.insert(leaf, data, Some(&mut proof))?;
        }
        let insert_elapsed = insert_start.elapsed();

        let new_root = tree.root_hash()?;
        ensure!(old_root != new_root, "batch left the root unchanged");
        println!("Old root: {old_root}");
        println!("New root: {new_root}");

        let uncompressed = proof.node_count();
        proof.compress();
        tree.clear_new_flags();

        let verify_start = Instant::now();
        ensure!(
            verify_append_only_proof(&proof, &old_root, &new_root),
            "generated proof failed verification"
        );
        let verify_elapsed = verify_start.elapsed();

        let proof_size = proof.node_count();
        let empties = proof.empty_sibling_count();
        println!(
            "dict size: {new_size}, tree nodes: {}, proof size: {proof_size} \
             (uncompressed: {uncompressed}, empty hashes: {empties})",
            tree.node_count()
        );
        println!("Insert time: {insert_elapsed:?}, proof verify time: {verify_elapsed:?}");

        writeln!(
            csv,
            "{},{},{}",
            new_size,
            proof_size,
            verify_elapsed.as_micros()
        )?;
        prev_size = new_size;
    }
    csv.flush()?;

    if cli.summary {
        print_level_summary(&tree);
    }
    Ok(())
}

fn print_level_summary(tree: &SparseTree) {
    let levels: Vec<usize> = (0..TREE_LEVELS).rev().collect();
    for chunk in levels.chunks(4) {
        let line: Vec<String> = chunk
            .iter()
            .map(|&level| format!("Level {:>3}: {:>6} nodes", level, tree.level_len(level)))
            .collect();
        println!("{}", line.join(" | "));
    }
    if let Ok(root) = tree.root_hash() {
        println!("Root node hash: {root}");
    }
}
