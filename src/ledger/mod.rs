//! Append-Only Ledger
//!
//! Ordered, append-only sequence of signed blocks behind a pluggable storage
//! adapter. Enforces link integrity, replay protection, hash integrity and
//! signature validity on every append, and exposes an independent full-chain
//! verification pass plus a deterministic digest over the whole sequence.

pub mod store;

use std::collections::HashSet;
use tracing::{debug, info};

use crate::block::{sha256_hex, Block, GENESIS_PREV};
use crate::crypto::did::decode_did;
use crate::crypto::keys::verify;
use crate::error::LedgerError;

pub use store::{FileLedgerStore, LedgerStore, MemoryLedgerStore};

/// Sentinel string hashed for the epoch root of an empty ledger.
const EMPTY_ROOT_SENTINEL: &str = "empty";

/// The ledger: one authoritative block sequence bound to one storage adapter.
///
/// Designed for a single logical writer; mutating operations take
/// `&mut self`, so concurrent callers must serialize access with their own
/// lock around the instance.
pub struct Ledger {
    store: Box<dyn LedgerStore>,
    blocks: Vec<Block>,
    seen_nonces: HashSet<String>,
    tip: String,
}

impl Ledger {
    /// Open a ledger over a storage adapter, rebuilding derived state
    /// (nonce set, current tip) from the persisted sequence.
    ///
    /// Loading does not run cryptographic validation; call
    /// [`Ledger::verify_chain`] for that.
    pub fn open(store: Box<dyn LedgerStore>) -> Result<Self, LedgerError> {
        let blocks = store.load_all()?;

        let mut seen_nonces = HashSet::with_capacity(blocks.len());
        let mut tip = GENESIS_PREV.to_string();
        for block in &blocks {
            seen_nonces.insert(block.nonce.clone());
            tip = block.hash.clone();
        }

        info!(count = blocks.len(), "ledger opened");
        Ok(Self {
            store,
            blocks,
            seen_nonces,
            tip,
        })
    }

    /// Append a block after running the full validation pipeline.
    ///
    /// Each step short-circuits with its own error kind: duplicate nonce,
    /// broken prev linkage, envelope hash mismatch, undecodable issuer,
    /// invalid signature. A failed append leaves the ledger unchanged; a
    /// successful one persists the block and advances the tip.
    pub fn append(&mut self, block: Block) -> Result<(), LedgerError> {
        let index = self.blocks.len();
        validate_block(&block, index, &self.tip, &self.seen_nonces)?;

        // Persist before mutating in-memory state so a storage failure
        // cannot leave the two out of sync.
        self.store.append(&block)?;

        self.seen_nonces.insert(block.nonce.clone());
        self.tip = block.hash.clone();
        debug!(index, nonce = %block.nonce, "appended block");
        self.blocks.push(block);
        Ok(())
    }

    /// Re-walk the full persisted sequence, applying every append-time check
    /// to every block in order from a fresh nonce set and the genesis
    /// sentinel. Fails fast with the first violating index and kind.
    pub fn verify_chain(&self) -> Result<(), LedgerError> {
        let blocks = self.store.load_all()?;
        let mut seen_nonces = HashSet::with_capacity(blocks.len());
        let mut prev_hash = GENESIS_PREV.to_string();

        for (index, block) in blocks.iter().enumerate() {
            validate_block(block, index, &prev_hash, &seen_nonces)?;
            seen_nonces.insert(block.nonce.clone());
            prev_hash = block.hash.clone();
        }

        debug!(count = blocks.len(), "chain verified");
        Ok(())
    }

    /// Deterministic fold of all block hashes into a single digest.
    ///
    /// Empty ledger: `sha256("empty")`. Otherwise the first block's hash
    /// seeds the accumulator and each subsequent hash is folded in left to
    /// right via `acc = sha256(acc || next)`.
    pub fn epoch_root(&self) -> Result<String, LedgerError> {
        let blocks = self.store.load_all()?;
        let Some(first) = blocks.first() else {
            return Ok(sha256_hex(EMPTY_ROOT_SENTINEL));
        };

        let mut acc = first.hash.clone();
        for block in &blocks[1..] {
            acc = sha256_hex(&format!("{}{}", acc, block.hash));
        }
        Ok(acc)
    }

    /// Read-only snapshot of the in-memory sequence.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Hash of the last appended block, or the genesis sentinel if empty.
    pub fn tip(&self) -> &str {
        &self.tip
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Export the persisted sequence as a JSON array of block objects.
    pub fn export_json(&self) -> Result<String, LedgerError> {
        let blocks = self.store.load_all()?;
        serde_json::to_string_pretty(&blocks)
            .map_err(|e| LedgerError::Storage(anyhow::Error::from(e)))
    }
}

/// The shared validation pipeline for append and verify_chain.
fn validate_block(
    block: &Block,
    index: usize,
    expected_prev: &str,
    seen_nonces: &HashSet<String>,
) -> Result<(), LedgerError> {
    // 1. Replay protection.
    if seen_nonces.contains(&block.nonce) {
        return Err(LedgerError::Replay {
            index,
            nonce: block.nonce.clone(),
        });
    }

    // 2. Prev linkage.
    if block.prev != expected_prev {
        return Err(LedgerError::Link {
            index,
            expected: expected_prev.to_string(),
            actual: block.prev.clone(),
        });
    }

    // 3. Envelope hash integrity.
    let expected_hash = block.expected_hash()?;
    if block.hash != expected_hash {
        return Err(LedgerError::Integrity {
            index,
            expected: expected_hash,
            actual: block.hash.clone(),
        });
    }

    // 4. Issuer decoding, then signature over the hash.
    let public_key = decode_did(&block.issuer)
        .map_err(|source| LedgerError::Identity { index, source })?;
    let sig_bytes = hex::decode(&block.sig).unwrap_or_default();
    if !verify(block.hash.as_bytes(), &sig_bytes, &public_key) {
        return Err(LedgerError::Signature {
            index,
            issuer: block.issuer.clone(),
        });
    }

    Ok(())
}
