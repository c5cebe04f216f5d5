//! Ledger Block
//!
//! Defines the immutable, signed unit of ledger data and the builder that
//! stamps a block with its content hash and signature. A block's hash covers
//! every envelope field (everything except `hash` and `sig`) via the
//! canonical encoding; the signature is made over the hash string's bytes.

use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::canonical::canonical_json;
use crate::crypto::keys::sign;
use crate::error::LedgerError;

/// Schema identifier stamped on every block.
pub const BLOCK_SCHEMA: &str = "com.chainseal.block";

/// Wire format version stamped on every block.
pub const BLOCK_VERSION: &str = "1.0.0";

/// `prev` value expected of the first block in an empty ledger.
pub const GENESIS_PREV: &str = "0";

/// Kind of a ledger block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Plan,
    Event,
    Seal,
    Epoch,
    Proposal,
    Vote,
    Meta,
}

/// The unsigned portion of a block: everything that is hashed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockEnvelope {
    #[serde(rename = "$schema")]
    pub schema: String,
    #[serde(rename = "$v")]
    pub version: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub action: String,
    pub data: Value,
    pub prev: String,
    pub nonce: String,
    pub ts: i64,
    pub issuer: String,
}

impl BlockEnvelope {
    /// Create an envelope with the current schema constants filled in.
    pub fn new(
        block_type: BlockType,
        action: String,
        data: Value,
        prev: String,
        nonce: String,
        ts: i64,
        issuer: String,
    ) -> Self {
        Self {
            schema: BLOCK_SCHEMA.to_string(),
            version: BLOCK_VERSION.to_string(),
            block_type,
            action,
            data,
            prev,
            nonce,
            ts,
            issuer,
        }
    }
}

/// An immutable, signed, hash-linked ledger entry.
///
/// Constructed once by [`build_block`], never updated or deleted —
/// corrections are new blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "$schema")]
    pub schema: String,
    #[serde(rename = "$v")]
    pub version: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub action: String,
    pub data: Value,
    pub prev: String,
    pub nonce: String,
    pub ts: i64,
    pub issuer: String,
    pub hash: String,
    pub sig: String,
}

impl Block {
    /// Recompute the envelope hash of this block from its fields.
    pub fn expected_hash(&self) -> Result<String, LedgerError> {
        let mut value = serde_json::to_value(self).map_err(anyhow::Error::from)?;
        if let Value::Object(map) = &mut value {
            map.remove("hash");
            map.remove("sig");
        }
        Ok(sha256_hex(&canonical_json(&value)))
    }
}

/// SHA-256 digest of a string, as lowercase hex.
pub fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}

/// Build a signed block from an envelope and the issuer's private key.
///
/// Computes `hash = sha256(canonical_json(envelope))` and
/// `sig = ed25519(hash-bytes)`. Pure given its inputs: the caller supplies
/// the timestamp, there are no hidden clock reads.
pub fn build_block(envelope: BlockEnvelope, signing_key: &SigningKey) -> Result<Block, LedgerError> {
    let value = serde_json::to_value(&envelope).map_err(anyhow::Error::from)?;
    let hash = sha256_hex(&canonical_json(&value));
    let sig = hex::encode(sign(hash.as_bytes(), signing_key));

    Ok(Block {
        schema: envelope.schema,
        version: envelope.version,
        block_type: envelope.block_type,
        action: envelope.action,
        data: envelope.data,
        prev: envelope.prev,
        nonce: envelope.nonce,
        ts: envelope.ts,
        issuer: envelope.issuer,
        hash,
        sig,
    })
}
