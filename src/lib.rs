//! chainseal: a tamper-evident, append-only event ledger whose entries are
//! cryptographically signed and hash-chain linked, plus a lightweight
//! governance layer (proposal/vote/quorum) that gates privileged writes.
//!
//! Canonical serialization, the chain verification protocol and the
//! quorum-gated sealing protocol must agree bit-for-bit; they live in
//! [`canonical`], [`ledger`] and [`dao`] respectively. The core performs no
//! network I/O, never retries, and never terminates the process.

pub mod block;
pub mod canonical;
pub mod config;
pub mod crypto;
pub mod dao;
pub mod error;
pub mod ledger;

pub use block::{build_block, Block, BlockEnvelope, BlockType, GENESIS_PREV};
pub use dao::{Dao, Proposal, ProposalDraft, QuorumRule, VoteChoice};
pub use error::{DaoError, IdentityError, LedgerError};
pub use ledger::{FileLedgerStore, Ledger, LedgerStore, MemoryLedgerStore};
