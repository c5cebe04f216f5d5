use thiserror::Error;

/// Errors raised while decoding a DID:key issuer identifier.
///
/// Unlike signature verification (which reports `false` for malformed
/// input), identifier decoding fails loudly: a bad issuer string is a
/// caller bug or tampering, not a negative verification result.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("invalid identifier '{0}': missing 'did:key:' prefix")]
    MissingPrefix(String),

    #[error("invalid identifier: {0}")]
    Encoding(String),

    #[error("invalid identifier: unexpected multicodec prefix")]
    Multicodec,

    #[error("invalid identifier: expected 32-byte ed25519 key, got {0} bytes")]
    KeyLength(usize),
}

/// Errors raised by ledger append and chain verification.
///
/// Each variant carries the block index it was detected at plus enough
/// context to diagnose the failure without re-running verification.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("replay detected: duplicate nonce '{nonce}' at index {index}")]
    Replay { index: usize, nonce: String },

    #[error("broken chain at index {index}: expected prev '{expected}', got '{actual}'")]
    Link {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("hash mismatch at index {index}: expected '{expected}', got '{actual}'")]
    Integrity {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("malformed issuer at index {index}: {source}")]
    Identity {
        index: usize,
        #[source]
        source: IdentityError,
    },

    #[error("invalid signature at index {index} (issuer: {issuer})")]
    Signature { index: usize, issuer: String },

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Errors raised by governance operations.
#[derive(Error, Debug)]
pub enum DaoError {
    #[error("proposal '{0}' already exists")]
    DuplicateProposal(String),

    #[error("proposal '{0}' not found")]
    UnknownProposal(String),

    #[error("proposal '{0}' is already sealed")]
    AlreadySealed(String),

    #[error("voter '{voter}' has already voted on proposal '{id}'")]
    DuplicateVote { id: String, voter: String },

    #[error("quorum not met for proposal '{id}': {yes_votes} yes votes, need {required}")]
    QuorumNotMet {
        id: String,
        yes_votes: usize,
        required: String,
    },

    #[error("ledger append failed while sealing: {0}")]
    Ledger(#[from] LedgerError),
}
