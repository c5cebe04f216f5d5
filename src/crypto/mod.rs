//! Identity primitives: Ed25519 key pairs and DID:key identifiers.

pub mod did;
pub mod keys;

pub use did::{decode_did, encode_did};
pub use keys::{generate_keypair, sign, verify};
