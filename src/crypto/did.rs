//! DID:key encoding of Ed25519 public keys.
//!
//! An issuer identifier is `did:key:` followed by the multibase base58btc
//! encoding (`z` prefix) of the multicodec tag `0xed 0x01` plus the 32-byte
//! public key. Decoding is strict and round-trips exactly.

use crate::crypto::keys::PUBLIC_KEY_LENGTH;
use crate::error::IdentityError;

/// Multicodec prefix identifying an Ed25519 public key.
const ED25519_MULTICODEC_PREFIX: [u8; 2] = [0xed, 0x01];

/// Multibase prefix for base58btc.
const BASE58BTC_PREFIX: char = 'z';

const DID_KEY_PREFIX: &str = "did:key:";

/// Encode a 32-byte Ed25519 public key as a DID:key identifier.
pub fn encode_did(public_key: &[u8; PUBLIC_KEY_LENGTH]) -> String {
    let mut prefixed = Vec::with_capacity(ED25519_MULTICODEC_PREFIX.len() + public_key.len());
    prefixed.extend_from_slice(&ED25519_MULTICODEC_PREFIX);
    prefixed.extend_from_slice(public_key);
    format!(
        "{}{}{}",
        DID_KEY_PREFIX,
        BASE58BTC_PREFIX,
        bs58::encode(prefixed).into_string()
    )
}

/// Decode a DID:key identifier back to the raw Ed25519 public key.
pub fn decode_did(did: &str) -> Result<[u8; PUBLIC_KEY_LENGTH], IdentityError> {
    let encoded = did
        .strip_prefix(DID_KEY_PREFIX)
        .ok_or_else(|| IdentityError::MissingPrefix(did.to_string()))?;

    let payload = encoded
        .strip_prefix(BASE58BTC_PREFIX)
        .ok_or_else(|| IdentityError::Encoding("missing base58btc multibase prefix".to_string()))?;

    let prefixed = bs58::decode(payload)
        .into_vec()
        .map_err(|e| IdentityError::Encoding(e.to_string()))?;

    if prefixed.len() < ED25519_MULTICODEC_PREFIX.len()
        || prefixed[..ED25519_MULTICODEC_PREFIX.len()] != ED25519_MULTICODEC_PREFIX
    {
        return Err(IdentityError::Multicodec);
    }

    let key_bytes = &prefixed[ED25519_MULTICODEC_PREFIX.len()..];
    key_bytes
        .try_into()
        .map_err(|_| IdentityError::KeyLength(key_bytes.len()))
}
