//! Ed25519 signing and verification helpers.
//!
//! Key material is owned by callers; nothing here is persisted. Verification
//! never fails with an error: malformed keys or signatures are verification
//! failures, reported as `false`.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

/// Size of an Ed25519 public key in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Size of an Ed25519 signature in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Generate a fresh Ed25519 keypair from the OS random number generator.
pub fn generate_keypair() -> SigningKey {
    SigningKey::generate(&mut OsRng)
}

/// Sign a message with an Ed25519 private key.
pub fn sign(message: &[u8], signing_key: &SigningKey) -> [u8; SIGNATURE_LENGTH] {
    signing_key.sign(message).to_bytes()
}

/// Verify an Ed25519 signature over a message.
///
/// Returns `false` for a wrong message, wrong key, corrupt signature, or
/// any malformed input. Never returns an error.
pub fn verify(message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
    let key_bytes: [u8; PUBLIC_KEY_LENGTH] = match public_key.try_into() {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let Ok(sig) = Signature::from_slice(signature) else {
        return false;
    };
    verifying_key.verify(message, &sig).is_ok()
}

/// Derive the 32-byte public key from a signing key.
pub fn public_key_bytes(signing_key: &SigningKey) -> [u8; PUBLIC_KEY_LENGTH] {
    signing_key.verifying_key().to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let sk = generate_keypair();
        let pk = public_key_bytes(&sk);
        let msg = b"governance message";

        let sig = sign(msg, &sk);
        assert!(verify(msg, &sig, &pk));
    }

    #[test]
    fn test_verify_wrong_message() {
        let sk = generate_keypair();
        let pk = public_key_bytes(&sk);
        let sig = sign(b"original", &sk);

        assert!(!verify(b"tampered", &sig, &pk));
    }

    #[test]
    fn test_verify_wrong_key() {
        let sk = generate_keypair();
        let other = generate_keypair();
        let sig = sign(b"msg", &sk);

        assert!(!verify(b"msg", &sig, &public_key_bytes(&other)));
    }

    #[test]
    fn test_verify_corrupt_signature() {
        let sk = generate_keypair();
        let pk = public_key_bytes(&sk);
        let mut sig = sign(b"msg", &sk);
        sig[0] ^= 0x01;

        assert!(!verify(b"msg", &sig, &pk));
    }

    #[test]
    fn test_verify_malformed_inputs_return_false() {
        let sk = generate_keypair();
        let pk = public_key_bytes(&sk);
        let sig = sign(b"msg", &sk);

        // Wrong-length key and wrong-length signature must not panic or error.
        assert!(!verify(b"msg", &sig, &pk[..16]));
        assert!(!verify(b"msg", &sig[..32], &pk));
        assert!(!verify(b"msg", &[], &[]));
    }
}
