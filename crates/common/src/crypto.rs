//! Crypto helpers: Ed25519 keypair generation, sign, verify, and address
//! derivation. Compatible with ed25519-dalek v2 + rand_core feature.
//!
//! Combined key format (64 bytes):
//!   [0..32]  = private key bytes
//!   [32..64] = public key bytes
//!
//! An oracle's on-ledger address is the first 20 bytes of
//! SHA3-512(pubkey), matching the rest of the address space.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha3::{Digest, Sha3_512};
use thiserror::Error;

use crate::types::Address;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, found {found}")]
    InvalidKeyLength { expected: usize, found: usize },

    #[error("invalid signature length: expected 64, found {found}")]
    InvalidSignatureLength { found: usize },

    #[error("malformed public key")]
    MalformedPublicKey,

    #[error("signature verification failed")]
    VerifyFailed,
}

/// Generate a new Ed25519 keypair and return concatenated 64-byte
/// (private + public).
pub fn generate_keypair_bytes() -> Vec<u8> {
    let mut rng = OsRng;
    let sk = SigningKey::generate(&mut rng);
    let vk = sk.verifying_key();

    let mut combined = Vec::with_capacity(64);
    combined.extend_from_slice(&sk.to_bytes());
    combined.extend_from_slice(&vk.to_bytes());
    combined
}

/// Build a SigningKey from combined keypair bytes.
pub fn signing_key_from_bytes(bytes: &[u8]) -> Result<SigningKey, CryptoError> {
    if bytes.len() != 64 {
        return Err(CryptoError::InvalidKeyLength {
            expected: 64,
            found: bytes.len(),
        });
    }
    let mut sk_bytes = [0u8; 32];
    sk_bytes.copy_from_slice(&bytes[0..32]);
    Ok(SigningKey::from_bytes(&sk_bytes))
}

/// Extract the 32 public key bytes from a 64-byte combined keypair.
pub fn public_key_from_keypair_bytes(kp_bytes: &[u8]) -> Result<[u8; 32], CryptoError> {
    if kp_bytes.len() != 64 {
        return Err(CryptoError::InvalidKeyLength {
            expected: 64,
            found: kp_bytes.len(),
        });
    }
    let mut pk = [0u8; 32];
    pk.copy_from_slice(&kp_bytes[32..64]);
    Ok(pk)
}

/// Sign a message and return the 64-byte signature.
pub fn sign_message(kp_bytes: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let sk = signing_key_from_bytes(kp_bytes)?;
    let sig = sk.sign(message);
    Ok(sig.to_bytes().to_vec())
}

/// Verify `sig_bytes` over `message` against a 32-byte public key.
///
/// Returns `Err(CryptoError::VerifyFailed)` on a well-formed but invalid
/// signature; malformed inputs get their own variants.
pub fn verify_signature(
    pubkey: &[u8; 32],
    message: &[u8],
    sig_bytes: &[u8],
) -> Result<(), CryptoError> {
    if sig_bytes.len() != 64 {
        return Err(CryptoError::InvalidSignatureLength {
            found: sig_bytes.len(),
        });
    }

    let vk = VerifyingKey::from_bytes(pubkey).map_err(|_| CryptoError::MalformedPublicKey)?;

    let mut sig_arr = [0u8; 64];
    sig_arr.copy_from_slice(sig_bytes);
    let sig = Signature::from_bytes(&sig_arr);

    vk.verify(message, &sig).map_err(|_| CryptoError::VerifyFailed)
}

/// Derive the on-ledger address for a public key: first 20 bytes of
/// SHA3-512(pubkey).
#[must_use]
pub fn address_from_pubkey(pubkey: &[u8; 32]) -> Address {
    let digest = Sha3_512::digest(pubkey);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&digest[..20]);
    Address::from_bytes(addr)
}
