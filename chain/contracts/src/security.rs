//! Signature verification for spend authorization
//!
//! The modules treat signature checking as a black box behind
//! `SignatureVerifier`. `Ed25519Verifier` is the shipped implementation.
//! Input witnesses carry the public key next to the signature so the verifier
//! can both check the signature and derive the signing address.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
use types::ids::Address;

/// Length of an ed25519 public key.
pub const PUBKEY_LEN: usize = 32;
/// Length of an ed25519 signature.
pub const SIGNATURE_LEN: usize = 64;
/// Number of digest bytes kept when deriving an address from a public key.
pub const ADDRESS_LEN: usize = 20;

/// Black-box signature scheme consumed by handlers.
pub trait SignatureVerifier {
    /// True iff `sig` is a valid signature of `msg` under `pubkey`.
    fn verify(&self, pubkey: &[u8], msg: &[u8], sig: &[u8]) -> bool;

    /// Address controlled by `pubkey`, `None` if the key is malformed.
    fn address_from_pubkey(&self, pubkey: &[u8]) -> Option<Address>;
}

/// Ed25519 verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, pubkey: &[u8], msg: &[u8], sig: &[u8]) -> bool {
        let Ok(pub_bytes) = <[u8; PUBKEY_LEN]>::try_from(pubkey) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; SIGNATURE_LEN]>::try_from(sig) else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(&pub_bytes) else {
            return false;
        };
        let signature = Signature::from_bytes(&sig_bytes);
        verifying_key.verify(msg, &signature).is_ok()
    }

    fn address_from_pubkey(&self, pubkey: &[u8]) -> Option<Address> {
        if pubkey.len() != PUBKEY_LEN {
            return None;
        }
        Some(derive_address(pubkey))
    }
}

/// Hex of the first 20 bytes of `SHA256(pubkey)`.
pub fn derive_address(pubkey: &[u8]) -> Address {
    let digest = Sha256::digest(pubkey);
    Address::new(hex::encode(&digest[..ADDRESS_LEN]))
}

/// Address controlled by an ed25519 signing key.
pub fn address_of(signing_key: &SigningKey) -> Address {
    derive_address(signing_key.verifying_key().as_bytes())
}

/// Spend authorization attached to a transaction input:
/// `pubkey (32 bytes) || signature (64 bytes)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    pub pubkey: [u8; PUBKEY_LEN],
    pub signature: [u8; SIGNATURE_LEN],
}

impl Witness {
    /// Sign `msg` (a transaction hash) with `signing_key`.
    pub fn sign(signing_key: &SigningKey, msg: &[u8]) -> Self {
        Self {
            pubkey: signing_key.verifying_key().to_bytes(),
            signature: signing_key.sign(msg).to_bytes(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PUBKEY_LEN + SIGNATURE_LEN);
        out.extend_from_slice(&self.pubkey);
        out.extend_from_slice(&self.signature);
        out
    }

    /// Parse a witness, `None` unless exactly 96 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != PUBKEY_LEN + SIGNATURE_LEN {
            return None;
        }
        let (pk, sig) = bytes.split_at(PUBKEY_LEN);
        Some(Self {
            pubkey: pk.try_into().ok()?,
            signature: sig.try_into().ok()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_sign_and_verify() {
        let key = SigningKey::generate(&mut OsRng);
        let witness = Witness::sign(&key, b"tx-hash");
        let verifier = Ed25519Verifier;
        assert!(verifier.verify(&witness.pubkey, b"tx-hash", &witness.signature));
        assert!(!verifier.verify(&witness.pubkey, b"other", &witness.signature));
    }

    #[test]
    fn test_verify_rejects_malformed_inputs() {
        let verifier = Ed25519Verifier;
        assert!(!verifier.verify(&[0u8; 3], b"m", &[0u8; 64]));
        assert!(!verifier.verify(&[0u8; 32], b"m", &[0u8; 10]));
    }

    #[test]
    fn test_address_derivation_is_stable() {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let a = address_of(&key);
        let b = Ed25519Verifier
            .address_from_pubkey(key.verifying_key().as_bytes())
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), ADDRESS_LEN * 2);
        assert!(Ed25519Verifier.address_from_pubkey(&[1, 2]).is_none());
    }

    #[test]
    fn test_witness_bytes() {
        let key = SigningKey::from_bytes(&[9u8; 32]);
        let witness = Witness::sign(&key, b"m");
        let bytes = witness.to_bytes();
        assert_eq!(bytes.len(), 96);
        assert_eq!(Witness::from_bytes(&bytes), Some(witness));
        assert_eq!(Witness::from_bytes(&bytes[1..]), None);
    }
}
