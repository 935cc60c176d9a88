//! Authenticated encryption of audio frames between two peers.
//!
//! The channel key is derived from an X25519 Diffie-Hellman exchange via
//! HKDF-SHA256, so both sides arrive at the same key regardless of who
//! dialed. Frames are sealed with XChaCha20-Poly1305 under a fresh random
//! 24-byte nonce, prefixed to the ciphertext:
//!
//! ```text
//! [nonce: 24 bytes] [ciphertext + 16-byte Poly1305 tag]
//! ```

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use paircall_protocol::{SEAL_NONCE_LEN, SEAL_TAG_LEN};

use crate::error::CryptoError;

/// HKDF context string binding derived keys to this protocol.
const SESSION_KEY_INFO: &[u8] = b"paircall v1 session key";

/// A keyed box over one (local secret, remote public) pair.
///
/// Stateless apart from the key material: sealing draws a new nonce per
/// call, so the channel can be shared freely between tasks.
#[derive(Clone)]
pub struct SecureChannel {
    cipher: XChaCha20Poly1305,
}

impl SecureChannel {
    /// Derive the shared channel for `local` and `remote`.
    pub fn new(local: &StaticSecret, remote: &PublicKey) -> Result<Self, CryptoError> {
        let shared = local.diffie_hellman(remote);

        let hk = Hkdf::<Sha256>::new(None, shared.as_bytes());
        let mut key_bytes = [0u8; 32];
        hk.expand(SESSION_KEY_INFO, &mut key_bytes)
            .map_err(|_| CryptoError::KeyDerivation)?;

        let cipher = XChaCha20Poly1305::new(Key::from_slice(&key_bytes));
        key_bytes.zeroize();

        Ok(Self { cipher })
    }

    /// Seal a plaintext frame: fresh random nonce, then nonce + ciphertext + tag.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CryptoError::SealFailed)?;

        let mut out = Vec::with_capacity(SEAL_NONCE_LEN + ciphertext.len());
        out.extend_from_slice(nonce.as_slice());
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Open a sealed frame. Fails on truncation, a wrong key, or any
    /// tampering; never panics.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if sealed.len() < SEAL_NONCE_LEN + SEAL_TAG_LEN {
            return Err(CryptoError::OpenFailed);
        }

        let (nonce, ciphertext) = sealed.split_at(SEAL_NONCE_LEN);
        self.cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::OpenFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;

    fn channel_pair() -> (SecureChannel, SecureChannel) {
        let a = Identity::generate();
        let b = Identity::generate();
        let ab = a.channel_with(&b.public_key()).unwrap();
        let ba = b.channel_with(&a.public_key()).unwrap();
        (ab, ba)
    }

    #[test]
    fn seal_open_roundtrip_both_directions() {
        let (ab, ba) = channel_pair();
        let frame = vec![0x42u8; 2048];

        let sealed = ab.seal(&frame).unwrap();
        assert_eq!(sealed.len(), SEAL_NONCE_LEN + frame.len() + SEAL_TAG_LEN);
        assert_eq!(ba.open(&sealed).unwrap(), frame);

        let sealed = ba.seal(&frame).unwrap();
        assert_eq!(ab.open(&sealed).unwrap(), frame);
    }

    #[test]
    fn nonces_are_fresh_per_seal() {
        let (ab, _) = channel_pair();
        let frame = b"identical plaintext";
        let first = ab.seal(frame).unwrap();
        let second = ab.seal(frame).unwrap();
        assert_ne!(first, second);
        assert_ne!(&first[..SEAL_NONCE_LEN], &second[..SEAL_NONCE_LEN]);
    }

    #[test]
    fn wrong_key_fails_to_open() {
        let (ab, _) = channel_pair();
        let (_, other) = channel_pair();
        let sealed = ab.seal(b"secret frame").unwrap();
        assert!(matches!(other.open(&sealed), Err(CryptoError::OpenFailed)));
    }

    #[test]
    fn tampered_ciphertext_fails_to_open() {
        let (ab, ba) = channel_pair();
        let mut sealed = ab.seal(b"secret frame").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(matches!(ba.open(&sealed), Err(CryptoError::OpenFailed)));
    }

    #[test]
    fn tampered_nonce_fails_to_open() {
        let (ab, ba) = channel_pair();
        let mut sealed = ab.seal(b"secret frame").unwrap();
        sealed[0] ^= 0x01;
        assert!(matches!(ba.open(&sealed), Err(CryptoError::OpenFailed)));
    }

    #[test]
    fn truncated_input_fails_without_panic() {
        let (ab, ba) = channel_pair();
        let sealed = ab.seal(b"secret frame").unwrap();
        for len in [0, 1, SEAL_NONCE_LEN, SEAL_NONCE_LEN + SEAL_TAG_LEN - 1] {
            assert!(ba.open(&sealed[..len]).is_err());
        }
    }

    #[test]
    fn empty_frame_roundtrip() {
        let (ab, ba) = channel_pair();
        let sealed = ab.seal(&[]).unwrap();
        assert_eq!(ba.open(&sealed).unwrap(), Vec::<u8>::new());
    }
}
