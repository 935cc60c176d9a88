//! Ephemeral identity key pair.
//!
//! Each process run generates one X25519 key pair at startup. Keys are
//! never persisted; a restart is a new identity.

use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::channel::SecureChannel;
use crate::error::CryptoError;

/// The local peer's key pair for the lifetime of the process.
pub struct Identity {
    secret: StaticSecret,
    public: PublicKey,
}

impl Identity {
    /// Generate a fresh key pair from the OS secure random source.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// The public key as sent in a key-exchange datagram.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// Derive the secure channel shared with the holder of `remote`.
    pub fn channel_with(&self, remote: &PublicKey) -> Result<SecureChannel, CryptoError> {
        SecureChannel::new(&self.secret, remote)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_identities_differ() {
        let a = Identity::generate();
        let b = Identity::generate();
        assert_ne!(a.public_key_bytes(), b.public_key_bytes());
    }

    #[test]
    fn public_key_bytes_roundtrip() {
        let id = Identity::generate();
        let restored = PublicKey::from(id.public_key_bytes());
        assert_eq!(restored, id.public_key());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let id = Identity::generate();
        let out = format!("{:?}", id);
        assert!(out.contains("public"));
        assert!(!out.contains("secret"));
    }
}
