//! Paircall cryptographic layer.
//!
//! This crate provides:
//! - Ephemeral X25519 identity key pairs, one per process run
//! - `SecureChannel`: X25519 Diffie-Hellman + HKDF-SHA256 key derivation,
//!   XChaCha20-Poly1305 sealing of audio frames with a fresh random nonce
//!   per frame

pub mod channel;
pub mod error;
pub mod identity;

pub use channel::SecureChannel;
pub use error::CryptoError;
pub use identity::Identity;

// Re-exported so consumers don't need a direct x25519-dalek dependency.
pub use x25519_dalek::PublicKey;
