//! Wire format for the paircall UDP protocol.
//!
//! Both peers share a single UDP socket for everything, so every datagram
//! carries a 1-byte type tag distinguishing plaintext key-exchange
//! datagrams from sealed audio frames.

pub mod datagram;
pub mod error;

pub use datagram::{
    Datagram, DatagramType, FRAME_BYTES, FRAME_SAMPLES, KEY_DATAGRAM_LEN, MAX_DATAGRAM_LEN,
    MIN_AUDIO_DATAGRAM_LEN, PCM_SAMPLE_RATE, PUBLIC_KEY_LEN, SEAL_NONCE_LEN,
    SEAL_TAG_LEN,
};
pub use error::ProtocolError;
