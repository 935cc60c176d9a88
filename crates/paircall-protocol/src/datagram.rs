use crate::error::ProtocolError;

/// Datagram types sent over the shared UDP socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DatagramType {
    /// Plaintext X25519 public key, starting or answering a call.
    Key = 0x00,
    /// One sealed PCM audio frame.
    Audio = 0x01,
}

impl DatagramType {
    pub fn from_byte(b: u8) -> Result<Self, ProtocolError> {
        match b {
            0x00 => Ok(Self::Key),
            0x01 => Ok(Self::Audio),
            other => Err(ProtocolError::UnknownDatagramType(other)),
        }
    }
}

/// X25519 public key size.
pub const PUBLIC_KEY_LEN: usize = 32;

/// XChaCha20-Poly1305 nonce prefixed to each sealed frame.
pub const SEAL_NONCE_LEN: usize = 24;

/// Poly1305 authentication tag appended to each sealed frame.
pub const SEAL_TAG_LEN: usize = 16;

/// Key-exchange datagram size: 1 (type) + 32 (public key) = 33 bytes.
pub const KEY_DATAGRAM_LEN: usize = 1 + PUBLIC_KEY_LEN;

/// Smallest well-formed audio datagram: type + nonce + tag, empty ciphertext.
pub const MIN_AUDIO_DATAGRAM_LEN: usize = 1 + SEAL_NONCE_LEN + SEAL_TAG_LEN;

/// PCM audio parameters, matching a raw 16-bit mono capture quantum.
pub const PCM_SAMPLE_RATE: u32 = 44_100;
pub const FRAME_SAMPLES: usize = 1024;
pub const FRAME_BYTES: usize = FRAME_SAMPLES * 2;

/// Largest datagram a peer will ever send: a sealed full PCM frame.
pub const MAX_DATAGRAM_LEN: usize = 1 + SEAL_NONCE_LEN + FRAME_BYTES + SEAL_TAG_LEN;

/// A datagram transmitted between peers.
///
/// Wire format:
/// ```text
/// Key:   [0x00] [public_key: 32 bytes]
/// Audio: [0x01] [nonce: 24 bytes] [ciphertext + 16-byte tag]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datagram {
    Key { public_key: [u8; PUBLIC_KEY_LEN] },
    Audio { sealed: Vec<u8> },
}

impl Datagram {
    /// Create a key-exchange datagram carrying our public key.
    pub fn key(public_key: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self::Key { public_key }
    }

    /// Create an audio datagram from a sealed frame (nonce + ciphertext + tag).
    pub fn audio(sealed: Vec<u8>) -> Self {
        Self::Audio { sealed }
    }

    /// Serialize for UDP transmission.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Key { public_key } => {
                let mut buf = Vec::with_capacity(KEY_DATAGRAM_LEN);
                buf.push(DatagramType::Key as u8);
                buf.extend_from_slice(public_key);
                buf
            }
            Self::Audio { sealed } => {
                let mut buf = Vec::with_capacity(1 + sealed.len());
                buf.push(DatagramType::Audio as u8);
                buf.extend_from_slice(sealed);
                buf
            }
        }
    }

    /// Deserialize from raw UDP bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ProtocolError> {
        let Some(&tag) = data.first() else {
            return Err(ProtocolError::DatagramTooShort {
                expected: 1,
                got: 0,
            });
        };

        match DatagramType::from_byte(tag)? {
            DatagramType::Key => {
                let body = &data[1..];
                if body.len() != PUBLIC_KEY_LEN {
                    return Err(ProtocolError::BadKeyLength(body.len()));
                }
                let mut public_key = [0u8; PUBLIC_KEY_LEN];
                public_key.copy_from_slice(body);
                Ok(Self::Key { public_key })
            }
            DatagramType::Audio => {
                if data.len() < MIN_AUDIO_DATAGRAM_LEN {
                    return Err(ProtocolError::DatagramTooShort {
                        expected: MIN_AUDIO_DATAGRAM_LEN,
                        got: data.len(),
                    });
                }
                Ok(Self::Audio {
                    sealed: data[1..].to_vec(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_key_datagram() {
        let mut key = [0u8; PUBLIC_KEY_LEN];
        for (i, b) in key.iter_mut().enumerate() {
            *b = i as u8;
        }
        let original = Datagram::key(key);
        let bytes = original.to_bytes();
        assert_eq!(bytes.len(), KEY_DATAGRAM_LEN);
        assert_eq!(bytes[0], 0x00);

        let decoded = Datagram::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn roundtrip_audio_datagram() {
        let sealed = vec![0xCC; SEAL_NONCE_LEN + 100 + SEAL_TAG_LEN];
        let original = Datagram::audio(sealed.clone());
        let bytes = original.to_bytes();
        assert_eq!(bytes[0], 0x01);
        assert_eq!(bytes.len(), 1 + sealed.len());

        match Datagram::from_bytes(&bytes).unwrap() {
            Datagram::Audio { sealed: got } => assert_eq!(got, sealed),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn empty_datagram_rejected() {
        assert!(matches!(
            Datagram::from_bytes(&[]),
            Err(ProtocolError::DatagramTooShort { .. })
        ));
    }

    #[test]
    fn unknown_tag_rejected() {
        let result = Datagram::from_bytes(&[0xFF, 1, 2, 3]);
        assert!(matches!(
            result,
            Err(ProtocolError::UnknownDatagramType(0xFF))
        ));
    }

    #[test]
    fn truncated_key_rejected() {
        let mut bytes = vec![0x00];
        bytes.extend_from_slice(&[7u8; 16]);
        assert!(matches!(
            Datagram::from_bytes(&bytes),
            Err(ProtocolError::BadKeyLength(16))
        ));
    }

    #[test]
    fn oversized_key_rejected() {
        let mut bytes = vec![0x00];
        bytes.extend_from_slice(&[7u8; PUBLIC_KEY_LEN + 1]);
        assert!(matches!(
            Datagram::from_bytes(&bytes),
            Err(ProtocolError::BadKeyLength(33))
        ));
    }

    #[test]
    fn audio_shorter_than_seal_overhead_rejected() {
        let bytes = vec![0x01; MIN_AUDIO_DATAGRAM_LEN - 1];
        assert!(matches!(
            Datagram::from_bytes(&bytes),
            Err(ProtocolError::DatagramTooShort { .. })
        ));
    }

    #[test]
    fn minimal_audio_datagram_accepted() {
        let sealed = vec![0u8; SEAL_NONCE_LEN + SEAL_TAG_LEN];
        let bytes = Datagram::audio(sealed.clone()).to_bytes();
        assert_eq!(bytes.len(), MIN_AUDIO_DATAGRAM_LEN);
        assert!(Datagram::from_bytes(&bytes).is_ok());
    }

    #[test]
    fn datagram_type_from_byte() {
        assert_eq!(DatagramType::from_byte(0x00).unwrap(), DatagramType::Key);
        assert_eq!(DatagramType::from_byte(0x01).unwrap(), DatagramType::Audio);
        assert!(DatagramType::from_byte(0x02).is_err());
    }

    #[test]
    fn full_frame_fits_max_datagram() {
        let sealed = vec![0u8; SEAL_NONCE_LEN + FRAME_BYTES + SEAL_TAG_LEN];
        let bytes = Datagram::audio(sealed).to_bytes();
        assert_eq!(bytes.len(), MAX_DATAGRAM_LEN);
    }
}
