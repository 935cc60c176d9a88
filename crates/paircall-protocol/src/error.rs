use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("datagram too short: expected at least {expected} bytes, got {got}")]
    DatagramTooShort { expected: usize, got: usize },

    #[error("unknown datagram type: 0x{0:02x}")]
    UnknownDatagramType(u8),

    #[error("bad public key length: expected 32 bytes, got {0}")]
    BadKeyLength(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datagram_too_short_display() {
        let e = ProtocolError::DatagramTooShort {
            expected: 33,
            got: 7,
        };
        let msg = e.to_string();
        assert!(msg.contains("33"));
        assert!(msg.contains("7"));
    }

    #[test]
    fn unknown_datagram_type_display() {
        let e = ProtocolError::UnknownDatagramType(0xAB);
        assert!(e.to_string().contains("0xab"));
    }

    #[test]
    fn bad_key_length_display() {
        let e = ProtocolError::BadKeyLength(31);
        assert!(e.to_string().contains("31"));
    }
}
