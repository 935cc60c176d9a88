use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("session key derivation failed")]
    KeyDerivation,

    #[error("encryption failed")]
    SealFailed,

    #[error("decryption failed: truncated, wrong key, or tampered data")]
    OpenFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_failed_display() {
        let msg = CryptoError::OpenFailed.to_string();
        assert!(msg.contains("decryption failed"));
    }
}
