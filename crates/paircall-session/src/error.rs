use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("call already in progress")]
    CallInProgress,

    #[error("no call in progress")]
    NotInCall,

    #[error("not connected")]
    NotConnected,

    #[error("crypto error: {0}")]
    Crypto(#[from] paircall_crypto::CryptoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_in_progress_display() {
        assert_eq!(
            SessionError::CallInProgress.to_string(),
            "call already in progress"
        );
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: SessionError = io_err.into();
        assert!(err.to_string().contains("refused"));
    }
}
