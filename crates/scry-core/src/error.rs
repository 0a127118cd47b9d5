use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Not attached to a process")]
    NotAttached,

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Failed to write process memory at address {address:#x}: {message}")]
    MemoryWriteFailed { address: u64, message: String },

    #[error("Invalid address: {0:#x}")]
    InvalidAddress(u64),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Signature not found: {0}")]
    SignatureNotFound(String),

    #[error("Unknown patch: {0}")]
    UnknownPatch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Errors a caller must act on. Everything else degrades to absent data.
    pub fn is_actionable(&self) -> bool {
        matches!(
            self,
            Error::ProcessNotFound(_)
                | Error::ProcessOpenFailed(_)
                | Error::NotAttached
                | Error::MemoryWriteFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.is_not_found());

        let other_io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err2 = Error::Io(other_io_err);
        assert!(!err2.is_not_found());
    }

    #[test]
    fn test_actionable_errors() {
        assert!(Error::NotAttached.is_actionable());
        assert!(
            Error::MemoryWriteFailed {
                address: 0x1000,
                message: "denied".to_string()
            }
            .is_actionable()
        );
        assert!(
            !Error::MemoryReadFailed {
                address: 0x1000,
                message: "unmapped".to_string()
            }
            .is_actionable()
        );
        assert!(!Error::InvalidAddress(0).is_actionable());
    }
}
