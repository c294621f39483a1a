//! Error types for the riffle-format crate.

use thiserror::Error;

use crate::fourcc::FourCC;

/// Errors that can occur when parsing or writing chunk containers.
#[derive(Error, Debug)]
pub enum RiffError {
    #[error("Unexpected end of stream at offset {offset}")]
    EndOfStream { offset: u64 },

    #[error("Malformed length for '{id}' at offset {offset}: {size}")]
    MalformedLength { offset: u64, id: FourCC, size: u64 },

    #[error("Unknown top-level id '{found}' at offset {offset}: expected 'RIFF'")]
    UnknownTopLevelId { offset: u64, found: FourCC },

    #[error("Invalid chunk id '{found}' inside '{container}' at offset {offset}")]
    InvalidChildId {
        offset: u64,
        container: FourCC,
        found: FourCC,
    },

    #[error("Unsupported group sub-type '{found}' at offset {offset}")]
    UnsupportedSubType { offset: u64, found: FourCC },

    /// A visitor callback refused to continue.
    #[error("Visitor aborted: {0}")]
    Visitor(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RiffError {
    /// Whether the parser may contain this error at a group boundary
    /// instead of unwinding out of `parse`.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RiffError::EndOfStream { .. })
    }
}

pub type Result<T> = std::result::Result<T, RiffError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_end_of_stream_is_recoverable() {
        assert!(RiffError::EndOfStream { offset: 12 }.is_recoverable());
        assert!(!RiffError::UnknownTopLevelId {
            offset: 0,
            found: FourCC::JUNK,
        }
        .is_recoverable());
        assert!(!RiffError::Visitor("stop".into()).is_recoverable());
    }

    #[test]
    fn test_messages_carry_context() {
        let err = RiffError::InvalidChildId {
            offset: 20,
            container: FourCC::from_bytes(*b"WAVE"),
            found: FourCC::from_bytes([0x01, 0x02, 0x03, 0x04]),
        };
        let msg = err.to_string();
        assert!(msg.contains("WAVE"));
        assert!(msg.contains("offset 20"));
    }
}
