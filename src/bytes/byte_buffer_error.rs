use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteBufferError {
    /// A read addressed bytes past the logical length, or a raw copy was
    /// given a source range that does not exist. Always fatal to the call;
    /// nothing is silently truncated.
    OutOfBounds { op: &'static str },

    /// A length-prefixed UTF string payload exceeded the range of its 2-byte
    /// length field (65535 bytes).
    LengthOverflow,
}

impl fmt::Display for ByteBufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteBufferError::OutOfBounds { op } => write!(f, "{} error - Out of bounds", op),
            ByteBufferError::LengthOverflow => {
                write!(f, "UTF string byte length exceeds 65535")
            }
        }
    }
}

impl std::error::Error for ByteBufferError {}
