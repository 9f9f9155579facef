use crate::bytes::ByteBufferError;
use crate::transport::TransportError;
use std::fmt;

/// A malformed or unparseable wire frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The input is not a complete binary frame: too short for the route
    /// name plus the trailing request ID.
    IncompleteFrame { len: usize },

    /// Frames travel as binary; a text chunk cannot carry one.
    NotBinary,

    /// Route names are one byte per character on the wire, so they must be
    /// ASCII and at most 255 bytes.
    InvalidRoute(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::IncompleteFrame { len } => {
                write!(f, "incomplete frame ({} bytes)", len)
            }
            ProtocolError::NotBinary => write!(f, "inbound message data must be binary"),
            ProtocolError::InvalidRoute(route) => write!(f, "invalid route name {:?}", route),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Failure at the external schema boundary: the registry had no entry for a
/// route, or a payload did not match the route's shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    UnknownRoute(String),
    Encode(String),
    Decode(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnknownRoute(route) => write!(f, "unknown route {:?}", route),
            CodecError::Encode(msg) => write!(f, "encode failure: {}", msg),
            CodecError::Decode(msg) => write!(f, "decode failure: {}", msg),
        }
    }
}

impl std::error::Error for CodecError {}

/// Umbrella error for the RPC client.
///
/// Buffer and protocol errors are raised to the immediate caller; transport
/// send failures are captured and re-surfaced as
/// [`ClientEvent::Error`](crate::rpc::ClientEvent) instead of propagating
/// through a flush.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    Buffer(ByteBufferError),
    Transport(TransportError),
    Protocol(ProtocolError),
    Codec(CodecError),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Buffer(e) => write!(f, "buffer error: {}", e),
            ClientError::Transport(e) => write!(f, "transport error: {}", e),
            ClientError::Protocol(e) => write!(f, "protocol error: {}", e),
            ClientError::Codec(e) => write!(f, "codec error: {}", e),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Buffer(e) => Some(e),
            ClientError::Transport(e) => Some(e),
            ClientError::Protocol(e) => Some(e),
            ClientError::Codec(e) => Some(e),
        }
    }
}

impl From<ByteBufferError> for ClientError {
    fn from(e: ByteBufferError) -> Self {
        ClientError::Buffer(e)
    }
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        ClientError::Transport(e)
    }
}

impl From<ProtocolError> for ClientError {
    fn from(e: ProtocolError) -> Self {
        ClientError::Protocol(e)
    }
}

impl From<CodecError> for ClientError {
    fn from(e: CodecError) -> Self {
        ClientError::Codec(e)
    }
}
