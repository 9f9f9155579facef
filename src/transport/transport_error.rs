use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The underlying connection rejected a send. Captured and surfaced as
    /// an error event rather than propagated, so a failing flush does not
    /// interrupt the caller's control flow.
    SendFailure(String),

    /// An operation required a live connection and none is attached.
    NotConnected,

    /// Connection establishment failed, or the stream reported a fault
    /// mid-flight.
    ConnectionFailure(String),

    /// Inbound data was neither text nor binary.
    UnsupportedInputType,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::SendFailure(msg) => write!(f, "send failure: {}", msg),
            TransportError::NotConnected => write!(f, "not connected"),
            TransportError::ConnectionFailure(msg) => {
                write!(f, "connection failure: {}", msg)
            }
            TransportError::UnsupportedInputType => {
                write!(f, "inbound data is neither text nor binary")
            }
        }
    }
}

impl std::error::Error for TransportError {}
