use crate::transport::TransportError;

/// One inbound chunk delivered by the duplex stream. Chunks may be partial
/// frames or aggregates of several frames; the transport accumulates them
/// and leaves consumption policy to the layer above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundChunk {
    Text(String),
    Binary(Vec<u8>),
}

/// Handle to an established duplex byte stream (a WebSocket-class
/// connection).
///
/// This is the external-collaborator boundary: implementations wrap whatever
/// actually moves bytes. Connection *establishment* is not part of this
/// trait; a driver creates a handle however it likes and attaches it to a
/// [`FramedTransport`](crate::transport::FramedTransport). Asynchronous
/// open/message/error/close notifications travel out-of-band through the
/// driver's event channel.
pub trait RawDuplex {
    /// Passes a byte range directly to the underlying stream.
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Initiates connection shutdown. Idempotent.
    fn close(&mut self);
}
