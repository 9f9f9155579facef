use async_trait::async_trait;
use framelink::transport::{InboundChunk, RawDuplex, TransportError};
use tokio::sync::mpsc::UnboundedReceiver;

/// Asynchronous notifications from one established connection.
#[derive(Debug)]
pub enum ConnEvent {
    /// The connection is ready for traffic.
    Open,

    /// One inbound chunk.
    Message(InboundChunk),

    /// A stream fault. Usually followed by `Closed`.
    Error(TransportError),

    /// The connection is gone.
    Closed,
}

/// Establishes duplex connections.
///
/// Returns the send-side handle plus the receiver the connection's
/// notifications arrive on. Implementations are expected to emit
/// `ConnEvent::Open` once the connection is ready and `ConnEvent::Closed`
/// exactly once when it dies.
#[async_trait]
pub trait Connector: Send {
    type Conn: RawDuplex + Send + 'static;

    async fn connect(
        &mut self,
        url: &str,
    ) -> Result<(Self::Conn, UnboundedReceiver<ConnEvent>), TransportError>;
}
