use crate::rpc::ClientError;

/// Everything the RPC client can report, as one sum type delivered through
/// a single sink.
///
/// Lifecycle events and push messages share the stream so a driver observes
/// them in the exact order they happened. `Push` carries server-initiated
/// (request-id 0) messages; replies to outstanding requests go to their
/// registered callbacks instead and never appear here.
#[derive(Debug)]
pub enum ClientEvent<V> {
    /// First successful connection.
    Open,

    /// Successful connection that followed an unexpected close.
    Reconnect,

    /// The connection closed.
    Close,

    /// Emitted alongside `Close`; the protocol reports every close through
    /// both notifications.
    Disconnect,

    /// A captured failure: transport send, malformed frame, or schema
    /// decode. Never fatal to the event loop.
    Error(ClientError),

    /// The heartbeat watchdog declared the peer dead. The client has
    /// already torn the connection down by the time this is observed.
    HeartbeatTimeout,

    /// A one-way message dispatched by route name.
    Push { route: String, payload: V },
}
