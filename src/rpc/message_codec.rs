use crate::rpc::CodecError;

/// The external schema boundary.
///
/// Given a route name, a codec produces the payload bytes for an outgoing
/// message and reconstructs a typed value from the payload of an incoming
/// one. Where the schema comes from (an IDL-derived descriptor set, a static
/// table, a passthrough) is the implementor's business; the client only ever
/// looks messages up by route.
pub trait MessageCodec {
    /// The decoded message type handed to callbacks and push listeners.
    type Value;

    fn encode(&self, route: &str, value: &Self::Value) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, route: &str, payload: &[u8]) -> Result<Self::Value, CodecError>;
}
