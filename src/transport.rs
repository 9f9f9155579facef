mod framed_transport;
mod raw_duplex;
mod transport_error;

pub use framed_transport::FramedTransport;
pub use raw_duplex::{InboundChunk, RawDuplex};
pub use transport_error::TransportError;
