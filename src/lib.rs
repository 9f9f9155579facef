//! Client-side framed RPC over a raw duplex byte stream.
//!
//! The crate is runtime-agnostic: nothing here performs I/O or arms an OS
//! timer. The byte buffer, transport framing, and the heartbeat/reconnect
//! state machines are all driven by an external event loop (see the
//! `framelink-tokio-client` extension crate) that feeds in connection
//! events and the current time and acts on the returned deadlines.

pub mod bytes;
pub mod constants;
pub mod rpc;
pub mod transport;
