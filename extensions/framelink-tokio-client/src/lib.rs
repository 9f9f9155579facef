//! Tokio driver for the `framelink` RPC client.
//!
//! The sans-IO core never sleeps and never touches a socket; this crate
//! supplies both. One spawned task owns the client and multiplexes the
//! command channel, connection events, and the three protocol timers
//! (heartbeat probe, watchdog, reconnect) through a single `select!` loop,
//! which gives the core exactly the single-threaded cooperative scheduling
//! it assumes.

mod connector;
mod tokio_rpc_client;
mod ws_connector;

pub use connector::{ConnEvent, Connector};
pub use tokio_rpc_client::TokioRpcClient;
pub use ws_connector::{WsConn, WsConnector};
