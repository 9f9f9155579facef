mod heartbeat_watchdog;
mod message_codec;
mod reconnect_policy;
mod rpc_client;
mod rpc_client_config;
mod rpc_client_event;
mod rpc_error;
mod rpc_frame;

pub use heartbeat_watchdog::{HeartbeatWatchdog, WatchdogVerdict};
pub use message_codec::MessageCodec;
pub use reconnect_policy::ReconnectPolicy;
pub use rpc_client::{EventSink, RpcClient};
pub use rpc_client_config::ClientConfig;
pub use rpc_client_event::ClientEvent;
pub use rpc_error::{ClientError, CodecError, ProtocolError};
pub use rpc_frame::{RpcFrame, RpcFrameCodec};
