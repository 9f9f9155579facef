use crate::bytes::ByteOrder;
use crate::constants::{HEARTBEAT_ROUTE, ONE_WAY_REQUEST_ID};
use crate::rpc::{
    ClientConfig, ClientError, ClientEvent, HeartbeatWatchdog, MessageCodec, ProtocolError,
    ReconnectPolicy, RpcFrameCodec, WatchdogVerdict,
};
use crate::transport::{FramedTransport, InboundChunk, RawDuplex};
use std::collections::HashMap;

/// Event sink the client reports through. One sink receives the unified
/// event stream in delivery order.
pub type EventSink<'s, V> = &'s mut dyn FnMut(ClientEvent<V>);

/// The request/response RPC client.
///
/// Frames messages onto a [`FramedTransport`], assigns correlation IDs,
/// keeps the pending-callback table, and runs the heartbeat and reconnect
/// state machines. The client is sans-IO: a driver feeds it connection
/// events (with the current time in milliseconds) and sleeps for the
/// durations the client hands back. All callbacks therefore interleave but
/// never run concurrently, and messages are processed in the exact order
/// the transport delivered them.
///
/// There is deliberately no per-request timeout: a callback is released
/// only by a matching reply. Entries also survive reconnects; the protocol
/// has no error reply, so a peer that never answers orphans the callback.
pub struct RpcClient<'a, D: RawDuplex, C: MessageCodec> {
    transport: FramedTransport<D>,
    codec: C,
    next_request_id: u32,
    pending: HashMap<u32, Box<dyn FnOnce(C::Value) + Send + 'a>>,
    push_handlers: HashMap<String, Vec<Box<dyn FnMut(&C::Value) + Send + 'a>>>,
    heartbeat: HeartbeatWatchdog,
    reconnect: ReconnectPolicy,
    reconnect_url: Option<String>,
}

impl<'a, D: RawDuplex, C: MessageCodec> RpcClient<'a, D, C> {
    pub fn new(codec: C, config: ClientConfig) -> Self {
        let heartbeat = HeartbeatWatchdog::new(
            config.heartbeat_interval,
            config.effective_heartbeat_timeout(),
            config.gap_threshold,
        );
        let mut reconnect =
            ReconnectPolicy::new(config.reconnect_delay, config.max_reconnect_attempts);
        reconnect.set_enabled(config.reconnect);
        Self {
            transport: FramedTransport::new(ByteOrder::Big),
            codec,
            next_request_id: 0,
            pending: HashMap::new(),
            push_handlers: HashMap::new(),
            heartbeat,
            reconnect,
            reconnect_url: config.reconnect_url,
        }
    }

    /// Builds the URL for a host/port pair and pins it as the reconnect
    /// endpoint if none is set yet. Reconnection always returns to the
    /// first endpoint ever connected to, not to later manual targets.
    pub fn register_url(&mut self, host: &str, port: u16) -> String {
        let url = format!("ws://{}:{}", host, port);
        if self.reconnect_url.is_none() {
            self.reconnect_url = Some(url.clone());
        }
        url
    }

    pub fn reconnect_url(&self) -> Option<&str> {
        self.reconnect_url.as_deref()
    }

    /// Hands a freshly established connection to the transport, which
    /// discards any prior one and rebuilds its buffers.
    pub fn attach(&mut self, conn: D) {
        self.transport.attach(conn);
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn transport(&self) -> &FramedTransport<D> {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut FramedTransport<D> {
        &mut self.transport
    }

    pub fn set_reconnect(&mut self, enabled: bool) {
        self.reconnect.set_enabled(enabled);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Registers a fan-out listener for one-way messages on `route`. Any
    /// number of listeners may watch the same route; each sees every push.
    pub fn on_push<F>(&mut self, route: &str, handler: F)
    where
        F: FnMut(&C::Value) + Send + 'a,
    {
        self.push_handlers
            .entry(route.to_string())
            .or_default()
            .push(Box::new(handler));
    }

    /// The connection reported open.
    pub fn handle_open(&mut self, sink: EventSink<'_, C::Value>) {
        self.transport.mark_open();
        if self.reconnect.on_open() {
            sink(ClientEvent::Reconnect);
        } else {
            sink(ClientEvent::Open);
        }
    }

    /// The connection reported closed. Returns the backoff delay before the
    /// next reconnect attempt, or `None` when no attempt should be made.
    pub fn handle_close(&mut self, sink: EventSink<'_, C::Value>) -> Option<u64> {
        self.transport.mark_closed();
        sink(ClientEvent::Close);
        sink(ClientEvent::Disconnect);
        self.reconnect.on_close()
    }

    /// One inbound chunk arrived. The chunk is absorbed into the transport's
    /// input buffer at the commit frontier, counts as liveness for the
    /// heartbeat deadline, and is then parsed as one complete frame.
    pub fn handle_inbound(
        &mut self,
        chunk: &InboundChunk,
        now: u64,
        sink: EventSink<'_, C::Value>,
    ) {
        self.transport.absorb(chunk);
        self.heartbeat.observe_traffic(now);

        let data = match chunk {
            InboundChunk::Binary(data) => data,
            InboundChunk::Text(_) => {
                sink(ClientEvent::Error(ProtocolError::NotBinary.into()));
                return;
            }
        };

        let frame = match RpcFrameCodec::decode(data) {
            Ok(frame) => frame,
            Err(e) => {
                sink(ClientEvent::Error(e.into()));
                return;
            }
        };

        tracing::debug!(
            request_id = frame.request_id,
            route = %frame.route,
            payload_len = frame.payload.len(),
            "message received"
        );

        match self.codec.decode(&frame.route, &frame.payload) {
            Ok(value) => self.process_message(frame.request_id, &frame.route, value, sink),
            Err(e) => sink(ClientEvent::Error(e.into())),
        }
    }

    /// Sends a one-way message; no reply is expected and none will be
    /// correlated.
    pub fn notify(
        &mut self,
        route: &str,
        value: &C::Value,
        sink: EventSink<'_, C::Value>,
    ) -> Result<(), ClientError> {
        self.send_message(ONE_WAY_REQUEST_ID, route, value, sink)
    }

    /// Sends a request and registers `callback` under a freshly assigned
    /// correlation ID (1, 2, 3, …). The callback fires exactly once, when a
    /// reply with that ID arrives; duplicates are dropped.
    pub fn request<F>(
        &mut self,
        route: &str,
        value: &C::Value,
        callback: F,
        sink: EventSink<'_, C::Value>,
    ) -> Result<u32, ClientError>
    where
        F: FnOnce(C::Value) + Send + 'a,
    {
        if route.is_empty() {
            return Err(ProtocolError::InvalidRoute(String::new()).into());
        }
        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.send_message(request_id, route, value, sink)?;
        self.pending.insert(request_id, Box::new(callback));
        Ok(request_id)
    }

    /// Encodes `value` for `route`, frames it with `request_id`, and
    /// flushes the transport. A send failure is surfaced through the sink;
    /// encoding and framing errors are the caller's.
    pub fn send_message(
        &mut self,
        request_id: u32,
        route: &str,
        value: &C::Value,
        sink: EventSink<'_, C::Value>,
    ) -> Result<(), ClientError> {
        let payload = self.codec.encode(route, value)?;
        self.write_frame(request_id, route, &payload, sink)
    }

    fn write_frame(
        &mut self,
        request_id: u32,
        route: &str,
        payload: &[u8],
        sink: EventSink<'_, C::Value>,
    ) -> Result<(), ClientError> {
        RpcFrameCodec::encode_into(self.transport.output_mut(), request_id, route, payload)?;
        tracing::debug!(
            request_id,
            route,
            payload_len = payload.len(),
            "message sent"
        );
        if let Some(err) = self.transport.flush() {
            sink(ClientEvent::Error(err.into()));
        }
        Ok(())
    }

    /// Routes a decoded message: ID 0 fans out as a push event, anything
    /// else pops its pending callback. A reply whose ID has no registered
    /// callback is silently dropped.
    pub fn process_message(
        &mut self,
        request_id: u32,
        route: &str,
        value: C::Value,
        sink: EventSink<'_, C::Value>,
    ) {
        if request_id == ONE_WAY_REQUEST_ID {
            if let Some(handlers) = self.push_handlers.get_mut(route) {
                for handler in handlers.iter_mut() {
                    handler(&value);
                }
            }
            sink(ClientEvent::Push {
                route: route.to_string(),
                payload: value,
            });
            return;
        }
        match self.pending.remove(&request_id) {
            Some(callback) => callback(value),
            None => {
                tracing::warn!(request_id, "reply without a pending callback, dropped");
            }
        }
    }

    /// Arms the heartbeat probe timer; see [`HeartbeatWatchdog::arm`]. The
    /// driver sleeps for the returned delay and then calls
    /// [`heartbeat_probe_due`](RpcClient::heartbeat_probe_due).
    pub fn arm_heartbeat(&mut self) -> Option<u64> {
        self.heartbeat.arm()
    }

    /// The probe timer fired: sends the zero-ID heartbeat frame and returns
    /// the delay until the watchdog check. Returns `None` (and sends
    /// nothing) when the firing is stale.
    pub fn heartbeat_probe_due(
        &mut self,
        now: u64,
        sink: EventSink<'_, C::Value>,
    ) -> Option<u64> {
        let timeout = self.heartbeat.probe_due(now)?;
        if let Err(err) = self.write_frame(ONE_WAY_REQUEST_ID, HEARTBEAT_ROUTE, &[], sink) {
            sink(ClientEvent::Error(err));
        }
        Some(timeout)
    }

    /// The watchdog timer fired. Returns `Some(gap)` when the check should
    /// be rescheduled (a fresher deadline was set in the interim, or the
    /// timer was delayed); `None` when the watchdog is done, either because
    /// it was cancelled or because it declared a timeout — in the latter
    /// case a `HeartbeatTimeout` event is emitted and the connection is
    /// torn down.
    pub fn watchdog_fired(&mut self, now: u64, sink: EventSink<'_, C::Value>) -> Option<u64> {
        match self.heartbeat.check(now) {
            WatchdogVerdict::Reschedule(gap) => Some(gap),
            WatchdogVerdict::Cancelled => None,
            WatchdogVerdict::TimedOut => {
                tracing::debug!("heartbeat timeout");
                sink(ClientEvent::HeartbeatTimeout);
                self.disconnect();
                None
            }
        }
    }

    /// Tears down the connection and disarms both heartbeat timers. Stale
    /// timer callbacks become inert. Pending request callbacks are *kept*;
    /// they may still be answered after a reconnect.
    pub fn disconnect(&mut self) {
        self.transport.detach();
        self.heartbeat.cancel();
    }
}
