use crate::{ConnEvent, Connector};
use framelink::rpc::{ClientConfig, ClientError, ClientEvent, MessageCodec, RpcClient};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant, sleep_until};

enum Command<V> {
    Connect {
        host: String,
        port: u16,
    },
    ConnectByUrl {
        url: String,
    },
    Notify {
        route: String,
        value: V,
    },
    Request {
        route: String,
        value: V,
        reply: oneshot::Sender<V>,
    },
    Heartbeat,
    SetReconnect(bool),
    Disconnect,
}

/// Handle to the event-loop task.
///
/// All operations are fire-and-forget commands into the loop; `request`
/// additionally hands back a oneshot the reply callback resolves. Cloning
/// the handle clones the command channel.
pub struct TokioRpcClient<V> {
    cmd_tx: mpsc::UnboundedSender<Command<V>>,
}

impl<V> Clone for TokioRpcClient<V> {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
        }
    }
}

impl<V: Send + 'static> TokioRpcClient<V> {
    /// Spawns the event-loop task and returns the command handle plus the
    /// unified event stream.
    pub fn new<C, K>(
        codec: C,
        config: ClientConfig,
        connector: K,
    ) -> (Self, mpsc::UnboundedReceiver<ClientEvent<V>>)
    where
        C: MessageCodec<Value = V> + Send + 'static,
        K: Connector + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_event_loop(codec, config, connector, cmd_rx, event_tx));
        (Self { cmd_tx }, event_rx)
    }

    pub fn connect(&self, host: &str, port: u16) {
        let _ = self.cmd_tx.send(Command::Connect {
            host: host.to_string(),
            port,
        });
    }

    pub fn connect_by_url(&self, url: &str) {
        let _ = self.cmd_tx.send(Command::ConnectByUrl {
            url: url.to_string(),
        });
    }

    pub fn notify(&self, route: &str, value: V) {
        let _ = self.cmd_tx.send(Command::Notify {
            route: route.to_string(),
            value,
        });
    }

    /// Sends a request and resolves with the decoded reply. Resolves to
    /// `None` if the request could not be sent or the event loop went away;
    /// there is no reply timeout, so an unanswered request waits forever.
    pub async fn request(&self, route: &str, value: V) -> Option<V> {
        let (reply, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Request {
            route: route.to_string(),
            value,
            reply,
        });
        rx.await.ok()
    }

    /// Arms the heartbeat watchdog.
    pub fn heartbeat(&self) {
        let _ = self.cmd_tx.send(Command::Heartbeat);
    }

    pub fn set_reconnect(&self, enabled: bool) {
        let _ = self.cmd_tx.send(Command::SetReconnect(enabled));
    }

    pub fn disconnect(&self) {
        let _ = self.cmd_tx.send(Command::Disconnect);
    }
}

fn millis_since(epoch: Instant) -> u64 {
    epoch.elapsed().as_millis() as u64
}

async fn recv_conn(rx: &mut Option<mpsc::UnboundedReceiver<ConnEvent>>) -> Option<ConnEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_opt(deadline: Option<Instant>) {
    match deadline {
        Some(t) => sleep_until(t).await,
        None => std::future::pending().await,
    }
}

async fn run_event_loop<V, C, K>(
    codec: C,
    config: ClientConfig,
    mut connector: K,
    mut cmd_rx: mpsc::UnboundedReceiver<Command<V>>,
    event_tx: mpsc::UnboundedSender<ClientEvent<V>>,
) where
    V: Send + 'static,
    C: MessageCodec<Value = V> + Send + 'static,
    K: Connector + 'static,
{
    let mut client: RpcClient<'static, K::Conn, C> = RpcClient::new(codec, config);
    let mut sink = move |ev: ClientEvent<V>| {
        let _ = event_tx.send(ev);
    };

    let epoch = Instant::now();
    let mut conn_events: Option<mpsc::UnboundedReceiver<ConnEvent>> = None;
    let mut probe_at: Option<Instant> = None;
    let mut watchdog_at: Option<Instant> = None;
    let mut reconnect_at: Option<Instant> = None;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break };
                match cmd {
                    Command::Connect { host, port } => {
                        let url = client.register_url(&host, port);
                        connect_to(
                            &url,
                            &mut connector,
                            &mut client,
                            &mut conn_events,
                            &mut reconnect_at,
                            &mut sink,
                        )
                        .await;
                    }
                    Command::ConnectByUrl { url } => {
                        connect_to(
                            &url,
                            &mut connector,
                            &mut client,
                            &mut conn_events,
                            &mut reconnect_at,
                            &mut sink,
                        )
                        .await;
                    }
                    Command::Notify { route, value } => {
                        if let Err(e) = client.notify(&route, &value, &mut sink) {
                            sink(ClientEvent::Error(e));
                        }
                    }
                    Command::Request { route, value, reply } => {
                        let callback = move |v: V| {
                            let _ = reply.send(v);
                        };
                        if let Err(e) = client.request(&route, &value, callback, &mut sink) {
                            // The oneshot was consumed by the failed
                            // registration; the caller observes `None`.
                            sink(ClientEvent::Error(e));
                        }
                    }
                    Command::Heartbeat => {
                        // Arming always cancels a pending watchdog check.
                        watchdog_at = None;
                        if let Some(delay) = client.arm_heartbeat() {
                            probe_at = Some(Instant::now() + Duration::from_millis(delay));
                        }
                    }
                    Command::SetReconnect(enabled) => {
                        client.set_reconnect(enabled);
                    }
                    Command::Disconnect => {
                        client.disconnect();
                        probe_at = None;
                        watchdog_at = None;
                    }
                }
            }

            ev = recv_conn(&mut conn_events) => {
                match ev {
                    Some(ConnEvent::Open) => {
                        reconnect_at = None;
                        client.handle_open(&mut sink);
                    }
                    Some(ConnEvent::Message(chunk)) => {
                        client.handle_inbound(&chunk, millis_since(epoch), &mut sink);
                    }
                    Some(ConnEvent::Error(e)) => {
                        sink(ClientEvent::Error(ClientError::Transport(e)));
                    }
                    Some(ConnEvent::Closed) => {
                        conn_events = None;
                        if let Some(delay) = client.handle_close(&mut sink) {
                            reconnect_at =
                                Some(Instant::now() + Duration::from_millis(delay));
                        }
                    }
                    None => {
                        // Channel dropped without a Closed notification;
                        // nothing left to drain.
                        conn_events = None;
                    }
                }
            }

            _ = sleep_opt(probe_at) => {
                probe_at = None;
                if let Some(timeout) =
                    client.heartbeat_probe_due(millis_since(epoch), &mut sink)
                {
                    watchdog_at = Some(Instant::now() + Duration::from_millis(timeout));
                }
            }

            _ = sleep_opt(watchdog_at) => {
                watchdog_at = None;
                match client.watchdog_fired(millis_since(epoch), &mut sink) {
                    Some(gap) => {
                        watchdog_at = Some(Instant::now() + Duration::from_millis(gap));
                    }
                    None => {
                        // Either cancelled or timed out; a timeout already
                        // tore the connection down.
                        probe_at = None;
                    }
                }
            }

            _ = sleep_opt(reconnect_at) => {
                reconnect_at = None;
                if let Some(url) = client.reconnect_url().map(str::to_string) {
                    tracing::debug!(url = %url, "reconnect attempt");
                    connect_to(
                        &url,
                        &mut connector,
                        &mut client,
                        &mut conn_events,
                        &mut reconnect_at,
                        &mut sink,
                    )
                    .await;
                }
            }
        }
    }
}

/// One connection attempt. A failure is reported like an immediate close
/// (error event, then the close path), which is what feeds the backoff.
async fn connect_to<V, C, K>(
    url: &str,
    connector: &mut K,
    client: &mut RpcClient<'static, K::Conn, C>,
    conn_events: &mut Option<mpsc::UnboundedReceiver<ConnEvent>>,
    reconnect_at: &mut Option<Instant>,
    sink: &mut (dyn FnMut(ClientEvent<V>) + Send),
) where
    V: Send + 'static,
    C: MessageCodec<Value = V> + Send + 'static,
    K: Connector + 'static,
{
    match connector.connect(url).await {
        Ok((conn, events)) => {
            client.attach(conn);
            *conn_events = Some(events);
        }
        Err(e) => {
            sink(ClientEvent::Error(ClientError::Transport(e)));
            if let Some(delay) = client.handle_close(sink) {
                *reconnect_at = Some(Instant::now() + Duration::from_millis(delay));
            }
        }
    }
}
