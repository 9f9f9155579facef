use crate::{ConnEvent, Connector};
use async_trait::async_trait;
use bytes::Bytes;
use framelink::transport::{InboundChunk, RawDuplex, TransportError};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};

/// Send side of one WebSocket connection. Writes go through an unbounded
/// channel into a dedicated send loop, so `send` never blocks the event
/// loop.
pub struct WsConn {
    tx: UnboundedSender<WsMessage>,
}

impl RawDuplex for WsConn {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.tx
            .send(WsMessage::Binary(Bytes::copy_from_slice(bytes)))
            .map_err(|e| TransportError::SendFailure(e.to_string()))
    }

    fn close(&mut self) {
        let _ = self.tx.send(WsMessage::Close(None));
    }
}

/// `Connector` backed by `tokio-tungstenite`.
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    type Conn = WsConn;

    async fn connect(
        &mut self,
        url: &str,
    ) -> Result<(WsConn, mpsc::UnboundedReceiver<ConnEvent>), TransportError> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectionFailure(e.to_string()))?;
        let (mut sender, mut receiver) = ws_stream.split();

        let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<ConnEvent>();

        // Send loop
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let is_close = matches!(msg, WsMessage::Close(_));
                if sender.send(msg).await.is_err() || is_close {
                    break;
                }
            }
        });

        // Receive loop
        let recv_event_tx = event_tx.clone();
        tokio::spawn(async move {
            while let Some(msg) = receiver.next().await {
                match msg {
                    Ok(WsMessage::Binary(data)) => {
                        let _ = recv_event_tx
                            .send(ConnEvent::Message(InboundChunk::Binary(data.to_vec())));
                    }
                    Ok(WsMessage::Text(text)) => {
                        let _ = recv_event_tx.send(ConnEvent::Message(InboundChunk::Text(
                            text.as_str().to_string(),
                        )));
                    }
                    Ok(WsMessage::Close(_)) => break,
                    Ok(WsMessage::Ping(_)) | Ok(WsMessage::Pong(_)) => {}
                    Ok(_) => {
                        let _ = recv_event_tx
                            .send(ConnEvent::Error(TransportError::UnsupportedInputType));
                    }
                    Err(e) => {
                        let _ = recv_event_tx.send(ConnEvent::Error(
                            TransportError::ConnectionFailure(e.to_string()),
                        ));
                        break;
                    }
                }
            }
            let _ = recv_event_tx.send(ConnEvent::Closed);
        });

        // The tungstenite handshake has already completed by this point.
        let _ = event_tx.send(ConnEvent::Open);

        Ok((WsConn { tx }, event_rx))
    }
}
