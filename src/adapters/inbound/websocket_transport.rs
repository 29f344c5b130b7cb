use crate::common::{ConnectionError, TransportError};
use crate::domains::world_sync::{Transport, TransportEvent};
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

/// WebSocket transport. Frames are read on a background task and handed to the
/// controller through an ordered channel; writes happen on the caller's task.
pub struct WebSocketTransport {
    connect_timeout: Duration,
    writer: Option<WsWriter>,
    events: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    reader_task: Option<JoinHandle<()>>,
}

impl WebSocketTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            writer: None,
            events: None,
            reader_task: None,
        }
    }

    fn validate_address(address: &str) -> Result<(), ConnectionError> {
        let url = url::Url::parse(address).map_err(|e| ConnectionError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "ws" | "wss" => Ok(()),
            other => Err(ConnectionError::InvalidAddress {
                address: address.to_string(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        }
    }

    async fn read_frames(mut reader: WsReader, events: mpsc::UnboundedSender<TransportEvent>) {
        while let Some(frame) = reader.next().await {
            let event = match frame {
                Ok(Message::Text(text)) => TransportEvent::Message(text.into_bytes()),
                Ok(Message::Binary(bytes)) => TransportEvent::Message(bytes),
                Ok(Message::Close(frame)) => {
                    tracing::debug!("Server sent close frame: {:?}", frame);
                    break;
                }
                // Ping/pong are answered by tungstenite itself.
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => continue,
                Err(tungstenite::Error::ConnectionClosed) => break,
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    let _ = events.send(TransportEvent::Error(TransportError::Io(e.to_string())));
                    return;
                }
            };
            if events.send(event).is_err() {
                return;
            }
        }
        let _ = events.send(TransportEvent::Closed);
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&mut self, address: &str) -> Result<(), ConnectionError> {
        Self::validate_address(address)?;

        let (ws_stream, _response) = tokio::time::timeout(self.connect_timeout, connect_async(address))
            .await
            .map_err(|_| ConnectionError::Timeout {
                address: address.to_string(),
                timeout_ms: self.connect_timeout.as_millis() as u64,
            })?
            .map_err(|e| ConnectionError::Handshake(e.to_string()))?;

        tracing::info!("WebSocket connected to {}", address);

        let (writer, reader) = ws_stream.split();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        self.reader_task = Some(tokio::spawn(Self::read_frames(reader, events_tx)));
        self.writer = Some(writer);
        self.events = Some(events_rx);
        Ok(())
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let writer = self.writer.as_mut().ok_or(TransportError::NotConnected)?;
        let message = match std::str::from_utf8(payload) {
            Ok(text) => Message::Text(text.to_string()),
            Err(_) => Message::Binary(payload.to_vec()),
        };
        writer
            .send(message)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let mut result = Ok(());
        if let Some(mut writer) = self.writer.take() {
            match writer.send(Message::Close(None)).await {
                Ok(()) => {}
                Err(tungstenite::Error::ConnectionClosed)
                | Err(tungstenite::Error::AlreadyClosed) => {}
                Err(e) => result = Err(TransportError::Io(e.to_string())),
            }
        }

        // Wait for the reader to see the close. Frames still queued are discarded.
        if let Some(events) = self.events.as_mut() {
            let drain = async {
                while let Some(event) = events.recv().await {
                    if matches!(event, TransportEvent::Closed | TransportEvent::Error(_)) {
                        break;
                    }
                }
            };
            if tokio::time::timeout(self.connect_timeout, drain).await.is_err() {
                tracing::warn!("Server did not acknowledge close in time; dropping the stream");
            }
        }
        self.events = None;

        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        result
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        match self.events.as_mut() {
            Some(events) => events.recv().await,
            None => None,
        }
    }

    fn pump(&mut self) -> Vec<TransportEvent> {
        let mut drained = Vec::new();
        if let Some(events) = self.events.as_mut() {
            while let Ok(event) = events.try_recv() {
                drained.push(event);
            }
        }
        drained
    }
}
