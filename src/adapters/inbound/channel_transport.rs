use crate::common::{ConnectionError, TransportError};
use crate::domains::world_sync::{Transport, TransportEvent};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

/// In-memory transport for tests and for embedding the client next to a
/// server in the same process. The far end is driven through [`ChannelPeer`].
pub struct ChannelTransport {
    inbound: mpsc::UnboundedReceiver<TransportEvent>,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    pending: VecDeque<TransportEvent>,
    open: bool,
    address: Arc<Mutex<Option<String>>>,
    close_requested: Arc<AtomicBool>,
}

/// Server side of a [`ChannelTransport`].
pub struct ChannelPeer {
    events: mpsc::UnboundedSender<TransportEvent>,
    sent: mpsc::UnboundedReceiver<Vec<u8>>,
    address: Arc<Mutex<Option<String>>>,
    close_requested: Arc<AtomicBool>,
}

pub fn channel_transport() -> (ChannelTransport, ChannelPeer) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    let address = Arc::new(Mutex::new(None));
    let close_requested = Arc::new(AtomicBool::new(false));

    let transport = ChannelTransport {
        inbound: events_rx,
        outbound: sent_tx,
        pending: VecDeque::new(),
        open: false,
        address: address.clone(),
        close_requested: close_requested.clone(),
    };
    let peer = ChannelPeer {
        events: events_tx,
        sent: sent_rx,
        address,
        close_requested,
    };
    (transport, peer)
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn connect(&mut self, address: &str) -> Result<(), ConnectionError> {
        *self.address.lock().unwrap_or_else(PoisonError::into_inner) = Some(address.to_string());

        loop {
            match self.inbound.recv().await {
                Some(TransportEvent::Opened) => {
                    self.open = true;
                    return Ok(());
                }
                Some(TransportEvent::Error(e)) => {
                    return Err(ConnectionError::Handshake(e.to_string()))
                }
                Some(TransportEvent::Closed) | None => return Err(ConnectionError::Closed),
                // Frames that race ahead of the open signal are replayed afterwards.
                Some(message) => self.pending.push_back(message),
            }
        }
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotConnected);
        }
        self.outbound
            .send(payload.to_vec())
            .map_err(|_| TransportError::PeerGone)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.open = false;
        self.pending.clear();
        self.close_requested.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }
        self.inbound.recv().await
    }

    fn pump(&mut self) -> Vec<TransportEvent> {
        let mut events: Vec<TransportEvent> = self.pending.drain(..).collect();
        while let Ok(event) = self.inbound.try_recv() {
            events.push(event);
        }
        events
    }
}

impl ChannelPeer {
    fn push(&self, event: TransportEvent) {
        // The client may already be gone; there is nobody left to tell.
        let _ = self.events.send(event);
    }

    pub fn open(&self) {
        self.push(TransportEvent::Opened);
    }

    pub fn deliver(&self, bytes: impl Into<Vec<u8>>) {
        self.push(TransportEvent::Message(bytes.into()));
    }

    pub fn deliver_text(&self, text: &str) {
        self.deliver(text.as_bytes().to_vec());
    }

    pub fn fail(&self, error: TransportError) {
        self.push(TransportEvent::Error(error));
    }

    pub fn close(&self) {
        self.push(TransportEvent::Closed);
    }

    /// Frames the client has sent so far.
    pub fn sent_frames(&mut self) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.sent.try_recv() {
            frames.push(frame);
        }
        frames
    }

    pub fn connected_address(&self) -> Option<String> {
        self.address
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested.load(Ordering::SeqCst)
    }
}
