use crate::common::{ClientError, ClientResult, DecodeResult, TransportError};
use crate::config::Config;
use crate::domains::logger::DynLogger;
use crate::domains::world_sync::{
    decode, ClientMessage, Connection, ConnectionState, DynConsumer, Transport, TransportEvent,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Requests an orderly shutdown of a running controller from any task.
#[derive(Clone)]
pub struct ShutdownHandle {
    signal: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.signal.send_replace(true);
    }

    pub fn is_requested(&self) -> bool {
        *self.signal.borrow()
    }
}

async fn shutdown_requested(signal: &mut watch::Receiver<bool>) {
    loop {
        if *signal.borrow_and_update() {
            return;
        }
        if signal.changed().await.is_err() {
            // Sender lives as long as the controller; nothing will ever fire.
            std::future::pending::<()>().await;
        }
    }
}

/// Outcome of dispatching one decoded message.
#[derive(Debug, Clone, Copy)]
struct DispatchReport {
    dispatched: usize,
    skipped: usize,
}

/// Owns the transport and the connection record, drives the
/// `Disconnected -> Connecting -> Open -> Closing -> Closed` lifecycle and
/// forwards decoded entity updates to the world-sync consumer.
pub struct ConnectionController<T: Transport> {
    connection: Connection,
    transport: T,
    consumer: DynConsumer,
    logger: DynLogger,
    nickname: Option<String>,
    tick_interval: Duration,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<T: Transport> ConnectionController<T> {
    pub fn new(
        address: impl Into<String>,
        transport: T,
        consumer: DynConsumer,
        logger: DynLogger,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            connection: Connection::new(address),
            transport,
            consumer,
            logger,
            nickname: None,
            tick_interval: Duration::from_millis(16),
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    pub fn from_config(
        config: &Config,
        transport: T,
        consumer: DynConsumer,
        logger: DynLogger,
    ) -> Self {
        let mut controller = Self::new(config.server.url.clone(), transport, consumer, logger)
            .with_tick_interval(config.controller.tick_interval());
        controller.nickname = config.server.nickname.clone();
        controller
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            signal: self.shutdown_tx.clone(),
        }
    }

    fn transition(&mut self, next: ConnectionState) -> ClientResult<()> {
        let current = self.connection.state;
        if !current.can_transition_to(next) {
            return Err(ClientError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        self.connection.state = next;
        if next == ConnectionState::Open {
            self.connection.opened_at = Some(Utc::now());
        }

        self.logger.info(&format!(
            "Session {} to {}: {} -> {}",
            self.connection.session_id, self.connection.address, current, next
        ));
        self.consumer.on_connection_state_changed(current, next);
        Ok(())
    }

    fn fail(&mut self, error: ClientError) -> ClientError {
        self.logger.error(&format!(
            "Session {} failed: {}",
            self.connection.session_id, error
        ));
        self.connection.last_error = Some(error.to_string());
        if let Err(e) = self.transition(ConnectionState::Errored) {
            self.logger.warn(&e.to_string());
        }
        error
    }

    /// Opens the connection. Suspends until the transport is open, fails, or a
    /// shutdown is requested; in the last case the controller ends `Closed`.
    pub async fn start(&mut self) -> ClientResult<()> {
        self.transition(ConnectionState::Connecting)?;

        let address = self.connection.address.clone();
        let outcome = tokio::select! {
            biased;
            _ = shutdown_requested(&mut self.shutdown_rx) => None,
            result = self.transport.connect(&address) => Some(result),
        };

        match outcome {
            None => {
                self.logger.info("Shutdown requested while connecting");
                self.shutdown().await
            }
            Some(Err(e)) => Err(self.fail(e.into())),
            Some(Ok(())) => {
                self.transition(ConnectionState::Open)?;
                self.send_login().await
            }
        }
    }

    async fn send_login(&mut self) -> ClientResult<()> {
        let Some(nickname) = self.nickname.clone() else {
            return Ok(());
        };
        let bytes = ClientMessage::login(nickname.as_str()).to_bytes()?;
        self.send(&bytes).await?;
        self.logger.info(&format!("Logged in as {}", nickname));
        Ok(())
    }

    pub async fn send(&mut self, payload: &[u8]) -> ClientResult<()> {
        if self.connection.state != ConnectionState::Open {
            return Err(TransportError::NotConnected.into());
        }
        match self.transport.send(payload).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Processes transport events as they arrive until the connection is
    /// closed, errored or shut down.
    pub async fn run(&mut self) -> ClientResult<()> {
        while self.connection.state == ConnectionState::Open {
            let next = tokio::select! {
                biased;
                _ = shutdown_requested(&mut self.shutdown_rx) => None,
                event = self.transport.next_event() => Some(event),
            };

            match next {
                None => return self.shutdown().await,
                Some(Some(event)) => self.process_event(event)?,
                Some(None) => self.process_event(TransportEvent::Closed)?,
            }
        }
        Ok(())
    }

    /// One scheduler step for hosts that pump the transport themselves.
    /// Returns the number of events processed.
    pub async fn tick(&mut self) -> ClientResult<usize> {
        if *self.shutdown_rx.borrow() && !self.connection.state.is_terminal() {
            self.shutdown().await?;
            return Ok(0);
        }
        if self.connection.state != ConnectionState::Open {
            return Ok(0);
        }

        let mut processed = 0;
        for event in self.transport.pump() {
            if self.connection.state != ConnectionState::Open {
                break;
            }
            self.process_event(event)?;
            processed += 1;
        }
        Ok(processed)
    }

    /// Drives [`tick`](Self::tick) on a fixed interval until the connection ends.
    pub async fn run_ticking(&mut self) -> ClientResult<()> {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while self.connection.state == ConnectionState::Open {
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut self.shutdown_rx) => {}
                _ = interval.tick() => {}
            }
            self.tick().await?;
        }
        Ok(())
    }

    /// Closes the connection. Safe in every state: terminal states are left as they are.
    pub async fn shutdown(&mut self) -> ClientResult<()> {
        self.shutdown_tx.send_replace(true);

        match self.connection.state {
            ConnectionState::Disconnected => self.transition(ConnectionState::Closed),
            ConnectionState::Connecting | ConnectionState::Open => {
                self.transition(ConnectionState::Closing)?;
                if let Err(e) = self.transport.close().await {
                    self.logger.warn(&format!("Transport close failed: {}", e));
                }
                self.transition(ConnectionState::Closed)
            }
            ConnectionState::Closing | ConnectionState::Closed | ConnectionState::Errored => Ok(()),
        }
    }

    fn process_event(&mut self, event: TransportEvent) -> ClientResult<()> {
        let state = self.connection.state;
        match event {
            TransportEvent::Opened => {
                if state == ConnectionState::Connecting {
                    self.transition(ConnectionState::Open)?;
                }
            }
            TransportEvent::Message(raw) => {
                if state != ConnectionState::Open {
                    self.logger
                        .debug(&format!("Dropping message received while {}", state));
                    return Ok(());
                }
                match self.dispatch(&raw) {
                    Ok(report) => self.logger.debug(&format!(
                        "Dispatched {} updates, skipped {} unknown",
                        report.dispatched, report.skipped
                    )),
                    Err(e) => {
                        self.logger.warn(&format!("Discarding message: {}", e));
                        self.consumer.on_decode_error(&raw, &e);
                    }
                }
            }
            TransportEvent::Error(e) => {
                if matches!(state, ConnectionState::Connecting | ConnectionState::Open) {
                    return Err(self.fail(e.into()));
                }
                self.logger
                    .debug(&format!("Ignoring transport error while {}: {}", state, e));
            }
            TransportEvent::Closed => {
                if state == ConnectionState::Open {
                    self.logger.info("Server closed the connection");
                    self.transition(ConnectionState::Closed)?;
                }
            }
        }
        Ok(())
    }

    /// Decodes one message and hands its recognized updates to the consumer in
    /// order. Nothing is dispatched unless the whole message decodes.
    fn dispatch(&self, raw: &[u8]) -> DecodeResult<DispatchReport> {
        let envelope = decode(raw)?;
        let recognized = envelope.recognized()?;

        let report = DispatchReport {
            dispatched: recognized.len(),
            skipped: envelope.len() - recognized.len(),
        };
        for update in recognized {
            self.consumer
                .on_entity_update(update.kind, &update.payload, update.position);
        }
        Ok(report)
    }
}
