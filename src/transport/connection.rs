//! Connection state management.
//!
//! The [`ConnectionManager`] is a handle to an actor task that owns the single
//! TCP connection and the [`OutboundBuffer`]. Every mutation is routed through
//! the actor's command channel, so the transport state has exactly one writer.
//! Reads and writes run in per-connection tasks; the actor itself never waits
//! on the socket.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::error::TransportError;
use super::outbound::{Dispatch, OutboundBuffer};
use super::socket::{ReceiveOutcome, RecordReader, receive_loop};
use super::writer::{WriteQueue, write_loop};
use crate::core::{DEFAULT_INBOUND_CAPACITY, DEFAULT_WAITING_RETRY_INTERVAL};
use crate::message::InboundMessage;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionPhase {
    /// No connection and no attempt in progress.
    #[default]
    Disconnected,
    /// Opening the transport.
    Connecting,
    /// Transport open, records flow.
    Ready,
    /// Transport failed; about to reset.
    Failed,
    /// Peer closed the transport; about to reset.
    Closed,
}

/// Connection state machine.
///
/// `Disconnected -> Connecting -> Ready -> (Failed | Closed) -> Disconnected`.
/// Each connection attempt gets a new generation so notices from an attempt
/// that has since been reset can be recognized and ignored.
#[derive(Debug, Default)]
pub struct ConnectionState {
    phase: ConnectionPhase,
    generation: u64,
}

impl ConnectionState {
    /// Create a disconnected state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Generation of the current (or last) attempt.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Begin a new attempt.
    ///
    /// Returns the attempt's generation, or `None` when an attempt is
    /// already connecting or ready.
    pub fn begin_connect(&mut self) -> Option<u64> {
        match self.phase {
            ConnectionPhase::Connecting | ConnectionPhase::Ready => None,
            _ => {
                self.generation += 1;
                self.phase = ConnectionPhase::Connecting;
                Some(self.generation)
            }
        }
    }

    /// Transport of attempt `generation` opened.
    pub fn mark_ready(&mut self, generation: u64) -> bool {
        if self.generation == generation && self.phase == ConnectionPhase::Connecting {
            self.phase = ConnectionPhase::Ready;
            true
        } else {
            false
        }
    }

    /// Attempt `generation` failed while connecting or ready.
    pub fn mark_failed(&mut self, generation: u64) -> bool {
        if self.is_current(generation) {
            self.phase = ConnectionPhase::Failed;
            true
        } else {
            false
        }
    }

    /// Peer closed the ready transport of attempt `generation`.
    pub fn mark_closed(&mut self, generation: u64) -> bool {
        if self.generation == generation && self.phase == ConnectionPhase::Ready {
            self.phase = ConnectionPhase::Closed;
            true
        } else {
            false
        }
    }

    /// Return to `Disconnected`, invalidating the current generation.
    pub fn reset(&mut self) {
        self.phase = ConnectionPhase::Disconnected;
        self.generation += 1;
    }

    /// Check if `generation` is the live attempt.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
            && matches!(self.phase, ConnectionPhase::Connecting | ConnectionPhase::Ready)
    }
}

/// Why a connection went back to `Disconnected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The connect attempt failed.
    ConnectFailed(String),
    /// The peer closed the connection.
    EndOfStream,
    /// Reading failed.
    ReadFailed(String),
    /// Writing failed.
    WriteFailed(String),
}

impl From<TransportError> for DisconnectReason {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Connect(_) => DisconnectReason::ConnectFailed(error.to_string()),
            TransportError::Read(_) => DisconnectReason::ReadFailed(error.to_string()),
            TransportError::Write(_) => DisconnectReason::WriteFailed(error.to_string()),
            TransportError::EndOfStream => DisconnectReason::EndOfStream,
        }
    }
}

/// Transitions reported to the owner of a [`ConnectionManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The transport is ready and pending records were flushed.
    Ready {
        /// Attempt that became ready. Batches for it are accepted by
        /// [`ConnectionManager::submit_batch`] until it goes away.
        generation: u64,
    },
    /// The transport failed or was closed by the peer.
    ///
    /// An explicit [`ConnectionManager::close`] reports nothing.
    Disconnected(DisconnectReason),
}

/// Connection manager settings.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// Capacity of the decoded inbound message channel.
    pub inbound_capacity: usize,
    /// Optional bound on buffered outbound records (drop-oldest).
    pub outbound_limit: Option<usize>,
    /// Delay before retrying a connect that found the network unavailable.
    pub waiting_retry_interval: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            inbound_capacity: DEFAULT_INBOUND_CAPACITY,
            outbound_limit: None,
            waiting_retry_interval: DEFAULT_WAITING_RETRY_INTERVAL,
        }
    }
}

/// Point-in-time connection counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Records written to the transport.
    pub records_sent: u64,
    /// Inbound records discarded as malformed.
    pub decode_failures: u64,
    /// Records waiting in the outbound buffer.
    pub pending: usize,
    /// Buffered records discarded by the outbound limit.
    pub outbound_dropped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    records_sent: Arc<AtomicU64>,
    decode_failures: Arc<AtomicU64>,
    pending: AtomicUsize,
    outbound_dropped: AtomicU64,
}

enum Command {
    Connect(String),
    Submit(Bytes),
    SubmitBatch { generation: u64, records: Vec<Bytes> },
    Close(oneshot::Sender<()>),
    Shutdown,
}

/// Reports from the connection tasks, tagged with their generation.
enum Notice {
    Ready { generation: u64, stream: TcpStream },
    Waiting { generation: u64, error: TransportError },
    Failed { generation: u64, error: TransportError },
    ReceiveEnded { generation: u64, outcome: ReceiveOutcome },
    WriteFailed { generation: u64, error: io::Error },
}

/// Handle to the connection actor.
///
/// Cloning the handle is cheap; the actor stops once every handle is dropped
/// or [`shutdown`](Self::shutdown) is called.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    commands: mpsc::UnboundedSender<Command>,
    phase: watch::Receiver<ConnectionPhase>,
    counters: Arc<Counters>,
}

impl ConnectionManager {
    /// Spawn the actor on the current tokio runtime.
    ///
    /// Returns the handle, the decoded inbound messages in receipt order, and
    /// the connection events.
    pub fn spawn(
        options: ConnectionOptions,
    ) -> (
        Self,
        mpsc::Receiver<InboundMessage>,
        mpsc::UnboundedReceiver<ConnectionEvent>,
    ) {
        let (actor, manager, inbound, events) = Actor::new(options);
        tokio::spawn(actor.run());
        (manager, inbound, events)
    }

    /// Open a connection to `address` (`host:port`).
    ///
    /// No-op while a connection is already connecting or ready.
    pub fn connect(&self, address: impl Into<String>) {
        self.send(Command::Connect(address.into()));
    }

    /// Submit one encoded record.
    pub fn submit(&self, record: impl Into<Bytes>) {
        self.send(Command::Submit(record.into()));
    }

    /// Submit records that must reach connection `generation` back to back.
    ///
    /// The batch is dropped unless that connection is still ready when the
    /// actor picks it up.
    pub fn submit_batch(&self, generation: u64, records: Vec<Bytes>) {
        self.send(Command::SubmitBatch {
            generation,
            records,
        });
    }

    /// Cancel the transport and return to `Disconnected`.
    ///
    /// Never waits on the socket. Buffered outbound records, and records
    /// handed to the transport but not yet fully written, survive and are
    /// flushed by the next connection.
    pub async fn close(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.send(Command::Close(ack_tx));
        let _ = ack_rx.await;
    }

    /// Close the transport and stop the actor.
    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    /// Current phase.
    pub fn state(&self) -> ConnectionPhase {
        *self.phase.borrow()
    }

    /// Subscribe to phase changes.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionPhase> {
        self.phase.clone()
    }

    /// Check if the transport is ready.
    pub fn is_ready(&self) -> bool {
        self.state() == ConnectionPhase::Ready
    }

    /// Snapshot of the connection counters.
    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            records_sent: self.counters.records_sent.load(Ordering::Relaxed),
            decode_failures: self.counters.decode_failures.load(Ordering::Relaxed),
            pending: self.counters.pending.load(Ordering::Relaxed),
            outbound_dropped: self.counters.outbound_dropped.load(Ordering::Relaxed),
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("connection actor stopped, command ignored");
        }
    }
}

struct Actor {
    state: ConnectionState,
    outbound: OutboundBuffer,
    /// Queue of the ready connection's writer task.
    writer: Option<WriteQueue>,
    writer_task: Option<JoinHandle<()>>,
    connector: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
    commands: mpsc::UnboundedReceiver<Command>,
    notice_tx: mpsc::UnboundedSender<Notice>,
    notices: mpsc::UnboundedReceiver<Notice>,
    inbound: mpsc::Sender<InboundMessage>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    phase: watch::Sender<ConnectionPhase>,
    counters: Arc<Counters>,
    waiting_retry_interval: Duration,
}

impl Actor {
    fn new(
        options: ConnectionOptions,
    ) -> (
        Self,
        ConnectionManager,
        mpsc::Receiver<InboundMessage>,
        mpsc::UnboundedReceiver<ConnectionEvent>,
    ) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::channel(options.inbound_capacity.max(1));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (phase_tx, phase_rx) = watch::channel(ConnectionPhase::Disconnected);
        let counters = Arc::new(Counters::default());

        let actor = Actor {
            state: ConnectionState::new(),
            outbound: OutboundBuffer::with_limit(options.outbound_limit),
            writer: None,
            writer_task: None,
            connector: None,
            reader: None,
            commands: command_rx,
            notice_tx,
            notices: notice_rx,
            inbound: inbound_tx,
            events: event_tx,
            phase: phase_tx,
            counters: Arc::clone(&counters),
            waiting_retry_interval: options.waiting_retry_interval,
        };
        let manager = ConnectionManager {
            commands: command_tx,
            phase: phase_rx,
            counters,
        };
        (actor, manager, inbound_rx, event_rx)
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(notice) = self.notices.recv() => self.handle_notice(notice),
            }
            self.record_stats();
        }
        self.teardown();
        debug!("connection actor stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect(address) => self.connect(address),
            Command::Submit(record) => {
                if let Dispatch::Transmit(record) = self.outbound.submit(record, self.is_ready()) {
                    self.transmit(vec![record]);
                }
            }
            Command::SubmitBatch {
                generation,
                records,
            } => {
                if self.state.generation() == generation && self.is_ready() {
                    self.transmit(records);
                } else {
                    trace!(generation, count = records.len(), "batch for a stale connection dropped");
                }
            }
            Command::Close(ack) => {
                self.teardown();
                self.record_stats();
                let _ = ack.send(());
            }
            Command::Shutdown => self.teardown(),
        }
    }

    fn handle_notice(&mut self, notice: Notice) {
        match notice {
            Notice::Ready { generation, stream } => self.on_ready(generation, stream),
            Notice::Waiting { generation, error } => {
                if self.state.is_current(generation) {
                    info!(error = %error, "network unavailable, waiting");
                }
            }
            Notice::Failed { generation, error } => self.fail(generation, error.into()),
            Notice::ReceiveEnded { generation, outcome } => match outcome {
                ReceiveOutcome::EndOfStream => {
                    if self.state.mark_closed(generation) {
                        info!("connection closed by peer");
                        self.reset(Some(TransportError::EndOfStream.into()));
                    }
                }
                ReceiveOutcome::Failed(err) => {
                    self.fail(generation, TransportError::Read(err).into());
                }
                ReceiveOutcome::InboundClosed => {
                    if self.state.is_current(generation) {
                        debug!("inbound consumer gone, closing connection");
                        self.teardown();
                    }
                }
            },
            Notice::WriteFailed { generation, error } => {
                self.fail(generation, TransportError::Write(error).into());
            }
        }
    }

    fn connect(&mut self, address: String) {
        let Some(generation) = self.state.begin_connect() else {
            trace!(phase = ?self.state.phase(), "connect ignored");
            return;
        };
        self.publish();
        debug!(%address, generation, "connecting");

        let notices = self.notice_tx.clone();
        let retry = self.waiting_retry_interval;
        self.connector = Some(tokio::spawn(async move {
            loop {
                match TcpStream::connect(address.as_str()).await {
                    Ok(stream) => {
                        let _ = notices.send(Notice::Ready { generation, stream });
                        return;
                    }
                    Err(err) => {
                        let error = TransportError::Connect(err);
                        if !error.is_waiting() {
                            let _ = notices.send(Notice::Failed { generation, error });
                            return;
                        }
                        let _ = notices.send(Notice::Waiting { generation, error });
                        tokio::time::sleep(retry).await;
                    }
                }
            }
        }));
    }

    fn on_ready(&mut self, generation: u64, stream: TcpStream) {
        if !self.state.mark_ready(generation) {
            trace!(generation, "stale connection dropped");
            return;
        }
        self.connector = None;
        if let Err(err) = stream.set_nodelay(true) {
            debug!(error = %err, "set_nodelay failed");
        }
        if let Ok(peer) = stream.peer_addr() {
            info!(%peer, "connected");
        }

        let (read_half, write_half) = stream.into_split();
        let notices = self.notice_tx.clone();
        let inbound = self.inbound.clone();
        let failures = Arc::clone(&self.counters.decode_failures);
        self.reader = Some(tokio::spawn(async move {
            let outcome = receive_loop(RecordReader::new(read_half), inbound, failures).await;
            let _ = notices.send(Notice::ReceiveEnded { generation, outcome });
        }));

        let queue = WriteQueue::new();
        let notices = self.notice_tx.clone();
        let sent = Arc::clone(&self.counters.records_sent);
        let records = queue.clone();
        self.writer_task = Some(tokio::spawn(async move {
            let error = write_loop(write_half, records, sent).await;
            let _ = notices.send(Notice::WriteFailed { generation, error });
        }));
        self.writer = Some(queue);
        self.publish();

        self.flush();
        let _ = self.events.send(ConnectionEvent::Ready { generation });
    }

    fn is_ready(&self) -> bool {
        self.state.phase() == ConnectionPhase::Ready && self.writer.is_some()
    }

    fn flush(&mut self) {
        let pending = self.outbound.take_pending();
        if !pending.is_empty() {
            debug!(count = pending.len(), "flushing buffered records");
        }
        self.transmit(pending);
    }

    /// Hand records to the writer task, or keep them buffered without one.
    fn transmit(&mut self, records: Vec<Bytes>) {
        match &self.writer {
            Some(queue) => queue.extend(records),
            None => self.outbound.requeue_front(records),
        }
    }

    fn fail(&mut self, generation: u64, reason: DisconnectReason) {
        if self.state.mark_failed(generation) {
            warn!(?reason, "connection failed");
            self.reset(Some(reason));
        }
    }

    fn reset(&mut self, reason: Option<DisconnectReason>) {
        self.publish();
        self.teardown();
        if let Some(reason) = reason {
            let _ = self.events.send(ConnectionEvent::Disconnected(reason));
        }
    }

    /// Cancel the connection tasks, take back unwritten records, go
    /// `Disconnected`.
    fn teardown(&mut self) {
        for task in [self.connector.take(), self.reader.take(), self.writer_task.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
        if let Some(queue) = self.writer.take() {
            let unsent = queue.drain();
            if !unsent.is_empty() {
                debug!(count = unsent.len(), "requeueing unwritten records");
                self.outbound.requeue_front(unsent);
            }
        }
        if self.state.phase() != ConnectionPhase::Disconnected {
            self.state.reset();
            self.publish();
        }
    }

    fn record_stats(&self) {
        self.counters.pending.store(self.outbound.len(), Ordering::Relaxed);
        self.counters
            .outbound_dropped
            .store(self.outbound.dropped(), Ordering::Relaxed);
    }

    fn publish(&self) {
        self.phase.send_replace(self.state.phase());
    }
}
