//! Session coordinator.
//!
//! A [`Session`] ties the Event Bus, the connection and the host's
//! collaborators together. While started it runs three tasks:
//!
//! - **sender**: drains the bus, one `log` record per event, once the
//!   handshake for the ready connection has gone out
//! - **dispatcher**: routes decoded inbound commands to the [`CommandHandler`]
//! - **lifecycle**: connects, sends the handshake on every ready transport,
//!   and reconnects after a disconnect

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::config::ClientConfig;
use crate::bus::{EventBus, EventStream, Logger};
use crate::core::{
    CommandHandler, ConfigError, EnvironmentProvider, HANDSHAKE_GREETING, PreferenceStore,
};
use crate::message::{EventKind, InboundMessage, OutboundMessage, codec};
use crate::transport::{ConnectionEvent, ConnectionManager, ConnectionPhase};

/// The engine's entry point.
///
/// ```ignore
/// let session = Session::new(config, environment, preferences, handler)?;
/// session.start().await;
/// let logger = session.logger();
/// logger.log(Level::Info, "app", "ready", None, &[]);
/// session.stop().await;
/// ```
pub struct Session {
    shared: Arc<Shared>,
    running: Mutex<Option<Running>>,
}

struct Shared {
    config: ClientConfig,
    environment: Arc<dyn EnvironmentProvider>,
    preferences: Arc<dyn PreferenceStore>,
    handler: Arc<dyn CommandHandler>,
    logger: Logger,
    /// Single consumer of the bus, reused by every sender task.
    events: Mutex<EventStream>,
    /// Spawned on the first start and kept for the session's lifetime.
    link: OnceLock<Link>,
    announced: AtomicBool,
    /// Generation of the connection whose handshake was submitted. Events
    /// stay in the bus while this is `None`.
    synced: watch::Sender<Option<u64>>,
}

struct Link {
    connection: ConnectionManager,
    inbound: Mutex<mpsc::Receiver<InboundMessage>>,
    transitions: Mutex<mpsc::UnboundedReceiver<ConnectionEvent>>,
}

struct Running {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Session {
    /// Create a stopped session.
    pub fn new(
        config: ClientConfig,
        environment: Arc<dyn EnvironmentProvider>,
        preferences: Arc<dyn PreferenceStore>,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let bus = EventBus::new(config.event_capacity);
        let events = bus.consume().ok_or(ConfigError::ZeroCapacity)?;
        let logger = Logger::new(bus, config.min_level);

        let shared = Shared {
            config,
            environment,
            preferences,
            handler,
            logger,
            events: Mutex::new(events),
            link: OnceLock::new(),
            announced: AtomicBool::new(false),
            synced: watch::channel(None).0,
        };
        Ok(Self {
            shared: Arc::new(shared),
            running: Mutex::new(None),
        })
    }

    /// Start connecting and processing. No-op while already started.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if running.is_some() {
            debug!("session already started");
            return;
        }

        let shared = &self.shared;
        let link = shared.link.get_or_init(|| {
            let (connection, inbound, transitions) =
                ConnectionManager::spawn(shared.config.connection_options());
            Link {
                connection,
                inbound: Mutex::new(inbound),
                transitions: Mutex::new(transitions),
            }
        });
        link.discard_stale().await;

        if !shared.announced.swap(true, Ordering::AcqRel) {
            let info = shared.environment.app_info();
            shared.logger.lifecycle(
                EventKind::AppStarted,
                format!(
                    "{} started ({}) ({})",
                    info.name,
                    info.version,
                    info.bundle_id.as_deref().unwrap_or("unknown")
                ),
            );
        }

        let cancel = CancellationToken::new();
        let tasks = vec![
            tokio::spawn(run_sender(Arc::clone(shared), cancel.clone())),
            tokio::spawn(run_dispatcher(Arc::clone(shared), cancel.clone())),
            tokio::spawn(run_lifecycle(Arc::clone(shared), cancel.clone())),
        ];
        info!(address = %shared.config.address(), "session started");
        *running = Some(Running { cancel, tasks });
    }

    /// Cancel the background tasks, wait for them, then close the connection.
    ///
    /// Once this returns no inbound command is dispatched and no record is
    /// sent until the next [`start`](Self::start).
    pub async fn stop(&self) {
        let mut running = self.running.lock().await;
        let Some(Running { cancel, tasks }) = running.take() else {
            return;
        };

        cancel.cancel();
        for task in tasks {
            if let Err(err) = task.await {
                if err.is_panic() {
                    warn!(error = %err, "session task panicked");
                }
            }
        }
        self.shared.synced.send_replace(None);
        if let Some(link) = self.shared.link.get() {
            link.connection.close().await;
        }
        info!("session stopped");
    }

    /// Check if the session is started.
    pub async fn is_started(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Cloneable logging handle feeding this session's Event Bus.
    pub fn logger(&self) -> Logger {
        self.shared.logger.clone()
    }

    /// The session's Event Bus.
    pub fn bus(&self) -> &EventBus {
        self.shared.logger.bus()
    }

    /// Session configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Current connection phase.
    pub fn connection_state(&self) -> ConnectionPhase {
        self.shared
            .link
            .get()
            .map(|link| link.connection.state())
            .unwrap_or_default()
    }

    /// Send a fresh window list.
    pub fn windows_changed(&self) {
        self.shared
            .send(OutboundMessage::WindowList(self.shared.environment.windows()));
    }

    /// Send a fresh environment snapshot.
    pub fn environment_changed(&self) {
        self.shared
            .send(OutboundMessage::EnvironmentSnapshot(self.shared.environment.environment()));
    }

    /// Send a fresh preference snapshot.
    pub fn send_preferences(&self) {
        self.shared.send_preferences();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            running.cancel.cancel();
        }
        if let Some(link) = self.shared.link.get() {
            link.connection.shutdown();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.shared.config.address())
            .field("connection", &self.connection_state())
            .finish_non_exhaustive()
    }
}

impl Link {
    /// Drop inbound commands and transitions left over from a previous run.
    async fn discard_stale(&self) {
        let mut inbound = self.inbound.lock().await;
        while inbound.try_recv().is_ok() {}
        let mut transitions = self.transitions.lock().await;
        while transitions.try_recv().is_ok() {}
    }
}

impl Shared {
    fn encode(message: &OutboundMessage) -> Option<Bytes> {
        match codec::encode(message) {
            Ok(record) => Some(Bytes::from(record)),
            Err(err) => {
                warn!(kind = message.kind(), error = %err, "dropping unencodable message");
                None
            }
        }
    }

    fn send(&self, message: OutboundMessage) {
        let Some(link) = self.link.get() else {
            trace!(kind = message.kind(), "session never started, message dropped");
            return;
        };
        if let Some(record) = Self::encode(&message) {
            link.connection.submit(record);
        }
    }

    fn send_preferences(&self) {
        self.send(OutboundMessage::PreferenceSnapshot(self.preferences.snapshot()));
    }

    /// Submit the greeting and the four snapshots as one contiguous batch
    /// for connection `generation`.
    fn handshake(&self, connection: &ConnectionManager, generation: u64) {
        let messages = [
            OutboundMessage::Ack(HANDSHAKE_GREETING.to_owned()),
            OutboundMessage::AppInfo(self.environment.app_info()),
            OutboundMessage::EnvironmentSnapshot(self.environment.environment()),
            OutboundMessage::WindowList(self.environment.windows()),
            OutboundMessage::PreferenceSnapshot(self.preferences.snapshot()),
        ];
        let records = messages.iter().filter_map(Self::encode).collect();
        connection.submit_batch(generation, records);
    }

    fn dispatch(&self, message: InboundMessage) {
        let kind = message.kind();
        trace!(kind, "dispatching");

        let result = match message {
            InboundMessage::Ack(text) => {
                debug!(%text, "companion ack");
                Ok(())
            }
            InboundMessage::Error(text) => {
                debug!(%text, "companion error");
                Ok(())
            }
            InboundMessage::RequestPreferences {} => {
                self.send_preferences();
                self.handler.preferences_requested()
            }
            InboundMessage::LanguageChangeRequest(locale) => self.handler.language_change(&locale),
            InboundMessage::AppearanceChangeRequest(appearance) => {
                self.handler.appearance_change(appearance)
            }
            InboundMessage::WindowResizeRequest(request) => self.handler.window_resize(&request),
            InboundMessage::WindowActivateRequest(window) => self.handler.window_activate(window),
            InboundMessage::PreferencePatch(patches) => {
                self.preferences.apply(&patches);
                self.handler.preferences_patched(&patches)
            }
        };

        if let Err(err) = result {
            warn!(kind, error = %err, "command handler failed");
        }
    }
}

async fn run_sender(shared: Arc<Shared>, cancel: CancellationToken) {
    let Some(link) = shared.link.get() else {
        return;
    };
    let mut events = shared.events.lock().await;
    let mut synced = shared.synced.subscribe();

    loop {
        // Held events stay under the bus's drop-oldest cap
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            ready = async { synced.wait_for(Option::is_some).await.is_ok() } => {
                if !ready {
                    break;
                }
            }
        }
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = synced.changed() => continue,
            event = events.recv() => event,
        };
        let Some(event) = event else {
            debug!("event bus closed");
            break;
        };
        if let Some(record) = Shared::encode(&OutboundMessage::LogEvent(event)) {
            link.connection.submit(record);
        }
    }
}

async fn run_dispatcher(shared: Arc<Shared>, cancel: CancellationToken) {
    let Some(link) = shared.link.get() else {
        return;
    };
    let mut inbound = link.inbound.lock().await;

    loop {
        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            message = inbound.recv() => message,
        };
        match message {
            Some(message) => shared.dispatch(message),
            None => break,
        }
    }
}

async fn run_lifecycle(shared: Arc<Shared>, cancel: CancellationToken) {
    let Some(link) = shared.link.get() else {
        return;
    };
    let mut transitions = link.transitions.lock().await;
    let address = shared.config.address();
    link.connection.connect(address.as_str());

    loop {
        let transition = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            transition = transitions.recv() => transition,
        };
        match transition {
            Some(ConnectionEvent::Ready { generation }) => {
                debug!(generation, "transport ready, sending handshake");
                shared.handshake(&link.connection, generation);
                shared.synced.send_replace(Some(generation));
            }
            Some(ConnectionEvent::Disconnected(reason)) => {
                shared.synced.send_replace(None);
                let Some(interval) = shared.config.reconnect_interval else {
                    info!(?reason, "disconnected, reconnect disabled");
                    continue;
                };
                debug!(?reason, ?interval, "disconnected, reconnecting");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => link.connection.connect(address.as_str()),
                }
            }
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex as SyncMutex;
    use serde_json::Value;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
    use tokio::net::tcp::OwnedReadHalf;
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    use super::*;
    use crate::core::{HandlerError, MemoryPreferences, StaticEnvironment};
    use crate::message::{
        AppEnvironment, AppInfo, AppWindow, Appearance, Level, PreferencePatch, PreferenceValue,
        Rect,
    };

    const WAIT: Duration = Duration::from_secs(5);
    const HANDSHAKE: [&str; 5] = ["ack", "info", "environment", "windows", "defaults"];

    #[derive(Default)]
    struct Recorder {
        calls: SyncMutex<Vec<String>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        fn push(&self, call: String) -> Result<(), HandlerError> {
            self.calls.lock().push(call);
            Ok(())
        }
    }

    impl CommandHandler for Recorder {
        fn preferences_requested(&self) -> Result<(), HandlerError> {
            self.push("preferences".into())
        }

        fn language_change(&self, locale: &str) -> Result<(), HandlerError> {
            self.push(format!("language:{locale}"))
        }

        fn appearance_change(&self, appearance: Appearance) -> Result<(), HandlerError> {
            self.push(format!("appearance:{appearance:?}"))
        }

        fn window_activate(&self, window_number: i64) -> Result<(), HandlerError> {
            self.push(format!("activate:{window_number}"))
        }

        fn preferences_patched(&self, patches: &[PreferencePatch]) -> Result<(), HandlerError> {
            self.push(format!("patched:{}", patches.len()))
        }
    }

    fn environment() -> Arc<StaticEnvironment> {
        Arc::new(StaticEnvironment {
            info: AppInfo::new("Demo", Some("dev.tailbeat.demo".into()), "1.0", "7", vec!["en".into()]),
            environment: AppEnvironment::new(Some("en".into()), Some(Appearance::Light)),
            windows: vec![AppWindow::new(1, "Main", Rect::new(0.0, 0.0, 800.0, 600.0))],
        })
    }

    async fn companion() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    fn config(port: u16) -> ClientConfig {
        ClientConfig::builder()
            .port(port)
            .reconnect_interval(Some(Duration::from_millis(50)))
            .build()
    }

    /// Next record's top-level key and payload.
    async fn next_record(lines: &mut Lines<BufReader<OwnedReadHalf>>) -> (String, Value) {
        let line = timeout(WAIT, lines.next_line()).await.unwrap().unwrap().unwrap();
        let value: Value = serde_json::from_str(&line).unwrap();
        let (key, payload) = value.as_object().unwrap().iter().next().unwrap();
        (key.clone(), payload.clone())
    }

    /// Keys of the next `count` non-log records.
    async fn next_control(lines: &mut Lines<BufReader<OwnedReadHalf>>, count: usize) -> Vec<String> {
        let mut keys = Vec::new();
        while keys.len() < count {
            let (key, _) = next_record(lines).await;
            if key != "log" {
                keys.push(key);
            }
        }
        keys
    }

    async fn wait_for_calls(recorder: &Recorder, count: usize) -> Vec<String> {
        timeout(WAIT, async {
            loop {
                let calls = recorder.calls();
                if calls.len() >= count {
                    return calls;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_handshake_order_on_connect_and_reconnect() {
        let (listener, port) = companion().await;
        let session = Session::new(
            config(port),
            environment(),
            Arc::new(MemoryPreferences::default()),
            Arc::new(()),
        )
        .unwrap();
        session.start().await;

        let (socket, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        let (read, _write) = socket.into_split();
        let mut lines = BufReader::new(read).lines();
        assert_eq!(next_control(&mut lines, 5).await, HANDSHAKE);

        // Companion restarts
        drop(lines);
        drop(_write);

        let (socket, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        let (read, _write) = socket.into_split();
        let mut lines = BufReader::new(read).lines();
        assert_eq!(next_control(&mut lines, 5).await, HANDSHAKE);

        session.stop().await;
    }

    #[tokio::test]
    async fn test_app_started_and_logs_reach_companion() {
        let (listener, port) = companion().await;
        let session = Session::new(
            config(port),
            environment(),
            Arc::new(MemoryPreferences::default()),
            Arc::new(()),
        )
        .unwrap();
        let logger = session.logger();
        logger.log(Level::Info, "test", "before start", None, &[]);
        session.start().await;

        let (socket, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        let (read, _write) = socket.into_split();
        let mut lines = BufReader::new(read).lines();

        logger.log(Level::Warning, "test", "after start", None, &[]);

        let mut messages = Vec::new();
        while messages.len() < 3 {
            let (key, payload) = next_record(&mut lines).await;
            if key == "log" {
                messages.push(payload["message"].as_str().unwrap().to_owned());
            }
        }
        assert_eq!(
            messages,
            ["before start", "Demo started (1.0) (dev.tailbeat.demo)", "after start"]
        );

        session.stop().await;
    }

    #[tokio::test]
    async fn test_inbound_dispatch_order() {
        let (listener, port) = companion().await;
        let preferences = Arc::new(MemoryPreferences::default());
        let recorder = Arc::new(Recorder::default());
        let session = Session::new(
            config(port),
            environment(),
            Arc::clone(&preferences) as Arc<dyn PreferenceStore>,
            Arc::clone(&recorder) as Arc<dyn CommandHandler>,
        )
        .unwrap();
        session.start().await;

        let (socket, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        let (read, mut write) = socket.into_split();
        let mut lines = BufReader::new(read).lines();
        assert_eq!(next_control(&mut lines, 5).await, HANDSHAKE);

        write
            .write_all(
                concat!(
                    "{\"languageChangeRequest\":\"de\"}\n",
                    "{\"ack\":\"ok\"}\n",
                    "{\"appearanceChangeRequest\":\"dark\"}\n",
                    "{\"windowAsKeyRequest\":3}\n",
                    "{\"userDefaultsPatch\":[{\"key\":\"theme\",\"value\":{\"string\":\"dark\"}}]}\n",
                    "{\"requestDefaults\":{}}\n",
                )
                .as_bytes(),
            )
            .await
            .unwrap();

        let calls = wait_for_calls(&recorder, 5).await;
        assert_eq!(
            calls,
            ["language:de", "appearance:Dark", "activate:3", "patched:1", "preferences"]
        );
        assert_eq!(preferences.get("theme"), Some(PreferenceValue::from("dark")));

        // The snapshot answering requestDefaults carries the patched key
        let (key, payload) = loop {
            let record = next_record(&mut lines).await;
            if record.0 != "log" {
                break record;
            }
        };
        assert_eq!(key, "defaults");
        assert_eq!(payload[0]["key"], "theme");

        session.stop().await;
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (listener, port) = companion().await;
        let session = Session::new(
            config(port),
            environment(),
            Arc::new(MemoryPreferences::default()),
            Arc::new(()),
        )
        .unwrap();

        session.start().await;
        session.start().await;
        assert!(session.is_started().await);

        let _socket = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        assert!(timeout(Duration::from_millis(200), listener.accept()).await.is_err());

        session.stop().await;
        assert!(!session.is_started().await);
        assert_eq!(session.connection_state(), ConnectionPhase::Disconnected);
    }

    #[tokio::test]
    async fn test_stop_quiesces() {
        let (listener, port) = companion().await;
        let recorder = Arc::new(Recorder::default());
        let session = Session::new(
            config(port),
            environment(),
            Arc::new(MemoryPreferences::default()),
            Arc::clone(&recorder) as Arc<dyn CommandHandler>,
        )
        .unwrap();
        session.start().await;

        let (socket, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        let (read, mut write) = socket.into_split();
        let mut lines = BufReader::new(read).lines();
        assert_eq!(next_control(&mut lines, 5).await, HANDSHAKE);

        session.stop().await;

        // Nothing sent after stop: the companion reads to end of stream
        let logger = session.logger();
        logger.log(Level::Info, "test", "after stop", None, &[]);
        loop {
            match timeout(WAIT, lines.next_line()).await.unwrap() {
                Ok(Some(line)) => assert!(!line.contains("after stop")),
                Ok(None) | Err(_) => break,
            }
        }
        assert_eq!(session.bus().len(), 1);

        // Nothing dispatched after stop
        let _ = write.write_all(b"{\"windowAsKeyRequest\":9}\n").await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let (listener, port) = companion().await;
        let session = Session::new(
            config(port),
            environment(),
            Arc::new(MemoryPreferences::default()),
            Arc::new(()),
        )
        .unwrap();

        session.start().await;
        let _first = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        session.stop().await;

        session.start().await;
        let (socket, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        let (read, _write) = socket.into_split();
        let mut lines = BufReader::new(read).lines();
        assert_eq!(next_control(&mut lines, 5).await, HANDSHAKE);

        session.stop().await;
    }

    #[tokio::test]
    async fn test_events_held_while_disconnected_keep_newest() {
        let (listener, port) = companion().await;
        drop(listener);

        let config = ClientConfig::builder()
            .port(port)
            .event_capacity(3)
            .reconnect_interval(Some(Duration::from_millis(50)))
            .build();
        let session = Session::new(
            config,
            environment(),
            Arc::new(MemoryPreferences::default()),
            Arc::new(()),
        )
        .unwrap();
        session.start().await;

        // AppStarted is queued first and evicted along with A and B
        let logger = session.logger();
        for message in ["A", "B", "C", "D", "E"] {
            logger.log(Level::Info, "test", message, None, &[]);
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(session.bus().len(), 3);

        // Companion appears on the same port
        let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        let (socket, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        let (read, _write) = socket.into_split();
        let mut lines = BufReader::new(read).lines();

        let mut keys = Vec::new();
        for _ in 0..HANDSHAKE.len() {
            keys.push(next_record(&mut lines).await.0);
        }
        assert_eq!(keys, HANDSHAKE);

        let mut messages = Vec::new();
        for _ in 0..3 {
            let (key, payload) = next_record(&mut lines).await;
            assert_eq!(key, "log");
            messages.push(payload["message"].as_str().unwrap().to_owned());
        }
        assert_eq!(messages, ["C", "D", "E"]);
        assert_eq!(session.bus().dropped(), 3);

        session.stop().await;
    }

    #[tokio::test]
    async fn test_stop_with_stalled_companion() {
        let (listener, port) = companion().await;
        let session = Session::new(
            config(port),
            environment(),
            Arc::new(MemoryPreferences::default()),
            Arc::new(()),
        )
        .unwrap();
        session.start().await;

        // Accepted but never read
        let (_stalled, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        timeout(WAIT, async {
            while session.connection_state() != ConnectionPhase::Ready {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        let logger = session.logger();
        let filler = "x".repeat(16 * 1024);
        for _ in 0..2000 {
            logger.log(Level::Info, "test", filler.as_str(), None, &[]);
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        timeout(Duration::from_secs(3), session.stop())
            .await
            .expect("stop waited on the companion");
        assert!(!session.is_started().await);
        assert_eq!(session.connection_state(), ConnectionPhase::Disconnected);
    }

    #[test]
    fn test_new_rejects_zero_capacity() {
        let config = ClientConfig::builder().event_capacity(0).build();
        let result = Session::new(
            config,
            environment(),
            Arc::new(MemoryPreferences::default()),
            Arc::new(()),
        );
        assert_eq!(result.unwrap_err(), ConfigError::ZeroCapacity);
    }
}
