use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, info_span, trace, warn, Instrument};
use uuid::Uuid;

use crate::{
    ChatCodec, ChatConfig, ChatError, ChatEvent, ChatLine, ChatSession, ConnectionState,
};

type LineReader = FramedRead<OwnedReadHalf, ChatCodec>;
type LineWriter = FramedWrite<OwnedWriteHalf, ChatCodec>;

enum Command {
    Connect,
    Disconnect,
    Reset,
    Send(String),
    UpdateUserName(String),
    Shutdown,
    // Reports from background tasks, tagged with the generation that spawned them
    ConnectSucceeded {
        generation: u64,
        endpoint: String,
        reader: LineReader,
        writer: LineWriter,
    },
    ConnectFailed {
        generation: u64,
        error: ChatError,
    },
    ReadEnded {
        generation: u64,
        error: Option<ChatError>,
    },
    ReconnectDue {
        generation: u64,
    },
}

enum WriteOp {
    Line(String),
    /// Written back to back with a single flush at the end.
    Batch(Vec<String>),
}

/// Client for the staff chat server.
///
/// Owns one logical connection: it tries each configured host in order, sends
/// the display name as the handshake line, then exchanges newline-delimited
/// messages. Lost connections are retried with capped exponential backoff and
/// lines sent while offline are queued until the next handshake.
///
/// None of the control methods block or fail. They hand a command to a
/// supervisor task and return; results show up in the [`ChatSession`]
/// snapshot (see [`ChatClient::subscribe`]) and as [`ChatEvent`]s.
///
/// # Logging
///
/// This library uses the `tracing` crate for logging. Every task spawned for a
/// client runs inside a `chat_client` span carrying its `client_id`. To see the
/// logs, initialize a subscriber in your application:
///
/// ```no_run
/// use tracing::Level;
/// use tracing_subscriber::FmtSubscriber;
///
/// let subscriber = FmtSubscriber::builder()
///     .with_max_level(Level::DEBUG)
///     .finish();
///
/// tracing::subscriber::set_global_default(subscriber)
///     .expect("Failed to set tracing subscriber");
/// ```
pub struct ChatClient {
    client_id: Uuid,
    config: ChatConfig,
    state_tx: Arc<watch::Sender<ChatSession>>,
    state_rx: watch::Receiver<ChatSession>,
    event_sender: broadcast::Sender<ChatEvent>,
    commands: mpsc::UnboundedSender<Command>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl ChatClient {
    /// Create a client and start its supervisor task. Does not connect.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: ChatConfig) -> Result<Self, ChatError> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ChatError::NoRuntime)?;

        let client_id = Uuid::new_v4();
        let user_name = config.clean_user_name(&config.user_name);
        let (state_tx, state_rx) = watch::channel(ChatSession::new(user_name));
        let state_tx = Arc::new(state_tx);
        let (event_tx, _) = broadcast::channel(config.event_buffer_capacity.max(1));
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let supervisor = Supervisor {
            config: config.clone(),
            state_tx: state_tx.clone(),
            event_tx: event_tx.clone(),
            cmd_tx: cmd_tx.clone(),
            generation: 0,
            attempts: 0,
            writer_tx: None,
            connect_task: None,
            read_task: None,
            writer_task: None,
            reconnect_task: None,
        };
        let span = info_span!("chat_client", %client_id);
        let handle = runtime.spawn(supervisor.run(cmd_rx).instrument(span));

        debug!(%client_id, hosts = ?config.hosts, port = config.port, "Chat client created.");
        Ok(Self {
            client_id,
            config,
            state_tx,
            state_rx,
            event_sender: event_tx,
            commands: cmd_tx,
            supervisor: Mutex::new(Some(handle)),
        })
    }

    pub fn client_id(&self) -> Uuid {
        self.client_id
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Current snapshot of the session.
    pub fn session(&self) -> ChatSession {
        self.state_rx.borrow().clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state_rx.borrow().state
    }

    pub fn user_name(&self) -> String {
        self.state_rx.borrow().user_name.clone()
    }

    /// Watch receiver that is notified on every session change.
    pub fn subscribe(&self) -> watch::Receiver<ChatSession> {
        self.state_tx.subscribe()
    }

    pub fn event_receiver(&self) -> broadcast::Receiver<ChatEvent> {
        self.event_sender.subscribe()
    }

    /// Start connecting. Ignored while already connecting or connected.
    pub fn connect(&self) {
        self.post(Command::Connect);
    }

    /// Close the connection and cancel any scheduled reconnect. Message
    /// history and queued lines are kept.
    pub fn disconnect(&self) {
        self.post(Command::Disconnect);
    }

    /// Disconnect and clear history, unread count, queued lines and error.
    pub fn reset(&self) {
        self.post(Command::Reset);
    }

    /// Send a chat line. Blank input is ignored. While offline the line is
    /// queued and a connect is started.
    pub fn send(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.post(Command::Send(text.to_string()));
    }

    /// Change the display name. If it differs and the client is connected,
    /// the connection is re-established so the server sees the new name.
    pub fn update_user_name(&self, user_name: &str) {
        self.post(Command::UpdateUserName(user_name.to_string()));
    }

    /// Mark whether the chat is on screen. Opening it clears the unread count.
    pub fn set_open(&self, is_open: bool) {
        self.state_tx.send_modify(|session| {
            session.open = is_open;
            if is_open {
                session.unread_count = 0;
            }
        });
    }

    /// Stop the supervisor, close the socket and wait for every background
    /// task to finish.
    pub async fn shutdown(&self) -> Result<(), ChatError> {
        let handle = self.supervisor.lock().await.take();
        let Some(handle) = handle else {
            debug!("Supervisor already stopped.");
            return Ok(());
        };
        let _ = self.commands.send(Command::Shutdown);
        handle.await?;
        info!(client_id = %self.client_id, "Chat client shut down.");
        Ok(())
    }

    fn post(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!(client_id = %self.client_id, "Supervisor stopped, command dropped.");
        }
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("client_id", &self.client_id)
            .field("hosts", &self.config.hosts)
            .field("port", &self.config.port)
            .field("state", &self.state_rx.borrow().state)
            .finish()
    }
}

// Ensure the supervisor is told to stop on drop
impl Drop for ChatClient {
    fn drop(&mut self) {
        // Signal only; drop must not block on the task
        let _ = self.commands.send(Command::Shutdown);
    }
}

/// Owns the socket halves (through its child tasks) and every timer. Runs
/// commands one at a time, so no state it holds needs locking.
struct Supervisor {
    config: ChatConfig,
    state_tx: Arc<watch::Sender<ChatSession>>,
    event_tx: broadcast::Sender<ChatEvent>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    // Bumped on every connect and teardown; stale task reports are dropped
    generation: u64,
    attempts: u32,
    writer_tx: Option<mpsc::UnboundedSender<WriteOp>>,
    connect_task: Option<JoinHandle<()>>,
    read_task: Option<JoinHandle<()>>,
    writer_task: Option<JoinHandle<()>>,
    reconnect_task: Option<JoinHandle<()>>,
}

impl Supervisor {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        debug!("Chat supervisor started.");
        while let Some(command) = commands.recv().await {
            match command {
                Command::Connect => self.connect(),
                Command::Disconnect => self.disconnect().await,
                Command::Reset => self.reset().await,
                Command::Send(text) => self.send(text),
                Command::UpdateUserName(name) => self.update_user_name(&name).await,
                Command::Shutdown => {
                    info!("Chat supervisor received shutdown.");
                    break;
                }
                Command::ConnectSucceeded {
                    generation,
                    endpoint,
                    reader,
                    writer,
                } => self.on_connected(generation, endpoint, reader, writer),
                Command::ConnectFailed { generation, error } => {
                    self.on_connect_failed(generation, error)
                }
                Command::ReadEnded { generation, error } => {
                    self.on_read_ended(generation, error).await
                }
                Command::ReconnectDue { generation } => {
                    if generation == self.generation {
                        self.reconnect_task = None;
                        debug!("Reconnect timer fired.");
                        self.connect();
                    } else {
                        trace!(generation, "Ignoring stale reconnect timer.");
                    }
                }
            }
        }
        self.disconnect().await;
        debug!("Chat supervisor finished.");
    }

    fn emit(&self, event: ChatEvent) {
        // No receivers is fine
        let _ = self.event_tx.send(event);
    }

    fn current_state(&self) -> ConnectionState {
        self.state_tx.borrow().state
    }

    fn connect(&mut self) {
        let state = self.current_state();
        if state.is_active() {
            debug!(?state, "Connect ignored, already {}.", state.label());
            return;
        }

        self.abort_reconnect();
        self.generation += 1;
        let generation = self.generation;

        self.state_tx.send_modify(|session| {
            session.state = ConnectionState::Connecting;
            session.last_error = None;
            session.endpoint = None;
        });
        let user_name = self.state_tx.borrow().user_name.clone();
        info!(generation, user = %user_name, "Connecting to chat server.");

        let config = self.config.clone();
        let state_tx = self.state_tx.clone();
        let event_tx = self.event_tx.clone();
        let cmd_tx = self.cmd_tx.clone();
        let handle = tokio::spawn(
            async move {
                let command =
                    match open_connection(&config, &user_name, &state_tx, &event_tx).await {
                        Ok((endpoint, reader, writer)) => Command::ConnectSucceeded {
                            generation,
                            endpoint,
                            reader,
                            writer,
                        },
                        Err(error) => Command::ConnectFailed { generation, error },
                    };
                let _ = cmd_tx.send(command);
            }
            .in_current_span(),
        );
        self.connect_task = Some(handle);
    }

    fn on_connected(
        &mut self,
        generation: u64,
        endpoint: String,
        reader: LineReader,
        writer: LineWriter,
    ) {
        if generation != self.generation {
            // Dropping the halves closes the abandoned socket
            debug!(generation, "Discarding connection from a superseded attempt.");
            return;
        }
        self.connect_task = None;
        self.attempts = 0;

        let mut pending = Vec::new();
        self.state_tx.send_modify(|session| {
            session.state = ConnectionState::Connected;
            session.last_error = None;
            session.endpoint = Some(endpoint.clone());
            pending = std::mem::take(&mut session.pending);
        });
        info!(%endpoint, "Connected to chat server.");
        self.emit(ChatEvent::Connected {
            endpoint: endpoint.clone(),
        });

        let (writer_tx, writer_rx) = mpsc::unbounded_channel();
        if !pending.is_empty() {
            debug!(count = pending.len(), "Flushing queued lines.");
            let _ = writer_tx.send(WriteOp::Batch(pending));
        }
        self.writer_task = Some(tokio::spawn(
            write_loop(
                writer,
                writer_rx,
                self.state_tx.clone(),
                self.event_tx.clone(),
            )
            .in_current_span(),
        ));
        self.writer_tx = Some(writer_tx);

        self.read_task = Some(tokio::spawn(
            read_loop(
                reader,
                generation,
                self.state_tx.clone(),
                self.event_tx.clone(),
                self.cmd_tx.clone(),
            )
            .in_current_span(),
        ));
    }

    fn on_connect_failed(&mut self, generation: u64, error: ChatError) {
        if generation != self.generation {
            trace!(generation, "Ignoring failure of a superseded attempt.");
            return;
        }
        self.connect_task = None;
        self.fail(error);
    }

    async fn on_read_ended(&mut self, generation: u64, error: Option<ChatError>) {
        if generation != self.generation {
            trace!(generation, "Ignoring end of a superseded read loop.");
            return;
        }
        self.close_connection().await;

        match error {
            Some(error) => self.fail(error),
            None => {
                info!("Chat server closed the connection.");
                self.state_tx.send_modify(ChatSession::mark_disconnected);
                self.emit(ChatEvent::Disconnected { reason: None });
            }
        }
    }

    /// Records an error on the session, drops to `Disconnected` and retries.
    fn fail(&mut self, error: ChatError) {
        if error.is_connect_failure() {
            warn!(error = %error, "Could not connect to chat server.");
        } else {
            warn!(error = %error, "Chat connection lost.");
        }
        let message = error.describe();
        self.state_tx.send_modify(|session| {
            session.mark_disconnected();
            session.last_error = Some(message.clone());
        });
        self.emit(ChatEvent::Error(message.clone()));
        self.emit(ChatEvent::Disconnected {
            reason: Some(message),
        });
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        if self.reconnect_task.is_some() {
            debug!("Reconnect already scheduled.");
            return;
        }
        let delay = self.config.backoff.delay(self.attempts);
        self.attempts = self.attempts.saturating_add(1);
        let attempt = self.attempts;
        debug!(attempt, ?delay, "Scheduling reconnect.");
        self.emit(ChatEvent::ReconnectScheduled { attempt, delay });

        let generation = self.generation;
        let cmd_tx = self.cmd_tx.clone();
        self.reconnect_task = Some(tokio::spawn(
            async move {
                sleep(delay).await;
                trace!(generation, "Reconnect timer fired.");
                let _ = cmd_tx.send(Command::ReconnectDue { generation });
            }
            .in_current_span(),
        ));
    }

    fn abort_reconnect(&mut self) {
        if let Some(handle) = self.reconnect_task.take() {
            handle.abort();
        }
    }

    /// Drops the writer and stops the socket tasks, waiting for each to exit.
    async fn close_connection(&mut self) {
        self.writer_tx = None;
        let tasks = [
            self.connect_task.take(),
            self.read_task.take(),
            self.writer_task.take(),
        ];
        for handle in tasks.into_iter().flatten() {
            handle.abort();
            // Cancellation is the expected outcome
            let _ = handle.await;
        }
    }

    async fn disconnect(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.reconnect_task.take() {
            handle.abort();
            let _ = handle.await;
        }
        self.close_connection().await;
        self.attempts = 0;

        let was_active = self.current_state().is_active();
        self.state_tx.send_modify(ChatSession::mark_disconnected);
        if was_active {
            info!("Disconnected from chat server.");
            self.emit(ChatEvent::Disconnected { reason: None });
        }
    }

    async fn reset(&mut self) {
        self.disconnect().await;
        self.state_tx.send_modify(|session| {
            session.messages.clear();
            session.pending.clear();
            session.unread_count = 0;
            session.last_error = None;
        });
        debug!("Chat session reset.");
    }

    fn send(&mut self, text: String) {
        if self.current_state() == ConnectionState::Connected {
            if let Some(writer_tx) = &self.writer_tx {
                if writer_tx.send(WriteOp::Line(text)).is_err() {
                    let message = ChatError::WriterUnavailable.describe();
                    warn!("Writer task is gone, line dropped.");
                    self.state_tx
                        .send_modify(|session| session.last_error = Some(message.clone()));
                    self.emit(ChatEvent::Error(message));
                }
                return;
            }
        }

        trace!("Not connected, queueing line.");
        self.state_tx
            .send_modify(|session| session.pending.push(text));
        self.connect();
    }

    async fn update_user_name(&mut self, user_name: &str) {
        let cleaned = self.config.clean_user_name(user_name);
        if self.state_tx.borrow().user_name == cleaned {
            return;
        }
        info!(user = %cleaned, "Display name changed.");
        self.state_tx
            .send_modify(|session| session.user_name = cleaned.clone());

        if self.current_state() == ConnectionState::Connected {
            self.disconnect().await;
            self.connect();
        }
    }
}

/// Tries each host in order and performs the handshake on the first one that
/// accepts.
async fn open_connection(
    config: &ChatConfig,
    user_name: &str,
    state_tx: &watch::Sender<ChatSession>,
    event_tx: &broadcast::Sender<ChatEvent>,
) -> Result<(String, LineReader, LineWriter), ChatError> {
    let mut last_error = None;

    for host in &config.hosts {
        let endpoint = format!("{}:{}", host, config.port);
        state_tx.send_modify(|session| session.endpoint = Some(endpoint.clone()));
        let _ = event_tx.send(ChatEvent::Connecting {
            endpoint: endpoint.clone(),
        });
        debug!(%endpoint, "Trying host candidate.");

        match timeout(
            config.connect_timeout,
            TcpStream::connect((host.as_str(), config.port)),
        )
        .await
        {
            Ok(Ok(stream)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    trace!(error = %e, "Could not set TCP_NODELAY.");
                }
                let (read_half, write_half) = stream.into_split();
                let reader =
                    FramedRead::new(read_half, ChatCodec::with_max_length(config.max_line_length));
                let mut writer = FramedWrite::new(
                    write_half,
                    ChatCodec::with_max_length(config.max_line_length),
                );
                // The handshake is the display name alone; nothing is read back
                writer.send(user_name).await?;
                debug!(%endpoint, "Handshake sent.");
                return Ok((endpoint, reader, writer));
            }
            Ok(Err(e)) => {
                warn!(%endpoint, error = %e, "Host candidate refused connection.");
                last_error = Some(ChatError::IoError(e));
            }
            Err(_) => {
                warn!(%endpoint, "Host candidate timed out.");
                last_error = Some(ChatError::ConnectTimeout {
                    endpoint,
                    timeout: config.connect_timeout,
                });
            }
        }
    }

    Err(last_error
        .map(|e| ChatError::Unreachable(Box::new(e)))
        .unwrap_or(ChatError::NoCandidates))
}

async fn read_loop(
    mut reader: LineReader,
    generation: u64,
    state_tx: Arc<watch::Sender<ChatSession>>,
    event_tx: broadcast::Sender<ChatEvent>,
    cmd_tx: mpsc::UnboundedSender<Command>,
) {
    let error = loop {
        match reader.next().await {
            Some(Ok(line)) => {
                trace!(%line, "Received line.");
                let parsed = ChatLine::parse(&line);
                state_tx.send_modify(|session| session.push_received(line));
                let _ = event_tx.send(ChatEvent::Message(parsed));
            }
            Some(Err(e)) => break Some(e),
            None => break None,
        }
    };
    let _ = cmd_tx.send(Command::ReadEnded { generation, error });
}

async fn write_loop(
    mut writer: LineWriter,
    mut ops: mpsc::UnboundedReceiver<WriteOp>,
    state_tx: Arc<watch::Sender<ChatSession>>,
    event_tx: broadcast::Sender<ChatEvent>,
) {
    while let Some(op) = ops.recv().await {
        let result = match op {
            WriteOp::Line(line) => writer.send(line).await,
            WriteOp::Batch(lines) => write_batch(&mut writer, lines).await,
        };
        // A failed write is reported; closing is left to the read loop
        if let Err(e) = result {
            warn!(error = %e, "Failed to write chat line.");
            let message = e.describe();
            state_tx.send_modify(|session| session.last_error = Some(message.clone()));
            let _ = event_tx.send(ChatEvent::Error(message));
        }
    }
    trace!("Writer finished.");
}

async fn write_batch(writer: &mut LineWriter, lines: Vec<String>) -> Result<(), ChatError> {
    for line in lines {
        writer.feed(line).await?;
    }
    SinkExt::<String>::flush(writer).await
}
