//! UseCase: the meeting session event loop
//!
//! Connects the pure [`MeetingClient`] reducer to its collaborators: a
//! [`Connector`] for the socket, a [`Renderer`] for the view and a
//! [`ReconnectScheduler`] for delayed retries. All inputs (transport events,
//! user commands, retry timers) are handled one at a time on this loop.

use agora_shared::protocol::OutboundCommand;
use tokio::sync::{mpsc, watch};

use crate::domain::{
    CommandError, ConnectionHandle, Connector, Renderer, StatusLine, TransportEvent, ViewUpdate,
};

use super::{
    meeting_client::{ConnectAttempt, MeetingClient},
    scheduler::ReconnectScheduler,
};

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Plain chat text
    Chat(String),
    /// Vote for the option at this index
    Vote(usize),
    /// A command that already passed local validation and confirmation
    Send(OutboundCommand),
    /// Leave the meeting for good
    Disconnect,
    /// Render the attendee list again
    ShowAttendees,
    /// Stop the session
    Quit,
}

/// The socket currently in use and its event stream.
struct LiveConnection {
    handle: ConnectionHandle,
    events: mpsc::UnboundedReceiver<TransportEvent>,
}

pub struct MeetingSession<C: Connector, R: Renderer> {
    client: MeetingClient,
    connector: C,
    renderer: R,
    connection: Option<LiveConnection>,
    scheduler: ReconnectScheduler,
    retry_rx: mpsc::UnboundedReceiver<()>,
    /// Whether commands can currently go out
    link: watch::Sender<bool>,
}

impl<C: Connector, R: Renderer> MeetingSession<C, R> {
    pub fn new(client: MeetingClient, connector: C, renderer: R) -> Self {
        let (retry_tx, retry_rx) = mpsc::unbounded_channel();
        Self {
            client,
            connector,
            renderer,
            connection: None,
            scheduler: ReconnectScheduler::new(retry_tx),
            retry_rx,
            link: watch::Sender::new(false),
        }
    }

    /// Follows whether the session can send commands right now.
    pub fn link_state(&self) -> watch::Receiver<bool> {
        self.link.subscribe()
    }

    /// Run until the user quits or the command channel closes.
    ///
    /// Returns the final client state.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<UserCommand>) -> MeetingClient {
        if let Some(attempt) = self.client.begin_connect() {
            self.open(attempt);
        }

        loop {
            tokio::select! {
                event = next_event(&mut self.connection) => self.on_transport(event),
                Some(()) = self.retry_rx.recv() => {
                    if let Some(attempt) = self.client.retry_due() {
                        self.open(attempt);
                    }
                }
                command = commands.recv() => match command {
                    Some(UserCommand::Quit) | None => break,
                    Some(command) => self.on_command(command),
                },
            }
        }

        self.scheduler.cancel();
        if let Some(connection) = self.connection.take() {
            connection.handle.close();
        }
        tracing::info!("Meeting session ended");
        self.client
    }

    fn open(&mut self, attempt: ConnectAttempt) {
        self.render_all(&attempt.updates);
        let (events_tx, events) = mpsc::unbounded_channel();
        let handle = self.connector.open(&attempt.url, events_tx);
        self.connection = Some(LiveConnection { handle, events });
    }

    fn on_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => {
                tracing::info!("Connection opened");
                let updates = self.client.handle_open();
                self.render_all(&updates);
            }
            TransportEvent::Frame(text) => {
                let updates = self.client.handle_frame(&text);
                self.render_all(&updates);
            }
            TransportEvent::Closed { code } => {
                self.connection = None;
                let reaction = self.client.handle_close(code);
                self.render_all(&reaction.updates);
                if let Some(delay) = reaction.retry_after {
                    self.scheduler.schedule(delay);
                }
            }
        }
        self.publish_link();
    }

    fn on_command(&mut self, command: UserCommand) {
        match command {
            UserCommand::Chat(text) => match self.client.chat(&text) {
                Some(command) => self.send(command),
                None => tracing::debug!("Chat message not sent"),
            },
            UserCommand::Vote(index) => match self.client.vote(index) {
                Ok((command, update)) => {
                    self.renderer.render(&update);
                    self.send(command);
                }
                Err(e) => self.reject(e),
            },
            UserCommand::Send(command) => match self.client.ensure_sendable() {
                Ok(()) => self.send(command),
                Err(e) => self.reject(e),
            },
            UserCommand::Disconnect => {
                self.scheduler.cancel();
                if let Some(updates) = self.client.disconnect() {
                    self.render_all(&updates);
                }
                if let Some(connection) = &self.connection {
                    connection.handle.close();
                }
                self.publish_link();
            }
            UserCommand::ShowAttendees => {
                let rows = self.client.attendee_rows();
                self.renderer.render(&ViewUpdate::Attendees(rows));
            }
            UserCommand::Quit => {}
        }
    }

    fn send(&mut self, command: OutboundCommand) {
        let text = match command.encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Failed to serialize {:?}: {}", command, e);
                return;
            }
        };
        let sent = self
            .connection
            .as_ref()
            .is_some_and(|connection| connection.handle.send_text(text));
        if !sent {
            self.reject(CommandError::NotConnected);
        }
    }

    fn reject(&mut self, error: CommandError) {
        tracing::debug!("Command rejected: {}", error);
        self.renderer
            .render(&ViewUpdate::Status(StatusLine::warning(error.to_string())));
    }

    fn publish_link(&self) {
        let open = self.client.ensure_sendable().is_ok();
        self.link.send_if_modified(|current| {
            let changed = *current != open;
            *current = open;
            changed
        });
    }

    fn render_all(&mut self, updates: &[ViewUpdate]) {
        for update in updates {
            self.renderer.render(update);
        }
    }
}

/// Next event of the live connection; pending forever without one.
async fn next_event(connection: &mut Option<LiveConnection>) -> TransportEvent {
    match connection {
        Some(connection) => connection
            .events
            .recv()
            .await
            // Transport task went away without reporting a close
            .unwrap_or(TransportEvent::Closed {
                code: agora_shared::protocol::close_code::ABNORMAL,
            }),
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use agora_shared::protocol::close_code;

    use super::*;
    use crate::{
        domain::{
            ConnectionPolicy, ConnectionTarget, MessageId, OutboundFrame, StatusLevel,
        },
        usecase::meeting_client::ClientSettings,
    };

    /// Connection opened by the fake connector.
    struct FakeSocket {
        url: String,
        events: mpsc::UnboundedSender<TransportEvent>,
        outbound: mpsc::UnboundedReceiver<OutboundFrame>,
    }

    #[derive(Clone)]
    struct FakeConnector {
        sockets: mpsc::UnboundedSender<FakeSocket>,
    }

    impl Connector for FakeConnector {
        fn open(
            &self,
            url: &str,
            events: mpsc::UnboundedSender<TransportEvent>,
        ) -> ConnectionHandle {
            let (outbound_tx, outbound) = mpsc::unbounded_channel();
            let _ = self.sockets.send(FakeSocket {
                url: url.to_string(),
                events,
                outbound,
            });
            ConnectionHandle::new(outbound_tx)
        }
    }

    #[derive(Clone, Default)]
    struct RecordingRenderer {
        updates: Arc<Mutex<Vec<ViewUpdate>>>,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, update: &ViewUpdate) {
            self.updates.lock().unwrap().push(update.clone());
        }
    }

    impl RecordingRenderer {
        fn statuses(&self) -> Vec<StatusLine> {
            self.updates
                .lock()
                .unwrap()
                .iter()
                .filter_map(|u| match u {
                    ViewUpdate::Status(status) => Some(status.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    struct Harness {
        commands: mpsc::UnboundedSender<UserCommand>,
        link: watch::Receiver<bool>,
        sockets: mpsc::UnboundedReceiver<FakeSocket>,
        renderer: RecordingRenderer,
        task: tokio::task::JoinHandle<MeetingClient>,
    }

    fn start(policy: ConnectionPolicy) -> Harness {
        let (sockets_tx, sockets) = mpsc::unbounded_channel();
        let renderer = RecordingRenderer::default();
        let client = MeetingClient::new(
            ConnectionTarget::new("ws://meeting.test/ws", "12", "secret"),
            policy,
            ClientSettings::default(),
        );
        let session = MeetingSession::new(
            client,
            FakeConnector {
                sockets: sockets_tx,
            },
            renderer.clone(),
        );
        let link = session.link_state();
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(session.run(commands_rx));
        Harness {
            commands,
            link,
            sockets,
            renderer,
            task,
        }
    }

    fn policy(delay_ms: u64) -> ConnectionPolicy {
        ConnectionPolicy {
            reconnect_delay: Duration::from_millis(delay_ms),
            ..ConnectionPolicy::default()
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_abnormal_close_reconnects_once_after_delay() {
        // テスト項目: 異常切断 (1006) の後、遅延を置いて一度だけ再接続する
        // given (前提条件):
        let mut harness = start(policy(50));
        let first = harness.sockets.recv().await.unwrap();
        first.events.send(TransportEvent::Opened).unwrap();
        first
            .events
            .send(TransportEvent::Frame(
                r#"{"type":"message","data":{"id":4,"time":"10:00:00","date":"2024-06-01","fromname":"a","message":"hi"}}"#
                    .to_string(),
            ))
            .unwrap();

        // when (操作):
        first
            .events
            .send(TransportEvent::Closed {
                code: close_code::ABNORMAL,
            })
            .unwrap();
        settle().await;
        let early = harness.sockets.try_recv();
        let second = tokio::time::timeout(Duration::from_secs(1), harness.sockets.recv())
            .await
            .unwrap()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        // then (期待する結果):
        assert!(early.is_err());
        assert_eq!(second.url, "ws://meeting.test/ws/12/secret/4");
        assert!(harness.sockets.try_recv().is_err());
        assert!(
            harness
                .renderer
                .statuses()
                .contains(&StatusLine::error("Websocket disconnected."))
        );

        harness.commands.send(UserCommand::Quit).unwrap();
        let client = harness.task.await.unwrap();
        assert_eq!(client.connection().watermark(), MessageId::new(4));
    }

    #[tokio::test]
    async fn test_fatal_close_never_reconnects() {
        // テスト項目: 致命的なクローズコードでは再接続しない
        // given (前提条件):
        let mut harness = start(policy(10));
        let socket = harness.sockets.recv().await.unwrap();
        socket.events.send(TransportEvent::Opened).unwrap();

        // when (操作):
        socket
            .events
            .send(TransportEvent::Closed {
                code: close_code::INVALID_KEY,
            })
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // then (期待する結果):
        assert!(harness.sockets.try_recv().is_err());
        let last = harness.renderer.statuses().pop().unwrap();
        assert_eq!(last, StatusLine::error("Failed to connect to server"));

        harness.commands.send(UserCommand::Quit).unwrap();
        harness.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_chat_goes_out_as_message_command() {
        // テスト項目: チャット入力は message コマンドとして送信される
        // given (前提条件):
        let mut harness = start(policy(10));
        let mut socket = harness.sockets.recv().await.unwrap();
        socket.events.send(TransportEvent::Opened).unwrap();
        settle().await;

        // when (操作):
        harness
            .commands
            .send(UserCommand::Chat("  hello  ".to_string()))
            .unwrap();

        // then (期待する結果):
        let frame = socket.outbound.recv().await.unwrap();
        assert_eq!(
            frame,
            OutboundFrame::Text(r#"{"type":"message","message":"hello"}"#.to_string())
        );

        harness.commands.send(UserCommand::Quit).unwrap();
        harness.task.await.unwrap();
        assert_eq!(socket.outbound.recv().await, Some(OutboundFrame::Close));
    }

    #[tokio::test]
    async fn test_command_while_offline_is_rejected() {
        // テスト項目: 接続していない間の管理コマンドは送信されず警告になる
        // given (前提条件):
        let mut harness = start(policy(10));
        let _socket = harness.sockets.recv().await.unwrap();

        // when (操作):
        harness
            .commands
            .send(UserCommand::Send(OutboundCommand::Open))
            .unwrap();
        settle().await;

        // then (期待する結果):
        let last = harness.renderer.statuses().pop().unwrap();
        assert_eq!(last.level, StatusLevel::Warning);
        assert_eq!(last.text, CommandError::NotConnected.to_string());

        harness.commands.send(UserCommand::Quit).unwrap();
        harness.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_manual_disconnect_closes_and_stays_down() {
        // テスト項目: 手動切断で接続が閉じられ、その後再接続しない
        // given (前提条件):
        let mut harness = start(policy(10));
        let mut socket = harness.sockets.recv().await.unwrap();
        socket.events.send(TransportEvent::Opened).unwrap();
        settle().await;

        // when (操作):
        harness.commands.send(UserCommand::Disconnect).unwrap();
        let frame = socket.outbound.recv().await;
        socket
            .events
            .send(TransportEvent::Closed {
                code: close_code::NORMAL,
            })
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // then (期待する結果):
        assert_eq!(frame, Some(OutboundFrame::Close));
        assert!(harness.sockets.try_recv().is_err());
        assert!(
            harness
                .renderer
                .statuses()
                .contains(&StatusLine::error("Disconnected. Restart the client to reconnect."))
        );

        harness.commands.send(UserCommand::Quit).unwrap();
        harness.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_link_state_follows_connection() {
        // テスト項目: 接続の開閉に合わせて送信可否の状態が更新される
        // given (前提条件):
        let mut harness = start(policy(1000));
        let socket = harness.sockets.recv().await.unwrap();
        assert!(!*harness.link.borrow());

        // when (操作):
        socket.events.send(TransportEvent::Opened).unwrap();
        harness.link.changed().await.unwrap();
        let after_open = *harness.link.borrow_and_update();
        socket
            .events
            .send(TransportEvent::Closed {
                code: close_code::ABNORMAL,
            })
            .unwrap();
        harness.link.changed().await.unwrap();
        let after_close = *harness.link.borrow_and_update();

        // then (期待する結果):
        assert!(after_open);
        assert!(!after_close);

        harness.commands.send(UserCommand::Quit).unwrap();
        harness.task.await.unwrap();
    }
}
