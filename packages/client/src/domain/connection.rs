//! Connection lifecycle state machine.
//!
//! ```text
//! Idle -> Connecting -> WaitingForGreeting -> Connected -> Disconnected -> Connecting
//!                                                                       \-> Terminated
//! ```
//!
//! The machine only decides; opening sockets and running timers is left to
//! the session that drives it.

use std::time::Duration;

use agora_shared::protocol::close_code;

use super::{value_object::MessageId, view::StatusLine};

/// Default delay before a reconnect attempt
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Idle,
    Connecting,
    WaitingForGreeting,
    Connected,
    Disconnected,
    /// Manually disconnected, nothing happens until restart
    Terminated,
}

/// How a close code is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseKind {
    /// Server rejected the client; never retried
    Fatal,
    /// Ordinary disconnect; retried after the reconnect delay
    Transient,
}

/// Tunables of the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionPolicy {
    pub reconnect_delay: Duration,
    /// Lowest close code treated as a fatal application error
    pub fatal_close_floor: u16,
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            fatal_close_floor: close_code::APPLICATION_MIN,
        }
    }
}

impl ConnectionPolicy {
    pub fn classify(&self, code: u16) -> CloseKind {
        if code >= self.fatal_close_floor && code != close_code::ABNORMAL {
            CloseKind::Fatal
        } else {
            CloseKind::Transient
        }
    }
}

/// Where to connect: `<base>/<meeting>/<key>/<watermark>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    base_url: String,
    meeting_id: String,
    key: String,
}

impl ConnectionTarget {
    pub fn new(
        base_url: impl Into<String>,
        meeting_id: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            meeting_id: meeting_id.into(),
            key: key.into(),
        }
    }

    /// URL resuming the feed after `watermark`.
    pub fn url(&self, watermark: MessageId) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.meeting_id,
            self.key,
            watermark
        )
    }
}

/// What the session should do after the underlying connection closed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CloseOutcome {
    pub status: Option<StatusLine>,
    pub retry_after: Option<Duration>,
}

/// Lifecycle state of the single meeting connection.
#[derive(Debug)]
pub struct ConnectionMachine {
    policy: ConnectionPolicy,
    phase: ConnectionPhase,
    watermark: MessageId,
    suppress_reconnect: bool,
    user_initiated_close: bool,
}

impl ConnectionMachine {
    pub fn new(policy: ConnectionPolicy) -> Self {
        Self {
            policy,
            phase: ConnectionPhase::Idle,
            watermark: MessageId::default(),
            suppress_reconnect: false,
            user_initiated_close: false,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn policy(&self) -> &ConnectionPolicy {
        &self.policy
    }

    /// Highest transcript entry id applied so far.
    pub fn watermark(&self) -> MessageId {
        self.watermark
    }

    pub fn suppress_reconnect(&self) -> bool {
        self.suppress_reconnect
    }

    pub fn user_initiated_close(&self) -> bool {
        self.user_initiated_close
    }

    /// Whether the socket is open and can carry outbound commands.
    pub fn is_open(&self) -> bool {
        matches!(
            self.phase,
            ConnectionPhase::WaitingForGreeting | ConnectionPhase::Connected
        )
    }

    /// Whether an entry with this id has already been applied.
    pub fn has_seen(&self, id: MessageId) -> bool {
        id <= self.watermark
    }

    /// Move the watermark forward. Never moves it back.
    pub fn advance_watermark(&mut self, id: MessageId) {
        if id > self.watermark {
            self.watermark = id;
        }
    }

    /// Start a connection attempt.
    ///
    /// Returns `None` when reconnecting is suppressed or an attempt is already
    /// under way.
    pub fn begin_connect(&mut self) -> Option<StatusLine> {
        if self.suppress_reconnect {
            return None;
        }
        match self.phase {
            ConnectionPhase::Idle | ConnectionPhase::Disconnected => {
                self.phase = ConnectionPhase::Connecting;
                Some(StatusLine::warning("Connecting..."))
            }
            _ => None,
        }
    }

    /// The underlying socket opened.
    pub fn on_open(&mut self) -> Option<StatusLine> {
        if self.phase != ConnectionPhase::Connecting {
            return None;
        }
        self.phase = ConnectionPhase::WaitingForGreeting;
        Some(StatusLine::warning("Waiting for response..."))
    }

    /// A substantive event arrived.
    pub fn mark_connected(&mut self) -> Option<StatusLine> {
        match self.phase {
            ConnectionPhase::WaitingForGreeting | ConnectionPhase::Connected => {
                self.phase = ConnectionPhase::Connected;
                Some(StatusLine::normal("Connected"))
            }
            _ => None,
        }
    }

    /// The server announced it is disconnecting this client.
    pub fn on_server_disconnect(&mut self) {
        self.suppress_reconnect = true;
    }

    /// The underlying socket closed with `code`.
    pub fn on_close(&mut self, code: u16) -> CloseOutcome {
        match self.phase {
            ConnectionPhase::Connecting
            | ConnectionPhase::WaitingForGreeting
            | ConnectionPhase::Connected => {}
            ConnectionPhase::Idle | ConnectionPhase::Disconnected | ConnectionPhase::Terminated => {
                return CloseOutcome::default();
            }
        }
        self.phase = ConnectionPhase::Disconnected;

        if self.policy.classify(code) == CloseKind::Fatal && !self.user_initiated_close {
            tracing::error!(
                "Permanent error from websocket ({}), disabling autoretry",
                code
            );
            self.suppress_reconnect = true;
            return CloseOutcome {
                status: Some(StatusLine::error("Failed to connect to server")),
                retry_after: None,
            };
        }

        if self.suppress_reconnect {
            tracing::info!("Connection closed ({}), not reconnecting", code);
            return CloseOutcome::default();
        }

        tracing::warn!(
            "Connection closed ({}), reconnecting in {:?}",
            code,
            self.policy.reconnect_delay
        );
        CloseOutcome {
            status: Some(StatusLine::error("Websocket disconnected.")),
            retry_after: Some(self.policy.reconnect_delay),
        }
    }

    /// The scheduled retry fired. Returns whether a new attempt may start.
    pub fn retry_due(&self) -> bool {
        self.phase == ConnectionPhase::Disconnected && !self.suppress_reconnect
    }

    /// User asked to leave. Returns the terminal status, or `None` if there
    /// was nothing to disconnect.
    pub fn disconnect(&mut self) -> Option<StatusLine> {
        match self.phase {
            ConnectionPhase::Idle | ConnectionPhase::Terminated => None,
            _ => {
                self.suppress_reconnect = true;
                self.user_initiated_close = true;
                self.phase = ConnectionPhase::Terminated;
                Some(StatusLine::error(
                    "Disconnected. Restart the client to reconnect.",
                ))
            }
        }
    }
}
