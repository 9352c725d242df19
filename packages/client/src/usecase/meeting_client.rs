//! UseCase: reconciling server events into client state
//!
//! `MeetingClient` owns every piece of client state (connection lifecycle,
//! transcript, presence, poll panel, meeting status). Each handler applies one
//! input and returns the view updates the renderer has to draw, so the whole
//! reconciliation can be exercised without a socket or a terminal.

use std::time::Duration;

use agora_shared::protocol::{DecodeError, InboundEvent, OutboundCommand};

use crate::domain::{
    AdminMarks, Attendee, AttendeeId, AttendeeRow, CommandError, ConnectionMachine,
    ConnectionPolicy, ConnectionTarget, MeetingStatus, Poll, PollPanel, Roster, ScrollHint,
    StatusLine, Transcript, TranscriptEntry, TranscriptRow, ViewUpdate,
};

/// Who the local user is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    /// Show administrative controls and marks
    pub is_admin: bool,
    /// Own attendee id; administrators cannot kick themselves
    pub self_id: AttendeeId,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            is_admin: false,
            self_id: AttendeeId::new(-1),
        }
    }
}

/// Result of a connection attempt being started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectAttempt {
    pub url: String,
    pub updates: Vec<ViewUpdate>,
}

/// Reaction to the underlying connection closing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CloseReaction {
    pub updates: Vec<ViewUpdate>,
    pub retry_after: Option<Duration>,
}

/// The meeting client state.
#[derive(Debug)]
pub struct MeetingClient {
    target: ConnectionTarget,
    settings: ClientSettings,
    connection: ConnectionMachine,
    transcript: Transcript,
    roster: Roster,
    poll: PollPanel,
    status: MeetingStatus,
}

impl MeetingClient {
    pub fn new(target: ConnectionTarget, policy: ConnectionPolicy, settings: ClientSettings) -> Self {
        Self {
            target,
            settings,
            connection: ConnectionMachine::new(policy),
            transcript: Transcript::new(),
            roster: Roster::new(),
            poll: PollPanel::new(settings.is_admin),
            status: MeetingStatus::default(),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn connection(&self) -> &ConnectionMachine {
        &self.connection
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn poll(&self) -> &PollPanel {
        &self.poll
    }

    pub fn meeting_status(&self) -> MeetingStatus {
        self.status
    }

    // ========================================
    // Connection lifecycle
    // ========================================

    /// Start connecting. `None` if an attempt is not allowed right now.
    pub fn begin_connect(&mut self) -> Option<ConnectAttempt> {
        let status = self.connection.begin_connect()?;
        let url = self.target.url(self.connection.watermark());
        Some(ConnectAttempt {
            url,
            updates: vec![ViewUpdate::Status(status)],
        })
    }

    /// The reconnect delay elapsed.
    pub fn retry_due(&mut self) -> Option<ConnectAttempt> {
        if !self.connection.retry_due() {
            tracing::debug!("Reconnect suppressed");
            return None;
        }
        self.begin_connect()
    }

    pub fn handle_open(&mut self) -> Vec<ViewUpdate> {
        match self.connection.on_open() {
            Some(status) => vec![
                ViewUpdate::Status(status),
                ViewUpdate::DisconnectAvailable(true),
            ],
            None => Vec::new(),
        }
    }

    pub fn handle_close(&mut self, code: u16) -> CloseReaction {
        let outcome = self.connection.on_close(code);
        let mut updates = vec![ViewUpdate::DisconnectAvailable(false)];
        if let Some(status) = outcome.status {
            updates.push(ViewUpdate::Status(status));
        }
        CloseReaction {
            updates,
            retry_after: outcome.retry_after,
        }
    }

    /// User asked to leave the meeting. `None` if there was nothing to leave.
    pub fn disconnect(&mut self) -> Option<Vec<ViewUpdate>> {
        let status = self.connection.disconnect()?;
        Some(vec![
            ViewUpdate::DisconnectAvailable(false),
            ViewUpdate::Status(status),
        ])
    }

    // ========================================
    // Inbound events
    // ========================================

    /// Decode and apply one text frame.
    ///
    /// Frames that cannot be decoded only raise a warning status.
    pub fn handle_frame(&mut self, text: &str) -> Vec<ViewUpdate> {
        match InboundEvent::decode(text) {
            Ok(event) => self.apply(event),
            Err(DecodeError::UnknownType(kind)) => {
                tracing::warn!("Unknown event {} received.", kind);
                vec![ViewUpdate::Status(StatusLine::warning(
                    "Unknown event received",
                ))]
            }
            Err(e) => {
                tracing::warn!("Ignoring malformed frame: {}", e);
                vec![ViewUpdate::Status(StatusLine::warning(
                    "Malformed event received",
                ))]
            }
        }
    }

    /// Apply one decoded event.
    pub fn apply(&mut self, event: InboundEvent) -> Vec<ViewUpdate> {
        let mut updates = Vec::new();

        match event {
            InboundEvent::Message(entry) => {
                let rows = self.append_entries(vec![entry.into()]);
                if !rows.is_empty() {
                    updates.push(ViewUpdate::Transcript {
                        rows,
                        scroll: ScrollHint::FollowIfAtBottom,
                    });
                }
                self.push_connected(&mut updates);
            }
            InboundEvent::Messages(entries) => {
                let rows = self.append_entries(entries.into_iter().map(Into::into).collect());
                if !rows.is_empty() {
                    updates.push(ViewUpdate::Transcript {
                        rows,
                        scroll: ScrollHint::RevealLast,
                    });
                }
                self.push_connected(&mut updates);
            }
            InboundEvent::Users(users) => {
                self.roster.replace_all(users.into_iter().map(Attendee::from));
                updates.push(ViewUpdate::Attendees(self.attendee_rows()));
                self.push_connected(&mut updates);
            }
            InboundEvent::AddUser(user) => {
                self.roster.upsert(user.into());
                updates.push(ViewUpdate::Attendees(self.attendee_rows()));
            }
            InboundEvent::RemoveUser(user) => {
                if self.roster.remove(AttendeeId::new(user.id)) {
                    updates.push(ViewUpdate::Attendees(self.attendee_rows()));
                }
            }
            InboundEvent::Poll(poll) => {
                self.reconcile_poll(poll.map(Poll::from), &mut updates);
                self.push_connected(&mut updates);
            }
            InboundEvent::Status(status) => {
                self.status = status.into();
                if self.settings.is_admin {
                    updates.push(ViewUpdate::Controls(self.status.controls_view()));
                }
                if !self.status.is_open && self.poll.is_visible() {
                    self.reconcile_poll(None, &mut updates);
                }
                self.push_connected(&mut updates);
            }
            InboundEvent::Error(msg) => {
                tracing::warn!("Server error: {}", msg);
                updates.push(ViewUpdate::Status(StatusLine::error(msg)));
            }
            InboundEvent::Disconnect(notice) => {
                let notice: TranscriptEntry = notice.into();
                self.connection.advance_watermark(notice.id);
                updates.push(ViewUpdate::Transcript {
                    rows: self.transcript.append(notice),
                    scroll: ScrollHint::FollowIfAtBottom,
                });
                updates.push(ViewUpdate::Status(StatusLine::error("Disconnected")));
                self.connection.on_server_disconnect();
            }
        }

        updates
    }

    /// Append entries not seen yet, advancing the watermark.
    fn append_entries(&mut self, entries: Vec<TranscriptEntry>) -> Vec<TranscriptRow> {
        let mut rows = Vec::new();
        for entry in entries {
            if self.connection.has_seen(entry.id) {
                tracing::debug!("Skipping already applied entry {}", entry.id);
                continue;
            }
            self.connection.advance_watermark(entry.id);
            rows.extend(self.transcript.append(entry));
        }
        rows
    }

    fn reconcile_poll(&mut self, poll: Option<Poll>, updates: &mut Vec<ViewUpdate>) {
        let was_voted = !self.poll.voted().is_empty();
        match poll {
            Some(poll) if self.status.is_open => {
                self.poll.reconcile(&poll, self.roster.len());
            }
            _ => self.poll.hide(),
        }
        updates.push(ViewUpdate::Poll(self.poll.view()));

        if self.settings.is_admin && (was_voted || !self.poll.voted().is_empty()) {
            updates.push(ViewUpdate::Attendees(self.attendee_rows()));
        }
    }

    fn push_connected(&mut self, updates: &mut Vec<ViewUpdate>) {
        if let Some(status) = self.connection.mark_connected() {
            updates.push(ViewUpdate::Status(status));
        }
    }

    /// Attendee list sorted by name, with administrator marks when administering.
    pub fn attendee_rows(&self) -> Vec<AttendeeRow> {
        self.roster
            .sorted()
            .into_iter()
            .map(|attendee| AttendeeRow {
                id: attendee.id,
                name: attendee.name.clone(),
                color: attendee.color,
                admin: self.settings.is_admin.then(|| AdminMarks {
                    voted: self.poll.voted().contains(&attendee.id),
                    kickable: attendee.id != self.settings.self_id,
                }),
            })
            .collect()
    }

    // ========================================
    // Outbound commands
    // ========================================

    /// Build a chat message. `None` if the text is blank or there is no open
    /// connection.
    pub fn chat(&self, text: &str) -> Option<OutboundCommand> {
        let message = text.trim();
        if message.is_empty() || !self.connection.is_open() {
            return None;
        }
        Some(OutboundCommand::Message {
            message: message.to_string(),
        })
    }

    /// Vote for the option at `index`. Locks the vote buttons until the next
    /// poll update.
    pub fn vote(&mut self, index: usize) -> Result<(OutboundCommand, ViewUpdate), CommandError> {
        if !self.connection.is_open() {
            return Err(CommandError::NotConnected);
        }
        let question = self.poll.cast_vote(index)?;
        Ok((
            OutboundCommand::Vote {
                question,
                vote: index,
            },
            ViewUpdate::Poll(self.poll.view()),
        ))
    }

    /// Check that a prepared command can go out now.
    pub fn ensure_sendable(&self) -> Result<(), CommandError> {
        if self.connection.is_open() {
            Ok(())
        } else {
            Err(CommandError::NotConnected)
        }
    }
}
