//! View models produced by reconciliation and the rendering seam.

use super::{
    meeting::ControlsMode,
    transcript::{ScrollHint, TranscriptRow},
    value_object::AttendeeId,
};

/// Severity of the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Normal,
    Warning,
    Error,
}

/// Status indicator text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusLine {
    pub fn normal(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Normal,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }
}

/// Marks only shown to meeting administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminMarks {
    /// Attendee has voted in the running poll
    pub voted: bool,
    /// Attendee can be disconnected (everyone but yourself)
    pub kickable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendeeRow {
    pub id: AttendeeId,
    pub name: String,
    pub color: Option<u32>,
    pub admin: Option<AdminMarks>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptionView {
    pub index: usize,
    pub label: String,
    pub enabled: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollControlsView {
    pub new_poll_visible: bool,
    pub abort_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollView {
    pub visible: bool,
    pub question: String,
    pub options: Vec<PollOptionView>,
    pub meter_value: u32,
    pub meter_max: usize,
    pub caption: String,
    /// `None` unless administering
    pub controls: Option<PollControlsView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlsView {
    pub mode: ControlsMode,
    pub open_button_label: String,
}

/// One change to apply to the rendering target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    Status(StatusLine),
    /// Rows appended to the transcript in one visual update
    Transcript {
        rows: Vec<TranscriptRow>,
        scroll: ScrollHint,
    },
    /// Full, sorted attendee list
    Attendees(Vec<AttendeeRow>),
    Poll(PollView),
    /// Administrative meeting controls
    Controls(ControlsView),
    /// Whether the manual disconnect action is available
    DisconnectAvailable(bool),
}

/// Rendering target for reconciled view state.
pub trait Renderer: Send {
    fn render(&mut self, update: &ViewUpdate);
}
