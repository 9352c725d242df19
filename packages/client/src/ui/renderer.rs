//! Terminal rendering target.

use std::io::{self, Write};

use crate::domain::{Renderer, StatusLine, ViewUpdate};

use super::formatter::ViewFormatter;

/// Prompt shown by the input editor
pub const PROMPT: &str = "> ";

/// Writes view updates as text, then redraws the prompt.
///
/// Repeated identical status lines are printed once.
pub struct TerminalRenderer<W: Write + Send> {
    out: W,
    last_status: Option<StatusLine>,
    disconnect_available: bool,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_status: None,
            disconnect_available: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn text_for(&mut self, update: &ViewUpdate) -> Option<String> {
        match update {
            ViewUpdate::Status(status) => {
                if self.last_status.as_ref() == Some(status) {
                    return None;
                }
                self.last_status = Some(status.clone());
                Some(ViewFormatter::format_status(status))
            }
            ViewUpdate::Transcript { rows, .. } => Some(
                rows.iter()
                    .map(ViewFormatter::format_transcript_row)
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            ViewUpdate::Attendees(rows) => Some(ViewFormatter::format_attendees(rows)),
            ViewUpdate::Poll(view) => Some(ViewFormatter::format_poll(view)),
            ViewUpdate::Controls(view) => Some(ViewFormatter::format_controls(view)),
            ViewUpdate::DisconnectAvailable(available) => {
                let changed = self.disconnect_available != *available;
                self.disconnect_available = *available;
                (changed && *available).then(|| "Type /disconnect to leave the meeting".to_string())
            }
        }
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn render(&mut self, update: &ViewUpdate) {
        let Some(text) = self.text_for(update) else {
            return;
        };
        let result = writeln!(self.out, "\r{}", text.trim_end())
            .and_then(|_| write!(self.out, "{}", PROMPT))
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            tracing::warn!("Failed to write to terminal: {}", e);
        }
    }
}
