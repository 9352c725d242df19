//! Text formatting of view updates for the terminal.

use crate::domain::{
    AttendeeRow, ControlsMode, ControlsView, PollView, StatusLevel, StatusLine, TranscriptRow,
};

const RULE: &str = "------------------------------------------------------------";

/// Formats reconciled view state as terminal text
pub struct ViewFormatter;

impl ViewFormatter {
    /// Format one transcript row
    ///
    /// # Arguments
    ///
    /// * `row` - A date separator or an entry
    ///
    /// # Returns
    ///
    /// A single line; system entries have no author column
    pub fn format_transcript_row(row: &TranscriptRow) -> String {
        match row {
            TranscriptRow::DateSeparator { date } => format!("=== {} ===", date),
            TranscriptRow::Entry(entry) => match &entry.author {
                Some(author) => format!("[{}] {}: {}", entry.time, author, entry.text),
                None => format!("[{}] * {}", entry.time, entry.text),
            },
        }
    }

    /// Format the connection status indicator
    pub fn format_status(status: &StatusLine) -> String {
        let label = match status.level {
            StatusLevel::Normal => "status",
            StatusLevel::Warning => "warning",
            StatusLevel::Error => "error",
        };
        format!("[{}] {}", label, status.text)
    }

    /// Format the attendee list
    ///
    /// # Arguments
    ///
    /// * `rows` - Attendees sorted by name; rows with admin marks also show
    ///   the attendee id so it can be used with `/kick`
    ///
    /// # Returns
    ///
    /// A block of lines framed by rules
    pub fn format_attendees(rows: &[AttendeeRow]) -> String {
        let mut output = String::new();
        output.push_str(RULE);
        output.push('\n');
        output.push_str(&format!("Attendees ({}):\n", rows.len()));

        if rows.is_empty() {
            output.push_str("(No attendees)\n");
        }
        for row in rows {
            match row.admin {
                Some(marks) => {
                    let voted = if marks.voted { " [voted]" } else { "" };
                    let kick = if marks.kickable { "" } else { " (you)" };
                    output.push_str(&format!(
                        "  {} #{}{}{}\n",
                        row.name, row.id, voted, kick
                    ));
                }
                None => output.push_str(&format!("  {}\n", row.name)),
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format the poll panel
    ///
    /// Options are numbered from 1, matching `/vote N`.
    pub fn format_poll(view: &PollView) -> String {
        let mut output = String::new();

        if view.visible {
            output.push_str(&format!("Poll: {}\n", view.question));
            for option in &view.options {
                let marker = if option.selected { "*" } else { " " };
                let locked = if option.enabled { "" } else { " (locked)" };
                output.push_str(&format!(
                    " {}{}) {}{}\n",
                    marker,
                    option.index + 1,
                    option.label,
                    locked
                ));
            }
            output.push_str(&format!("  {}\n", view.caption));
        } else {
            output.push_str("No poll running\n");
        }

        if let Some(controls) = view.controls {
            if controls.new_poll_visible {
                output.push_str("  [admin] /newpoll to start a poll\n");
            }
            if controls.abort_visible {
                output.push_str("  [admin] /abortpoll to abort this poll\n");
            }
        }
        output
    }

    /// Format the administrative meeting controls
    pub fn format_controls(view: &ControlsView) -> String {
        match view.mode {
            ControlsMode::Closed => {
                format!("[admin] Meeting closed. {}: /open", view.open_button_label)
            }
            ControlsMode::InProgress => "[admin] Meeting in progress. Finish meeting: /finish".to_string(),
            ControlsMode::Finished => {
                format!("[admin] Meeting finished. {}: /open", view.open_button_label)
            }
        }
    }

    /// Format the command list
    pub fn format_help(is_admin: bool) -> String {
        let mut output = String::from(
            "Commands:\n\
             \x20 <text>          send a chat message\n\
             \x20 /vote N         vote for option N\n\
             \x20 /users          show the attendee list\n\
             \x20 /disconnect     leave the meeting\n\
             \x20 /quit           exit\n",
        );
        if is_admin {
            output.push_str(
                "\x20 /open          open (or re-open) the meeting\n\
                 \x20 /finish         finish the meeting\n\
                 \x20 /newpoll        start a poll\n\
                 \x20 /abortpoll      abort the running poll\n\
                 \x20 /kick ID        disconnect an attendee\n",
            );
        }
        output
    }
}
