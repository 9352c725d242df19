//! Append-only meeting transcript with date grouping.

use super::value_object::MessageId;

/// One line of the meeting transcript. Never changes once received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub id: MessageId,
    pub time: String,
    pub date: String,
    /// `None` for system generated entries
    pub author: Option<String>,
    pub color: Option<u32>,
    pub text: String,
}

impl TranscriptEntry {
    /// System entries have no author and are rendered without an author column.
    pub fn is_system(&self) -> bool {
        self.author.is_none()
    }
}

/// A row handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptRow {
    /// Inserted whenever the date differs from the previously rendered row
    DateSeparator { date: String },
    Entry(TranscriptEntry),
}

/// How the transcript view should move after new rows are appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollHint {
    /// Follow the new row only if the view is already at its bottom
    FollowIfAtBottom,
    /// Bring the last appended row into view
    RevealLast,
}

/// Ordered sequence of applied entries.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    last_rendered_date: Option<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry and return the rows that render it.
    ///
    /// A date separator precedes the entry when its date differs from the last
    /// rendered date.
    pub fn append(&mut self, entry: TranscriptEntry) -> Vec<TranscriptRow> {
        let mut rows = Vec::with_capacity(2);

        if self.last_rendered_date.as_deref() != Some(entry.date.as_str()) {
            self.last_rendered_date = Some(entry.date.clone());
            rows.push(TranscriptRow::DateSeparator {
                date: entry.date.clone(),
            });
        }

        rows.push(TranscriptRow::Entry(entry.clone()));
        self.entries.push(entry);
        rows
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
