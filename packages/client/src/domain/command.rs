//! Local validation of the new-poll form.

use agora_shared::protocol::{MAX_POLL_ANSWERS, MIN_POLL_ANSWERS};

use super::error::CommandError;

/// Duration a new poll starts out with
pub const DEFAULT_POLL_MINUTES: u32 = 5;

/// Durations above this only raise a warning
pub const LONG_POLL_MINUTES: u32 = 10;

/// Raw input of the new-poll form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPollDraft {
    pub question: String,
    /// Up to [`MAX_POLL_ANSWERS`] optional answer slots; blank slots are skipped
    pub answers: Vec<String>,
    /// Minutes as typed
    pub minutes: String,
}

impl Default for NewPollDraft {
    fn default() -> Self {
        Self {
            question: String::new(),
            answers: vec![String::new(); MAX_POLL_ANSWERS],
            minutes: DEFAULT_POLL_MINUTES.to_string(),
        }
    }
}

/// A poll that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPoll {
    pub question: String,
    pub answers: Vec<String>,
    pub minutes: u32,
}

impl ValidatedPoll {
    /// Soft warning for unusually long polls. Never blocks sending.
    pub fn duration_warning(&self) -> Option<String> {
        (self.minutes > LONG_POLL_MINUTES).then(|| {
            format!(
                "Poll time of {} minutes is over {} minutes.",
                self.minutes, LONG_POLL_MINUTES
            )
        })
    }
}

impl NewPollDraft {
    pub fn validate(&self) -> Result<ValidatedPoll, CommandError> {
        let question = self.question.trim();
        if question.is_empty() {
            return Err(CommandError::EmptyQuestion);
        }

        let answers: Vec<String> = self
            .answers
            .iter()
            .take(MAX_POLL_ANSWERS)
            .map(|answer| answer.trim())
            .filter(|answer| !answer.is_empty())
            .map(str::to_string)
            .collect();
        if answers.len() < MIN_POLL_ANSWERS {
            return Err(CommandError::TooFewAnswers {
                found: answers.len(),
            });
        }

        let raw_minutes = self.minutes.trim();
        let minutes: i64 = raw_minutes
            .parse()
            .map_err(|_| CommandError::InvalidDuration(raw_minutes.to_string()))?;
        if minutes < 0 {
            return Err(CommandError::NegativeDuration(minutes));
        }
        let minutes = u32::try_from(minutes)
            .map_err(|_| CommandError::InvalidDuration(raw_minutes.to_string()))?;

        Ok(ValidatedPoll {
            question: question.to_string(),
            answers,
            minutes,
        })
    }

    /// Clear the form for the next poll.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
