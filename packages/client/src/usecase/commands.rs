//! UseCase: administrative commands gated behind confirmations
//!
//! Every builder returns `Ok(None)` when the user declined, `Ok(Some(cmd))`
//! when the command should go out, and an error when it was rejected locally.

use agora_shared::protocol::OutboundCommand;

use crate::domain::{AttendeeId, CommandError, Confirm, NewPollDraft};

use super::meeting_client::ClientSettings;

fn require_admin(settings: &ClientSettings) -> Result<(), CommandError> {
    if settings.is_admin {
        Ok(())
    } else {
        Err(CommandError::NotAdministrator)
    }
}

fn confirmed(
    settings: &ClientSettings,
    confirm: &mut dyn Confirm,
    prompt: &str,
    command: OutboundCommand,
) -> Result<Option<OutboundCommand>, CommandError> {
    require_admin(settings)?;
    Ok(confirm.confirm(prompt).then_some(command))
}

pub fn open_meeting(
    settings: &ClientSettings,
    confirm: &mut dyn Confirm,
) -> Result<Option<OutboundCommand>, CommandError> {
    confirmed(
        settings,
        confirm,
        "Are you sure you want to open this meeting?",
        OutboundCommand::Open,
    )
}

pub fn finish_meeting(
    settings: &ClientSettings,
    confirm: &mut dyn Confirm,
) -> Result<Option<OutboundCommand>, CommandError> {
    confirmed(
        settings,
        confirm,
        "Are you sure you want to finish this meeting?",
        OutboundCommand::Finish,
    )
}

pub fn abort_poll(
    settings: &ClientSettings,
    confirm: &mut dyn Confirm,
) -> Result<Option<OutboundCommand>, CommandError> {
    confirmed(
        settings,
        confirm,
        "Are you sure you want to abort this poll?",
        OutboundCommand::AbortPoll,
    )
}

/// Validate the draft and ask before starting the poll.
///
/// The draft is reset once the command is ready to go out; a rejected or
/// declined draft keeps its content for correction, and so does one built
/// while the session is offline.
pub fn new_poll(
    settings: &ClientSettings,
    confirm: &mut dyn Confirm,
    draft: &mut NewPollDraft,
    online: bool,
) -> Result<Option<OutboundCommand>, CommandError> {
    require_admin(settings)?;
    let poll = draft.validate()?;
    if !online {
        return Err(CommandError::NotConnected);
    }

    if let Some(warning) = poll.duration_warning() {
        confirm.warn(&warning);
    }
    if !confirm.confirm("Are you sure you want to start this poll?") {
        return Ok(None);
    }

    draft.reset();
    Ok(Some(OutboundCommand::NewPoll {
        question: poll.question,
        answers: poll.answers,
        minutes: poll.minutes,
    }))
}

/// Two questions: whether to disconnect at all, then whether the attendee
/// may rejoin.
pub fn kick(
    settings: &ClientSettings,
    confirm: &mut dyn Confirm,
    target: AttendeeId,
) -> Result<Option<OutboundCommand>, CommandError> {
    require_admin(settings)?;
    if target == settings.self_id {
        return Err(CommandError::CannotKickSelf(target));
    }

    if !confirm.confirm(&format!(
        "Are you sure you want to disconnect attendee {}?",
        target
    )) {
        return Ok(None);
    }
    let canrejoin = confirm.confirm("Should they be allowed to rejoin?");

    Ok(Some(OutboundCommand::Kick {
        user: target.value(),
        canrejoin,
    }))
}
