//! Conversion logic between DTOs and domain entities.

use agora_shared::protocol as dto;

use crate::domain::{Attendee, AttendeeId, MessageId, MeetingStatus, Poll, TranscriptEntry};

// ========================================
// DTO → Domain Entity
// ========================================

impl From<dto::EntryDto> for TranscriptEntry {
    fn from(dto: dto::EntryDto) -> Self {
        Self {
            id: MessageId::new(dto.id),
            time: dto.time,
            date: dto.date,
            // An empty author is treated like a missing one
            author: dto.fromname.filter(|name| !name.is_empty()),
            color: dto.color,
            text: dto.message,
        }
    }
}

impl From<dto::AttendeeDto> for Attendee {
    fn from(dto: dto::AttendeeDto) -> Self {
        Self {
            id: AttendeeId::new(dto.id),
            name: dto.name,
            color: dto.color,
        }
    }
}

impl From<dto::PollDto> for Poll {
    fn from(dto: dto::PollDto) -> Self {
        Self {
            question: dto.question,
            answers: dto.answers,
            voted: dto.voted.into_iter().map(AttendeeId::new).collect(),
            tally: dto.tally,
        }
    }
}

impl From<dto::StatusDto> for MeetingStatus {
    fn from(dto: dto::StatusDto) -> Self {
        Self {
            is_open: dto.isopen,
            is_finished: dto.isfinished,
        }
    }
}
