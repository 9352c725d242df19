//! Server configuration.

use std::{str::FromStr, sync::Arc};

use agora_shared::time::SystemClock;

use crate::{
    domain::{Attendee, Meeting},
    error::ServerError,
    ui::Server,
    usecase::MeetingContext,
};

/// An access key and who it lets in, written `KEY=ID:NAME[:admin]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendeeAccess {
    pub key: String,
    pub attendee: Attendee,
}

impl FromStr for AttendeeAccess {
    type Err = ServerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| ServerError::InvalidAttendee {
            value: value.to_string(),
            reason,
        };

        let (key, rest) = value
            .split_once('=')
            .ok_or_else(|| invalid("expected KEY=ID:NAME[:admin]"))?;
        if key.is_empty() {
            return Err(invalid("key is empty"));
        }

        let mut parts = rest.split(':');
        let id = parts
            .next()
            .and_then(|id| id.parse::<i64>().ok())
            .ok_or_else(|| invalid("id must be a number"))?;
        let name = parts
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| invalid("name is empty"))?;
        let admin = match parts.next() {
            None => false,
            Some("admin") => true,
            Some(_) => return Err(invalid("only 'admin' may follow the name")),
        };

        Ok(Self {
            key: key.to_string(),
            attendee: Attendee::new(id, name, admin),
        })
    }
}

/// Access used when none is configured.
pub fn default_attendees() -> Vec<AttendeeAccess> {
    vec![
        AttendeeAccess {
            key: "admin-key".to_string(),
            attendee: Attendee::new(1, "Admin", true),
        },
        AttendeeAccess {
            key: "alice-key".to_string(),
            attendee: Attendee::new(2, "Alice", false),
        },
        AttendeeAccess {
            key: "bob-key".to_string(),
            attendee: Attendee::new(3, "Bob", false),
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub meeting_id: String,
    pub attendees: Vec<AttendeeAccess>,
    pub utc_offset_hours: i32,
    /// Start with the meeting already open
    pub open: bool,
}

impl ServerConfig {
    pub fn meeting(&self) -> Meeting {
        let access = self
            .attendees
            .iter()
            .map(|access| (access.key.clone(), access.attendee.clone()));
        let mut meeting = Meeting::new(&self.meeting_id, access, self.utc_offset_hours);
        meeting.set_open(self.open);
        meeting
    }

    /// Server running on the system clock.
    pub fn build(&self) -> Server {
        Server::new(MeetingContext::new(self.meeting(), Arc::new(SystemClock)))
    }
}
