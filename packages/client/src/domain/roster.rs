//! Attendee presence.

use std::collections::HashMap;

use super::value_object::AttendeeId;

/// One connected participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendee {
    pub id: AttendeeId,
    pub name: String,
    pub color: Option<u32>,
}

/// Set of connected attendees keyed by id.
///
/// The server gives no ordering guarantee, so every read for display goes
/// through [`Roster::sorted`].
#[derive(Debug, Default)]
pub struct Roster {
    attendees: HashMap<AttendeeId, Attendee>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole set with `attendees`.
    pub fn replace_all(&mut self, attendees: impl IntoIterator<Item = Attendee>) {
        self.attendees = attendees
            .into_iter()
            .map(|attendee| (attendee.id, attendee))
            .collect();
    }

    /// Insert an attendee, overwriting any previous entry with the same id.
    pub fn upsert(&mut self, attendee: Attendee) {
        self.attendees.insert(attendee.id, attendee);
    }

    /// Remove an attendee. Returns `false` if the id was not present.
    pub fn remove(&mut self, id: AttendeeId) -> bool {
        self.attendees.remove(&id).is_some()
    }

    pub fn get(&self, id: AttendeeId) -> Option<&Attendee> {
        self.attendees.get(&id)
    }

    pub fn len(&self) -> usize {
        self.attendees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attendees.is_empty()
    }

    /// Attendees sorted by name, ties broken by id.
    pub fn sorted(&self) -> Vec<&Attendee> {
        let mut attendees: Vec<&Attendee> = self.attendees.values().collect();
        attendees.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        attendees
    }
}
