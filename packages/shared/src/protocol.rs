//! Wire protocol spoken between the meeting client and the meeting server.
//!
//! Every server-to-client frame is a JSON envelope `{ "type": ..., "data": ..., "msg": ... }`
//! where the shape of `data` depends on `type`. Client-to-server frames are flat
//! JSON objects tagged by `type`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Number of answer slots a poll can carry
pub const MAX_POLL_ANSWERS: usize = 5;

/// Minimum number of answers a new poll must offer
pub const MIN_POLL_ANSWERS: usize = 2;

/// WebSocket close codes used by the meeting protocol.
pub mod close_code {
    /// Normal closure
    pub const NORMAL: u16 = 1000;
    /// Closed without a status code in the close frame
    pub const NO_STATUS: u16 = 1005;
    /// Link dropped without a close handshake
    pub const ABNORMAL: u16 = 1006;
    /// Start of the application-defined close code range
    pub const APPLICATION_MIN: u16 = 4000;
    /// Unknown meeting or access key
    pub const INVALID_KEY: u16 = 4001;
    /// Disconnected by an administrator
    pub const KICKED: u16 = 4002;
    /// Access key is barred from rejoining
    pub const BANNED: u16 = 4003;
    /// The same attendee connected again elsewhere
    pub const REPLACED: u16 = 4004;
}

/// One transcript entry as sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDto {
    pub id: i64,
    pub time: String,
    pub date: String,
    /// Absent for system generated entries
    #[serde(default)]
    pub fromname: Option<String>,
    #[serde(default)]
    pub color: Option<u32>,
    pub message: String,
}

/// One connected attendee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeDto {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub color: Option<u32>,
}

/// Reference to an attendee that left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeRef {
    pub id: i64,
}

/// Payload of the full presence replacement event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersDto {
    pub users: Vec<AttendeeDto>,
}

/// State of the running poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollDto {
    pub question: String,
    pub answers: Vec<String>,
    /// Ids of attendees that have voted so far
    #[serde(default)]
    pub voted: Vec<i64>,
    /// Vote count per answer index
    #[serde(default)]
    pub tally: Vec<u32>,
}

/// Meeting open/finished flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDto {
    pub isopen: bool,
    pub isfinished: bool,
}

/// A decoded server-to-client event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// One chat or system entry
    Message(EntryDto),
    /// A batch of entries, typically the replay after (re)connecting
    Messages(Vec<EntryDto>),
    /// Full replacement of the attendee list
    Users(Vec<AttendeeDto>),
    AddUser(AttendeeDto),
    RemoveUser(AttendeeRef),
    /// Poll state, `None` when no poll is running
    Poll(Option<PollDto>),
    Status(StatusDto),
    /// Server-side error text
    Error(String),
    /// The server is disconnecting this client; carries the notice entry
    Disconnect(EntryDto),
}

/// Errors produced while decoding an inbound frame.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON frame: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("unknown event type '{0}'")]
    UnknownType(String),

    #[error("malformed '{kind}' payload: {source}")]
    MalformedPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    msg: Option<String>,
}

impl InboundEvent {
    /// The envelope `type` this event travels under.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Message(_) => "message",
            InboundEvent::Messages(_) => "messages",
            InboundEvent::Users(_) => "users",
            InboundEvent::AddUser(_) => "adduser",
            InboundEvent::RemoveUser(_) => "removeuser",
            InboundEvent::Poll(_) => "poll",
            InboundEvent::Status(_) => "status",
            InboundEvent::Error(_) => "error",
            InboundEvent::Disconnect(_) => "disconnect",
        }
    }

    /// Decode one text frame.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let envelope: Envelope = serde_json::from_str(text).map_err(DecodeError::InvalidJson)?;
        let kind = envelope.kind;
        let data = envelope.data;

        let malformed = |source: serde_json::Error| {
            tracing::debug!("Malformed {} payload: {}", kind, source);
            DecodeError::MalformedPayload {
                kind: kind.clone(),
                source,
            }
        };

        let event = match kind.as_str() {
            "message" => InboundEvent::Message(serde_json::from_value(data).map_err(malformed)?),
            "messages" => InboundEvent::Messages(serde_json::from_value(data).map_err(malformed)?),
            "users" => {
                let users: UsersDto = serde_json::from_value(data).map_err(malformed)?;
                InboundEvent::Users(users.users)
            }
            "adduser" => InboundEvent::AddUser(serde_json::from_value(data).map_err(malformed)?),
            "removeuser" => {
                InboundEvent::RemoveUser(serde_json::from_value(data).map_err(malformed)?)
            }
            // "newpoll" is accepted as an alias for servers that announce poll creation separately
            "poll" | "newpoll" => {
                if poll_payload_is_empty(&data) {
                    InboundEvent::Poll(None)
                } else {
                    InboundEvent::Poll(Some(serde_json::from_value(data).map_err(malformed)?))
                }
            }
            "status" => InboundEvent::Status(serde_json::from_value(data).map_err(malformed)?),
            "error" => InboundEvent::Error(
                envelope
                    .msg
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ),
            "disconnect" => {
                InboundEvent::Disconnect(serde_json::from_value(data).map_err(malformed)?)
            }
            _ => {
                tracing::debug!("Unknown event type {}", kind);
                return Err(DecodeError::UnknownType(kind.clone()));
            }
        };

        Ok(event)
    }

    /// Encode the event into a text frame.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let (data, msg) = match self {
            InboundEvent::Message(entry) | InboundEvent::Disconnect(entry) => {
                (serde_json::to_value(entry)?, None)
            }
            InboundEvent::Messages(entries) => (serde_json::to_value(entries)?, None),
            InboundEvent::Users(users) => (
                serde_json::to_value(UsersDto {
                    users: users.clone(),
                })?,
                None,
            ),
            InboundEvent::AddUser(user) => (serde_json::to_value(user)?, None),
            InboundEvent::RemoveUser(user) => (serde_json::to_value(user)?, None),
            InboundEvent::Poll(poll) => (serde_json::to_value(poll)?, None),
            InboundEvent::Status(status) => (serde_json::to_value(status)?, None),
            InboundEvent::Error(msg) => (Value::Null, Some(msg.clone())),
        };

        serde_json::to_string(&Envelope {
            kind: self.kind().to_string(),
            data,
            msg,
        })
    }
}

fn poll_payload_is_empty(data: &Value) -> bool {
    match data {
        Value::Null | Value::Bool(false) => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// A client-to-server command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundCommand {
    /// Chat text
    Message { message: String },
    /// Vote for the answer at index `vote`; `question` guards against voting on
    /// a poll that was replaced in the meantime
    Vote { question: String, vote: usize },
    /// Forcibly disconnect another attendee
    Kick { user: i64, canrejoin: bool },
    Open,
    Finish,
    AbortPoll,
    NewPoll {
        question: String,
        answers: Vec<String>,
        minutes: u32,
    },
}

impl OutboundCommand {
    /// Encode the command into a text frame.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
