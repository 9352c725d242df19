//! Code shared between the meeting client and the development meeting server.

pub mod logger;
pub mod protocol;
pub mod time;
