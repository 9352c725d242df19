//! Conversions between wire DTOs (`agora_shared::protocol`) and domain types.

pub mod conversion;
