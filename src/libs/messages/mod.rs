//! User-facing text. Commands print [`Message`] values through the
//! `msg_*` macros instead of formatting strings inline.

pub mod display;
pub mod macros;
pub mod types;

pub use types::Message;
