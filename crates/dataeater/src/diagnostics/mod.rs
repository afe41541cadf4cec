//! Error classification for the notification layer.
//!
//! Engine, network and IO failures arrive as free-form messages. They are
//! mapped onto a small set of [`ErrorCode`]s, each of which carries a
//! human-readable title, message and suggestion. The raw message is kept on
//! the [`ErrorReport`] for diagnostics.

mod classify;

pub use classify::{ErrorCode, ErrorReport};
