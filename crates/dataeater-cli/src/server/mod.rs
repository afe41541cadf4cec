//! Local JSON HTTP API over a single data store.

pub mod app;
pub mod error;
pub mod handlers;
pub mod state;
