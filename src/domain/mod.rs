//! Domain models
//!
//! Plain data, no axum/tokio

pub mod status;

pub use status::{
    OutputLine, OutputStream, StatusSnapshot, UpdateEvent, UpdateOutcome, UpdateResponse,
};
