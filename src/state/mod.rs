//! Runtime state
//!
//! Shared application state and the update run guard

pub mod app_state;
pub mod update_guard;

pub use app_state::AppState;
pub use update_guard::{UpdateGuard, UpdatePermit};
