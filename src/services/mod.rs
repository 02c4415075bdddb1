//! Service layer
//!
//! Status probes and update script execution

pub mod status;
pub mod update;
