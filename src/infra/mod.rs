//! Infrastructure
//!
//! Wraps external processes

pub mod command;

pub use command::{CommandError, CommandRunner, MergedChild};
