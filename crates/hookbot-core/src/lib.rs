//! Core types for the Telegram webhook adapter.
//!
//! This crate is provider-agnostic plumbing: configuration, errors, the wire
//! message types and the single-slot delivery channel. The HTTP listener and the
//! outbound client live in the adapter crate.

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;

pub use errors::{Error, Result, SendError, SendErrorKind};
