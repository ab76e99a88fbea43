//! Scholarship application and payment lifecycle engine.
//!
//! The crate is organized around the [`lifecycle`] module: a state machine
//! that moves applications from creation through payment settlement to a
//! moderator decision, with every transition gated by the subject's
//! authoritative role as stored in the user directory.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod telemetry;
