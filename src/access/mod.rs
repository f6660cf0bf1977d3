//! Access-control decisions for folders and notes.
//!
//! [`AccessResolver`] combines ownership, explicit shares, folder-to-note
//! inheritance and the team-manager override into a single [`Decision`].
//! Denials carry a [`DenyReason`] whose [`code`](DenyReason::code) is stable
//! and safe to show to end users.

mod decision;
mod resolver;

pub use decision::{Decision, DenyReason, Grant, GrantSource, Operation};
pub use resolver::{AccessResolver, Target};
