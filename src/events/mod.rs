//! Membership-change notifications.
//!
//! Team actions publish a [`TeamEvent`] after each committed roster change.
//! Publishing is fire-and-forget: events go onto a bounded queue consumed by
//! a background task that calls every registered [`Listener`], retrying a
//! failing listener a bounded number of times. Nothing here can fail the
//! action that produced the event.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use folio::config::NotificationConfig;
//! use folio::events::NotificationDispatcher;
//! use folio::events::listeners::AuditLogListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let dispatcher = NotificationDispatcher::spawn(&NotificationConfig::default(), |registry| {
//!         registry.listen(AuditLogListener::new());
//!     });
//!
//!     // hand `dispatcher` to the team actions
//! }
//! ```

mod dispatcher;
mod event;
mod listener;

pub mod listeners;

pub use dispatcher::{ListenerRegistry, NotificationDispatcher};
pub use event::TeamEvent;
pub use listener::Listener;
