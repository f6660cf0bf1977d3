//! Built-in event listeners.
//!
//! These listeners provide common functionality out of the box.
//! Register them through [`NotificationDispatcher::spawn`](super::NotificationDispatcher::spawn).

mod logging;
#[cfg(feature = "tracing")]
mod tracing;

pub use logging::AuditLogListener;
#[cfg(feature = "tracing")]
pub use self::tracing::TracingListener;
