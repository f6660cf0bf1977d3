//! Configuration types for folio.
//!
//! All settings have production defaults. Components take the sub-config
//! they need, so a single [`FolioConfig`] can be built once at startup and
//! handed out piecewise.
//!
//! # Example
//!
//! ```rust
//! use folio::config::{CacheConfig, FolioConfig};
//! use chrono::Duration;
//!
//! // Use defaults
//! let config = FolioConfig::default();
//!
//! // Or customize
//! let config = FolioConfig {
//!     cache: CacheConfig {
//!         ttl: Duration::hours(1),
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! ```

use std::time::Duration as StdDuration;

use chrono::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default)]
pub struct FolioConfig {
    /// Team membership cache settings.
    pub cache: CacheConfig,

    /// Identity lookup timeouts.
    pub identity: IdentityConfig,

    /// Notification dispatcher settings.
    pub notifications: NotificationConfig,
}

impl FolioConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration suitable for development/testing.
    ///
    /// Short cache TTL so roster changes show up quickly, and a single
    /// notification attempt.
    pub fn development() -> Self {
        Self {
            cache: CacheConfig {
                ttl: Duration::minutes(5),
                operation_timeout: StdDuration::from_millis(250),
            },
            identity: IdentityConfig {
                single_timeout: StdDuration::from_secs(2),
                bulk_timeout: StdDuration::from_secs(4),
            },
            notifications: NotificationConfig {
                queue_capacity: 64,
                max_attempts: 1,
                retry_backoff: StdDuration::from_millis(10),
            },
        }
    }
}

/// Configuration for the team membership cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Sliding expiration of a cached member set.
    ///
    /// Default: 24 hours
    pub ttl: Duration,

    /// Upper bound on a single cache backend call.
    ///
    /// Default: 500 milliseconds
    pub operation_timeout: StdDuration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(24),
            operation_timeout: StdDuration::from_millis(500),
        }
    }
}

/// Timeouts for identity collaborator calls.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Default: 5 seconds
    pub single_timeout: StdDuration,

    /// Default: 10 seconds
    pub bulk_timeout: StdDuration,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            single_timeout: StdDuration::from_secs(5),
            bulk_timeout: StdDuration::from_secs(10),
        }
    }
}

/// Configuration for the background notification dispatcher.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// Events queued beyond this are dropped with a warning.
    ///
    /// Default: 1024
    pub queue_capacity: usize,

    /// Delivery attempts per listener before the event is given up.
    ///
    /// Default: 3
    pub max_attempts: u32,

    /// Delay between attempts, doubled after each failure.
    ///
    /// Default: 100 milliseconds
    pub retry_backoff: StdDuration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            max_attempts: 3,
            retry_backoff: StdDuration::from_millis(100),
        }
    }
}
