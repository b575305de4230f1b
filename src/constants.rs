//! Application-wide constants for timeouts, limits, and defaults.
//!
//! Central repository so magic numbers don't drift between modules.

use std::time::Duration;

/// Rate-limit window and purge horizons (§4.4, §4.7 of the design).
pub mod rate_limit {
    /// A minute bucket older than `now - STALE_MINUTES` is purgeable.
    pub const STALE_MINUTES: i64 = 2;

    /// Fixed retry hint on a 429, per spec: always 60 seconds.
    pub const RETRY_AFTER_SECS: u64 = 60;
}

/// On-path maintenance scheduler gating (§4.6).
pub mod maintenance {
    use super::Duration;

    /// Minimum gap between successive maintenance triggers in one process.
    pub const TRIGGER_INTERVAL: Duration = Duration::from_secs(5 * 60);

    /// Tenant-activity counters (a longer-lived tier than rate-limit counters)
    /// are purged once their bucket is this many minutes stale.
    pub const TENANT_ACTIVITY_STALE_MINUTES: i64 = 120;

    /// Fingerprint trackers idle longer than this are purged.
    pub const FINGERPRINT_IDLE: Duration = Duration::from_secs(24 * 60 * 60);

    /// If the store-wide `in_progress` flag has been set longer than this,
    /// the next trigger force-clears it rather than skip forever.
    pub const STUCK_RECOVERY: Duration = Duration::from_secs(10 * 60);
}

/// Defaults for values a deployer may override via environment (§6.3).
pub mod defaults {
    pub const RETENTION_DAYS: i64 = 3;
    pub const MAX_PAYLOAD_BYTES: usize = 524_288;
    pub const MAX_EVENTS_PER_POST: usize = 250;
    pub const RATE_LIMIT_PER_MINUTE: i64 = 5000;
    pub const RATE_LIMIT_PER_IP: i64 = 100;
    pub const MINUTE_CAP: i64 = 5000;
}

/// Hard ceilings that no configuration can raise.
pub mod limits {
    pub const MAX_MESSAGE_CHARS: usize = 1024;
    pub const MAX_SOURCE_CHARS: usize = 64;
    pub const MAX_ENV_CHARS: usize = 32;
    pub const MAX_USER_ID_CHARS: usize = 64;
    pub const MAX_REQUEST_ID_CHARS: usize = 64;
    pub const MAX_TAGS_CHARS: usize = 128;
    pub const MAX_QUERY_LIMIT: i64 = 1000;
    pub const DEFAULT_QUERY_LIMIT: i64 = 100;
}

/// Store (C2) pool sizing — shared-hosting friendly.
pub mod pool {
    pub const MIN_CONNECTIONS: u32 = 2;
    pub const MAX_CONNECTIONS: u32 = 10;
}

/// Timeouts for external-facing operations.
pub mod timeouts {
    use super::Duration;

    /// Tenant lookup (§4.2) has its own cap distinct from the general
    /// store operation timeout.
    pub const TENANT_LOOKUP: Duration = Duration::from_secs(10);

    /// General store operation timeout (queries, inserts, purges).
    pub const STORE_OPERATION: Duration = Duration::from_secs(10);
}
