// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Synchronizer defaults
pub mod sync {
    /// Period between forced full re-lists
    pub const RESYNC_PERIOD_SECS: u64 = 10;
    /// First delay after a failed list or watch
    pub const INITIAL_BACKOFF_MILLIS: u64 = 500;
    /// Maximum delay between retries (exponential backoff cap)
    pub const MAX_BACKOFF_SECS: u64 = 30;
    /// Attempts for a full list before the failure is reported
    pub const MAX_LIST_ATTEMPTS: u32 = 5;
    /// Server-side watch timeout, must stay below the apiserver limit of 295s
    pub const WATCH_TIMEOUT_SECS: u32 = 290;
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
