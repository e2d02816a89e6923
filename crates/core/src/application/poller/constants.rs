// Poller constants (no magic values)
use std::time::Duration;

/// Default upper bound on wall-clock wait for a task (5s)
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Default pause between two task status fetches (50ms)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default per-request HTTP timeout (30s)
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
