// Poller constants (no magic values)
use std::time::Duration;

/// Fixed sleep between status fetches (30s)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Key holding the status in every status payload
pub const STATUS_KEY: &str = "Status";

/// Key holding the failure detail, when the platform sends one
pub const MESSAGE_KEY: &str = "Message";
