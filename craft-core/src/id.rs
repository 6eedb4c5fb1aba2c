//! Prefixed identifiers for templates, designs, and layers.

use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

/// Generate a unique identifier of the form `{prefix}-{time}{random}`.
///
/// The time component is the current Unix time in milliseconds as lowercase
/// hex, so ids sharing a prefix sort roughly by creation time. The random
/// component is the low 64 bits of a v4 UUID. No shared counter is involved.
///
/// ```
/// let id = craft_core::id::generate_id("tpl");
/// assert!(id.starts_with("tpl-"));
/// ```
#[must_use]
pub fn generate_id(prefix: &str) -> String {
    let (_, random) = Uuid::new_v4().as_u64_pair();
    format!("{prefix}-{:x}{random:016x}", current_timestamp_ms())
}

/// Get the current Unix timestamp in milliseconds.
#[must_use]
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        // Timestamp will not exceed u64 max for millennia
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}
