//! Session settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Idle timeout applied to new sessions.
pub const DEFAULT_GLOBAL_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Period of the background validation sweep.
pub const DEFAULT_VALIDATION_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Written in human form, e.g. `"30m"`. `"0s"` disables the timeout.
    #[serde(with = "human_duration")]
    pub global_timeout: Duration,
    #[serde(with = "human_duration")]
    pub validation_interval: Duration,
    /// Run the validation scheduler.
    pub validation_enabled: bool,
    /// Delete sessions the validation sweep finds invalid.
    pub delete_invalid_sessions: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            global_timeout: DEFAULT_GLOBAL_TIMEOUT,
            validation_interval: DEFAULT_VALIDATION_INTERVAL,
            validation_enabled: true,
            delete_invalid_sessions: true,
        }
    }
}

/// `serde(with)` adapter for durations written like `"5m"` or `"1h 30m"`.
pub mod human_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}
