use std::{
    fmt,
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch
///
/// Persisted as a bare JSON integer.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    pub fn saturating_add(self, duration: Duration) -> Self {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }

    pub fn to_system_time(self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.0)
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        // clocks before the epoch clamp to zero
        let elapsed = time.duration_since(UNIX_EPOCH).unwrap_or_default();
        Self(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Last millisecond representable as an RFC 3339 date, 9999-12-31T23:59:59.999Z
const RFC3339_MAX_MILLIS: u64 = 253_402_300_799_999;

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 > RFC3339_MAX_MILLIS {
            return write!(f, "{}ms", self.0);
        }
        write!(
            f,
            "{}",
            humantime::format_rfc3339_seconds(self.to_system_time())
        )
    }
}

/// A live profile
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: u64,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::persist::null_as_default")]
    pub active: bool,
    #[serde(default)]
    pub created: Timestamp,
}

/// A removed profile whose storage directory is waiting for collection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcEntry {
    pub id: u64,
    pub name: Option<String>,
    #[serde(default)]
    pub created: Timestamp,
    #[serde(default)]
    pub removed: Timestamp,
}

impl GcEntry {
    pub fn from_profile(profile: Profile, removed: Timestamp) -> Self {
        let Profile {
            id, name, created, ..
        } = profile;
        Self {
            id,
            name,
            created,
            removed,
        }
    }

    /// Whether the grace period has passed at `now`.
    ///
    /// A zero delay makes every entry due.
    pub fn due(&self, delay: Duration, now: Timestamp) -> bool {
        delay.is_zero() || self.removed.saturating_add(delay) <= now
    }
}

/// Storage directory of the profile `id` inside the registry `directory`.
///
/// Never persisted, always derived from the current registry location.
pub fn storage_path<P: AsRef<Path>>(directory: P, id: u64) -> PathBuf {
    directory.as_ref().join(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_a_bare_integer() {
        let json = serde_json::to_string(&Timestamp(1_700_000_000_123)).unwrap();
        assert_eq!(json, "1700000000123");
    }

    #[test]
    fn display_far_future_timestamp() {
        assert_eq!(Timestamp(0).to_string(), "1970-01-01T00:00:00Z");
        assert_eq!(
            Timestamp(253_402_300_799_999).to_string(),
            "9999-12-31T23:59:59Z"
        );
        assert_eq!(
            Timestamp(400_000_000_000_000).to_string(),
            "400000000000000ms"
        );
        assert_eq!(Timestamp(u64::MAX).to_string(), format!("{}ms", u64::MAX));
    }

    #[test]
    fn profile_without_active_flag_is_inactive() {
        let profile: Profile =
            serde_json::from_str(r#"{"id": 3, "name": null, "created": 10}"#).unwrap();
        assert!(!profile.active);
        assert_eq!(profile.name, None);
        assert_eq!(profile.created, Timestamp(10));
    }

    #[test]
    fn entry_is_due_once_delay_elapsed() {
        let entry = GcEntry {
            id: 1,
            name: None,
            created: Timestamp(0),
            removed: Timestamp(1_000),
        };
        let delay = Duration::from_millis(500);
        assert!(!entry.due(delay, Timestamp(1_499)));
        assert!(entry.due(delay, Timestamp(1_500)));
        assert!(entry.due(Duration::ZERO, Timestamp(0)));
    }

    #[test]
    fn storage_is_directory_joined_with_decimal_id() {
        assert_eq!(
            storage_path("/var/lib/app", 42),
            PathBuf::from("/var/lib/app/42")
        );
    }
}
