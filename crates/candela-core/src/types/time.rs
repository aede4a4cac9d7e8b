use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// An instant in consensus time: nanoseconds since the Unix epoch.
///
/// Verification only ever compares instants and adds bounded durations, so a
/// single monotonic integer is enough. Nanosecond precision matters: the
/// clock-drift and trusting-period boundaries are checked with exact
/// inequalities, and headers from real chains carry sub-second timestamps.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Time(u64);

impl Time {
    /// Construct from nanoseconds since the Unix epoch.
    pub const fn from_unix_nanos(nanos: u64) -> Self {
        Time(nanos)
    }

    /// Construct from whole seconds since the Unix epoch.
    pub const fn from_unix_secs(secs: u64) -> Self {
        Time(secs.saturating_mul(NANOS_PER_SEC))
    }

    /// Nanoseconds since the Unix epoch.
    pub const fn unix_nanos(&self) -> u64 {
        self.0
    }

    /// Shift this instant forward, saturating at the far future.
    ///
    /// Saturation means an absurdly large trusting period simply never
    /// expires instead of wrapping into the past.
    pub fn saturating_add(self, duration: Duration) -> Self {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        Time(self.0.saturating_add(nanos))
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}s", self.0 / NANOS_PER_SEC, self.0 % NANOS_PER_SEC)
    }
}
