//! Time-ordered snapshot tokens (version-1 UUIDs).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 100ns intervals between the Gregorian reform (1582-10-15) and the Unix epoch.
const GREGORIAN_OFFSET: i64 = 0x01B2_1DD2_1381_4000;
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Clock sequence and node bytes of the smallest token for a given instant.
const MIN_CLOCK_AND_NODE: [u8; 8] = [0x80; 8];

/// A version-1 UUID used as a write-time proxy and sortable version marker.
///
/// Tokens order by their embedded timestamp first and by clock sequence and
/// node bytes second, compared as signed bytes. This matches how the document
/// store sorts `timeuuid` columns and makes [`TimeUuid::min_for`] the
/// smallest token of its tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Uuid", into = "Uuid")]
pub struct TimeUuid(Uuid);

impl TimeUuid {
    /// The smallest token carrying `instant` as its timestamp.
    pub fn min_for(instant: DateTime<Utc>) -> Self {
        let unix_ticks = instant.timestamp() * TICKS_PER_SECOND
            + i64::from(instant.timestamp_subsec_nanos() / 100);
        let ticks = u64::try_from(unix_ticks + GREGORIAN_OFFSET).unwrap_or(0);

        let time_low = ticks as u32;
        let time_mid = (ticks >> 32) as u16;
        let time_hi_and_version = ((ticks >> 48) as u16 & 0x0FFF) | 0x1000;

        Self(Uuid::from_fields(
            time_low,
            time_mid,
            time_hi_and_version,
            &MIN_CLOCK_AND_NODE,
        ))
    }

    /// Token for 1970-01-01T00:00:00Z, used when no watermark exists yet.
    pub fn epoch() -> Self {
        Self::min_for(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn now() -> Self {
        Self::min_for(Utc::now())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Raw 60-bit timestamp in 100ns ticks since 1582-10-15.
    fn ticks(&self) -> u64 {
        let (time_low, time_mid, time_hi_and_version, _) = self.0.as_fields();
        (u64::from(time_hi_and_version & 0x0FFF) << 48)
            | (u64::from(time_mid) << 32)
            | u64::from(time_low)
    }

    fn clock_and_node(&self) -> [i8; 8] {
        let mut signed = [0i8; 8];
        for (dst, src) in signed.iter_mut().zip(&self.0.as_bytes()[8..]) {
            *dst = *src as i8;
        }
        signed
    }

    /// The instant embedded in this token, at 100ns precision.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let unix_ticks = self.ticks() as i64 - GREGORIAN_OFFSET;
        let secs = unix_ticks.div_euclid(TICKS_PER_SECOND);
        let nanos = (unix_ticks.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
        DateTime::from_timestamp(secs, nanos).unwrap_or_default()
    }
}

impl Ord for TimeUuid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ticks()
            .cmp(&other.ticks())
            .then_with(|| self.clock_and_node().cmp(&other.clock_and_node()))
    }
}

impl PartialOrd for TimeUuid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<Uuid> for TimeUuid {
    type Error = String;

    fn try_from(uuid: Uuid) -> Result<Self, Self::Error> {
        match uuid.get_version_num() {
            1 => Ok(Self(uuid)),
            v => Err(format!("expected a version-1 UUID, got version {} ({})", v, uuid)),
        }
    }
}

impl From<TimeUuid> for Uuid {
    fn from(token: TimeUuid) -> Self {
        token.0
    }
}

impl FromStr for TimeUuid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::parse_str(s.trim()).map_err(|e| format!("invalid UUID '{}': {}", s, e))?;
        Self::try_from(uuid)
    }
}

impl fmt::Display for TimeUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
