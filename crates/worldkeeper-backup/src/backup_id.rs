//! Timestamped backup identifiers.
//!
//! A backup ID is the decimal form of a Windows FILETIME: the number of
//! 100-nanosecond ticks since 1601-01-01 UTC. IDs are filesystem-safe, sort
//! the same way numerically and by creation time, and never repeat within
//! a process.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// FILETIME ticks per second
const TICKS_PER_SECOND: i128 = 10_000_000;

/// Nanoseconds per FILETIME tick
const NANOS_PER_TICK: i128 = 100;

/// FILETIME value of 1970-01-01T00:00:00Z
const UNIX_EPOCH_TICKS: i128 = 116_444_736_000_000_000;

/// Decimal width of every ID from 1970 until the year 4769
const ID_DIGITS: usize = 18;

/// Last ID handed out by [`BackupId::generate`]
static LAST_ISSUED: AtomicU64 = AtomicU64::new(0);

/// Identifier of one backup unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BackupId(u64);

impl BackupId {
    /// Issues a new ID from the current time.
    ///
    /// If the clock has not moved past the previously issued ID (coarse
    /// clock, or the clock stepped backwards), the previous ID plus one is
    /// used instead.
    pub fn generate() -> Self {
        Self::issue_after(Self::from_datetime(Utc::now()).0)
    }

    fn issue_after(candidate: u64) -> Self {
        let mut last = LAST_ISSUED.load(Ordering::SeqCst);
        loop {
            let next = if candidate > last { candidate } else { last + 1 };
            match LAST_ISSUED.compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return Self(next),
                Err(actual) => last = actual,
            }
        }
    }

    /// ID for a given instant. Does not participate in uniqueness tracking.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        let ticks = UNIX_EPOCH_TICKS
            + i128::from(at.timestamp()) * TICKS_PER_SECOND
            + i128::from(at.timestamp_subsec_nanos()) / NANOS_PER_TICK;
        Self(ticks.clamp(0, i128::from(u64::MAX)) as u64)
    }

    /// Wraps a raw FILETIME value
    pub fn from_ticks(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Raw FILETIME value
    pub fn ticks(&self) -> u64 {
        self.0
    }

    /// Parses a directory or archive stem back into an ID.
    ///
    /// Only 18-digit names at or after the Unix epoch are accepted; anything
    /// else (`2024/`, `001/`) is not a backup produced by this engine.
    pub fn parse(name: &str) -> Option<Self> {
        if name.len() != ID_DIGITS || !name.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let ticks: u64 = name.parse().ok()?;
        (i128::from(ticks) >= UNIX_EPOCH_TICKS).then_some(Self(ticks))
    }

    /// Creation time encoded in the ID
    pub fn created_at(&self) -> DateTime<Utc> {
        let since_epoch = i128::from(self.0) - UNIX_EPOCH_TICKS;
        let secs = since_epoch.div_euclid(TICKS_PER_SECOND);
        let nanos = since_epoch.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK;
        DateTime::from_timestamp(secs as i64, nanos as u32).unwrap_or_default()
    }
}

impl fmt::Display for BackupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
