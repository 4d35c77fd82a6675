//! Time sources for the simulated link.
//!
//! The pacing engine never reads a global clock. It is handed a [`Clock`]
//! at construction, which makes paced behavior fully deterministic under
//! test: drive a [`ManualClock`] forward by exact microsecond amounts
//! instead of sleeping.
//!
//! # Timestamps
//!
//! [`Micros`] is a microsecond counter that wraps at `u64::MAX`. Elapsed
//! time is always computed with wrapping (unsigned) subtraction, so a time
//! source whose counter has wrapped still yields the correct interval.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A microsecond timestamp from some [`Clock`].
///
/// Timestamps are points on a wrapping counter, not durations; the only
/// meaningful arithmetic is [`wrapping_since`](Micros::wrapping_since)
/// against an earlier stamp from the same clock, and
/// [`wrapping_add`](Micros::wrapping_add) to move a stamp forward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Micros(u64);

impl Micros {
    /// Zero timestamp (a clock's epoch).
    pub const ZERO: Self = Self(0);

    /// Create from a raw microsecond count.
    #[inline]
    pub const fn from_micros(us: u64) -> Self {
        Self(us)
    }

    /// Create from milliseconds.
    #[inline]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms.saturating_mul(1_000))
    }

    /// Create from seconds.
    #[inline]
    pub const fn from_secs(s: u64) -> Self {
        Self(s.saturating_mul(1_000_000))
    }

    /// Raw microsecond count.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Microseconds elapsed since `earlier`, correct across counter wrap.
    #[inline]
    pub const fn wrapping_since(self, earlier: Micros) -> u64 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Advance this stamp by `us` microseconds, wrapping at `u64::MAX`.
    #[inline]
    pub const fn wrapping_add(self, us: u64) -> Self {
        Self(self.0.wrapping_add(us))
    }
}

impl std::fmt::Display for Micros {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}us", self.0)
    }
}

/// A source of current time for the pacing engine.
///
/// Implementations should be monotonic within a run. The stream reads the
/// clock once per release evaluation.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> Micros;

    /// Human-readable name, for reports.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Monotonic system clock.
///
/// Backed by `std::time::Instant`; time is microseconds since the clock was
/// created.
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    /// Create a clock with the current instant as epoch.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Micros {
        Micros::from_micros(self.epoch.elapsed().as_micros() as u64)
    }

    fn name(&self) -> &str {
        "system-monotonic"
    }
}

/// A clock that only moves when told to.
///
/// Intended for tests and deterministic demos: share one instance (via
/// `Arc`) between the test and the stream, then [`advance`](ManualClock::advance)
/// by exact amounts instead of sleeping.
pub struct ManualClock {
    now_us: AtomicU64,
}

impl ManualClock {
    /// Create a manual clock starting at zero.
    pub fn new() -> Self {
        Self {
            now_us: AtomicU64::new(0),
        }
    }

    /// Create a manual clock starting at the given time.
    ///
    /// Useful for exercising counter-wrap behavior by starting near
    /// `u64::MAX`.
    pub fn starting_at(start: Micros) -> Self {
        Self {
            now_us: AtomicU64::new(start.as_u64()),
        }
    }

    /// Set the current time.
    pub fn set(&self, now: Micros) {
        self.now_us.store(now.as_u64(), Ordering::Release);
    }

    /// Move the clock forward by `us` microseconds (wrapping).
    pub fn advance(&self, us: u64) {
        // fetch_add wraps on overflow, matching the timestamp model
        self.now_us.fetch_add(us, Ordering::AcqRel);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Micros {
        Micros::from_micros(self.now_us.load(Ordering::Acquire))
    }

    fn name(&self) -> &str {
        "manual"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_micros_constructors() {
        assert_eq!(Micros::from_micros(1_500).as_u64(), 1_500);
        assert_eq!(Micros::from_millis(2).as_u64(), 2_000);
        assert_eq!(Micros::from_secs(3).as_u64(), 3_000_000);
    }

    #[test]
    fn test_wrapping_since() {
        let t1 = Micros::from_micros(100);
        let t2 = Micros::from_micros(350);
        assert_eq!(t2.wrapping_since(t1), 250);
    }

    #[test]
    fn test_wrapping_since_across_wrap() {
        let before = Micros::from_micros(u64::MAX - 9);
        let after = before.wrapping_add(30);
        assert_eq!(after.as_u64(), 20);
        assert_eq!(after.wrapping_since(before), 30);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Micros::ZERO);

        clock.advance(250);
        assert_eq!(clock.now().as_u64(), 250);

        clock.set(Micros::from_millis(1));
        assert_eq!(clock.now().as_u64(), 1_000);
    }

    #[test]
    fn test_manual_clock_wraps() {
        let clock = ManualClock::starting_at(Micros::from_micros(u64::MAX - 1));
        clock.advance(3);
        assert_eq!(clock.now().as_u64(), 1);
    }

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let t1 = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let t2 = clock.now();
        assert!(t2 > t1);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Micros::from_micros(42)), "42us");
    }
}
