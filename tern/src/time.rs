/*! Time structures.

Components of this stack never look at a wall clock. Each one owns an [Instant] that starts at
zero and is only ever advanced by its own `tick` method, with the elapsed time given as a
[Duration].

 - [Instant] is used to represent a point on such a component clock.
 - [Duration] is used to represent relative time.
 - [Expiration] is an optional deadline on that clock.

[Instant]: struct.Instant.html
[Duration]: struct.Duration.html
[Expiration]: enum.Expiration.html
*/
use core::{cmp, fmt, ops};
pub use core::time::Duration;

/// A point in time on a component clock.
///
/// The `Instant` type is a wrapper around a `u64` value that represents a number of microseconds
/// since the component was created. It never decreases.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant {
    micros: u64,
}

/// An expiration time, inversion of `Option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// Expires at the given instant.
    When(Instant),
    /// Never expires.
    Never,
}

use Expiration::{When, Never};

impl Instant {
    /// The start of every component clock.
    pub const ZERO: Instant = Instant { micros: 0 };

    /// Create a new `Instant` from a number of microseconds.
    pub const fn from_micros(micros: u64) -> Instant {
        Instant { micros }
    }

    /// Create a new `Instant` from a number of milliseconds.
    pub const fn from_millis(millis: u64) -> Instant {
        Instant { micros: millis * 1000 }
    }

    /// Create a new `Instant` from a number of seconds.
    pub const fn from_secs(secs: u64) -> Instant {
        Instant { micros: secs * 1_000_000 }
    }

    /// The fractional number of milliseconds that have passed
    /// since the beginning of time.
    pub fn millis(&self) -> u64 {
        self.total_millis() % 1000
    }

    /// The number of whole seconds that have passed since the
    /// beginning of time.
    pub fn secs(&self) -> u64 {
        self.micros / 1_000_000
    }

    /// The total number of whole milliseconds that have passed since
    /// the beginning of time.
    pub fn total_millis(&self) -> u64 {
        self.micros / 1000
    }

    /// The total number of microseconds that have passed since
    /// the beginning of time.
    pub fn total_micros(&self) -> u64 {
        self.micros
    }

    /// The time passed since an earlier instant.
    ///
    /// Saturates to zero if `earlier` is actually later than `self`.
    pub fn duration_since(&self, earlier: Instant) -> Duration {
        Duration::from_micros(self.micros.saturating_sub(earlier.micros))
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{:03}s", self.secs(), self.millis())
    }
}

impl ops::Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        Instant::from_micros(self.micros + rhs.as_micros() as u64)
    }
}

impl ops::AddAssign<Duration> for Instant {
    fn add_assign(&mut self, rhs: Duration) {
        self.micros += rhs.as_micros() as u64;
    }
}

impl ops::Sub<Instant> for Instant {
    type Output = Duration;

    fn sub(self, rhs: Instant) -> Duration {
        self.duration_since(rhs)
    }
}

impl Expiration {
    /// Query whether the deadline lies strictly before `now`.
    pub fn has_passed(&self, now: Instant) -> bool {
        When(now) > *self
    }
}

impl Default for Expiration {
    fn default() -> Self {
        Expiration::Never
    }
}

impl From<Option<Instant>> for Expiration {
    fn from(opt: Option<Instant>) -> Self {
        match opt {
            Some(instant) => When(instant),
            None => Never,
        }
    }
}

impl From<Expiration> for Option<Instant> {
    fn from(opt: Expiration) -> Self {
        match opt {
            When(instant) => Some(instant),
            Never => None,
        }
    }
}

impl cmp::PartialOrd<Self> for Expiration {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl cmp::Ord for Expiration {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        match (*self, *other) {
            (Never, Never) => cmp::Ordering::Equal,
            (Never, When(_)) => cmp::Ordering::Greater,
            (When(_), Never) => cmp::Ordering::Less,
            (When(ref a), When(ref b)) => a.cmp(b),
        }
    }
}
