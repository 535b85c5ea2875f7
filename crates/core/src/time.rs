use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Time source for services, swappable for deterministic tests.
///
/// `Manual` clocks share their instant between clones, so a test can hand a
/// clone to a service and advance it from outside between calls.
#[derive(Debug, Clone, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
    Manual(Arc<AtomicI64>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns a shared, manually advanced clock starting at `at`.
    #[must_use]
    pub fn manual(at: DateTime<Utc>) -> Self {
        Self::Manual(Arc::new(AtomicI64::new(at.timestamp_millis())))
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
            Clock::Manual(millis) => DateTime::<Utc>::from_timestamp_millis(millis.load(Ordering::SeqCst))
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }
    }

    /// Moves a manual clock forward for every clone. No effect otherwise.
    pub fn advance(&self, delta: Duration) {
        if let Clock::Manual(millis) = self {
            millis.fetch_add(delta.num_milliseconds(), Ordering::SeqCst);
        }
    }

    #[must_use]
    pub fn is_system(&self) -> bool {
        matches!(self, Clock::System)
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
