//! Decorrelated-jitter backoff.
//!
//! Each delay is drawn from a range derived from the previous one:
//! `sleep = min(max, random_between(base, previous * 3))`.

use rand::Rng;

/// Backoff bounds in milliseconds.
///
/// `base_ms` is at least 1 and `max_ms` is never below `base_ms`;
/// [`Backoff::new`] normalizes inputs to keep that true.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_ms: 100,
            max_ms: 5_000,
        }
    }
}

impl Backoff {
    /// Creates backoff bounds. A zero base becomes 1, a ceiling below the
    /// base is raised to the base.
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        let base_ms = base_ms.max(1);
        Self {
            base_ms,
            max_ms: max_ms.max(base_ms),
        }
    }

    /// Lower bound of every delay.
    pub fn base_ms(&self) -> u64 {
        self.base_ms
    }

    /// Upper bound of every delay.
    pub fn max_ms(&self) -> u64 {
        self.max_ms
    }

    /// Next delay in milliseconds given the previous one, using the
    /// thread-local RNG. `previous_ms == 0` means no prior attempt.
    pub fn next(&self, previous_ms: u64) -> u64 {
        self.next_with(&mut rand::thread_rng(), previous_ms)
    }

    /// Same as [`Backoff::next`] with a caller-supplied random source.
    pub fn next_with<R: Rng + ?Sized>(&self, rng: &mut R, previous_ms: u64) -> u64 {
        let spread = previous_ms
            .saturating_mul(3)
            .saturating_sub(self.base_ms)
            .max(1);
        let sleep = rng.gen_range(0..spread).saturating_add(self.base_ms);
        sleep.min(self.max_ms)
    }
}
