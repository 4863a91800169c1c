//! Countdown timer that drives periodic behaviours from the tick loop.

use std::time::Duration;

/// Periodic countdown advanced once per tick.
///
/// Replaces engine-hosted coroutines ("wait N seconds, then loop"): each
/// behaviour owns a `Cadence` and asks it, every tick, whether its period has
/// elapsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cadence {
    period: Duration,
    remaining: Duration,
}

impl Cadence {
    /// Creates a cadence that is due on the very first poll.
    #[must_use]
    pub const fn immediate(period: Duration) -> Self {
        Self {
            period,
            remaining: Duration::ZERO,
        }
    }

    /// Creates a cadence that first becomes due after a full period.
    #[must_use]
    pub const fn delayed(period: Duration) -> Self {
        Self {
            period,
            remaining: period,
        }
    }

    /// Interval between firings.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Time left until the cadence becomes due.
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Reports whether the countdown has elapsed.
    #[must_use]
    pub const fn is_due(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Counts the provided time off the countdown without rearming it.
    pub fn advance(&mut self, dt: Duration) {
        self.remaining = self.remaining.saturating_sub(dt);
    }

    /// Restarts the countdown from a full period.
    pub fn rearm(&mut self) {
        self.remaining = self.period;
    }

    /// Restarts the countdown from an explicit delay.
    pub fn rearm_after(&mut self, delay: Duration) {
        self.remaining = delay;
    }

    /// Advances the countdown and, when due, rearms it and returns `true`.
    ///
    /// Several periods elapsing inside one tick still fire only once.
    pub fn poll(&mut self, dt: Duration) -> bool {
        self.advance(dt);
        if self.is_due() {
            self.rearm();
            true
        } else {
            false
        }
    }
}
