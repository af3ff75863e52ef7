use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Capped exponential reconnect delay.
///
/// `delay(n) = min(max, base * 2^min(n, attempt_cap))`, where `n` is the number
/// of consecutive failures seen before the one being scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
    pub attempt_cap: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration, attempt_cap: u32) -> Self {
        Self {
            base,
            max,
            attempt_cap,
        }
    }

    pub fn delay(&self, attempts: u32) -> Duration {
        let exponent = attempts.min(self.attempt_cap);
        let max_nanos = self.max.as_nanos();
        // Exact in u128 nanoseconds; anything that overflows is past `max`
        let nanos = 1u128
            .checked_shl(exponent)
            .and_then(|factor| self.base.as_nanos().checked_mul(factor))
            .map_or(max_nanos, |nanos| nanos.min(max_nanos));
        let nanos = if self.base.is_zero() { 0 } else { nanos };
        Duration::new(
            (nanos / NANOS_PER_SEC) as u64,
            (nanos % NANOS_PER_SEC) as u32,
        )
    }
}
