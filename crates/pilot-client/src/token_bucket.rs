//! Rate limiter for outbound aircraft-config broadcasts (component E).
//!
//! Pure and clock-injected so the "never more than 10 per 50s" property
//! is testable without sleeping.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct TokenBucket {
    tokens: u32,
    max_tokens: u32,
    refill_interval: Duration,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(max_tokens: u32, refill_interval: Duration, now: Instant) -> Self {
        TokenBucket {
            tokens: max_tokens,
            max_tokens,
            refill_interval,
            last_refill: now,
        }
    }

    /// The config-broadcast bucket: 10 tokens, refilled one every 5s.
    pub fn config_broadcast(now: Instant) -> Self {
        TokenBucket::new(10, Duration::from_secs(5), now)
    }

    fn refill(&mut self, now: Instant) {
        if now <= self.last_refill {
            return;
        }
        let elapsed = now.duration_since(self.last_refill);
        let ticks = (elapsed.as_secs_f64() / self.refill_interval.as_secs_f64()).floor() as u32;
        if ticks > 0 {
            self.tokens = (self.tokens + ticks).min(self.max_tokens);
            self.last_refill += self.refill_interval * ticks;
        }
    }

    /// Attempt to consume one token. Returns whether a broadcast may
    /// proceed.
    pub fn try_consume(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_exceeds_ten_per_fifty_seconds() {
        let start = Instant::now();
        let mut bucket = TokenBucket::config_broadcast(start);
        let mut granted = 0;
        // Hammer the bucket every 100ms for 50 seconds of simulated time.
        for tick in 0..500 {
            let now = start + Duration::from_millis(tick * 100);
            if bucket.try_consume(now) {
                granted += 1;
            }
        }
        assert!(granted <= 10, "granted {granted} tokens in 50s, bucket should cap at 10");
    }

    #[test]
    fn refills_over_time() {
        let start = Instant::now();
        let mut bucket = TokenBucket::config_broadcast(start);
        for _ in 0..10 {
            assert!(bucket.try_consume(start));
        }
        assert!(!bucket.try_consume(start));
        let later = start + Duration::from_secs(5);
        assert!(bucket.try_consume(later));
    }
}
