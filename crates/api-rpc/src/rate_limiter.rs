//! Token-bucket rate limiter for the mutating RPC methods.
//!
//! Lock-free: the token count and the last-refill timestamp share one
//! AtomicU64, updated with a CAS loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Token bucket. Upper 32 bits of `packed` hold the token count, lower 32
/// bits the refill timestamp in milliseconds since `created`.
pub struct RateLimiter {
    packed: AtomicU64,
    created: Instant,
    max_tokens: u32,
    refill_rate: u32,
}

impl RateLimiter {
    /// `max_tokens` is the burst size, `refill_rate` is tokens per second.
    pub fn new(max_tokens: u32, refill_rate: u32) -> Self {
        Self {
            packed: AtomicU64::new((max_tokens as u64) << 32),
            created: Instant::now(),
            max_tokens,
            refill_rate,
        }
    }

    /// Try to consume one token. Returns false when the bucket is empty.
    pub fn check(&self) -> bool {
        loop {
            let packed = self.packed.load(Ordering::Acquire);
            let tokens = (packed >> 32) as u32;
            let last_refill_ms = (packed & 0xFFFF_FFFF) as u32;

            let elapsed_ms = self.created.elapsed().as_millis() as u32;
            let delta_ms = elapsed_ms.saturating_sub(last_refill_ms);

            let refilled = (delta_ms as u64 * self.refill_rate as u64) / 1000;
            let available =
                ((tokens as u64 + refilled).min(self.max_tokens as u64)) as u32;

            if available >= 1 {
                let new_packed = (((available - 1) as u64) << 32) | (elapsed_ms as u64);
                match self.packed.compare_exchange(
                    packed,
                    new_packed,
                    Ordering::Release,
                    Ordering::Acquire,
                ) {
                    Ok(_) => return true,
                    Err(_) => continue,
                }
            } else {
                // Out of tokens; still advance the timestamp
                let new_packed = ((available as u64) << 32) | (elapsed_ms as u64);
                let _ = self.packed.compare_exchange(
                    packed,
                    new_packed,
                    Ordering::Release,
                    Ordering::Acquire,
                );
                return false;
            }
        }
    }
}
