use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use std::num::NonZeroU32;
use std::time::Duration;

/// Token bucket in front of every backend request.
pub struct RateLimiter {
    limiter: GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl RateLimiter {
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        let per_second =
            NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::new(1).unwrap());
        let burst = NonZeroU32::new(burst_size).unwrap_or(per_second);

        let quota = Quota::per_second(per_second).allow_burst(burst);

        Self {
            limiter: GovernorRateLimiter::direct(quota),
        }
    }

    /// Wait until a request can be made.
    pub async fn acquire(&self) {
        while self.limiter.check().is_err() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Try to acquire a token without blocking.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}
