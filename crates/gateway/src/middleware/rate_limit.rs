//! Rate limiting middleware using token bucket algorithm

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use docqa_common::errors::{AppError, Result};
use governor::{
    clock::QuantaClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter using governor crate
pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

/// Shared limiter plus the configured rate for error reporting
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<GlobalRateLimiter>,
    requests_per_second: u32,
}

impl RateLimit {
    /// Create a new rate limiter; zero rates are rejected
    pub fn new(requests_per_second: u32, burst: u32) -> Result<Self> {
        let rate = NonZeroU32::new(requests_per_second).ok_or_else(|| {
            AppError::invalid_configuration("rate_limit.requests_per_second must be positive")
        })?;
        let burst = NonZeroU32::new(burst)
            .ok_or_else(|| AppError::invalid_configuration("rate_limit.burst must be positive"))?;

        Ok(Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(rate).allow_burst(burst))),
            requests_per_second,
        })
    }

    pub fn check(&self) -> Result<()> {
        self.limiter.check().map_err(|_| AppError::RateLimited {
            limit: self.requests_per_second,
        })
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(limit): State<RateLimit>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, AppError> {
    if let Err(e) = limit.check() {
        tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
        return Err(e);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limit = RateLimit::new(100, 200).unwrap();
        assert!(limit.check().is_ok());
    }

    #[test]
    fn test_burst_exhaustion() {
        let limit = RateLimit::new(1, 2).unwrap();
        assert!(limit.check().is_ok());
        assert!(limit.check().is_ok());
        assert!(matches!(limit.check(), Err(AppError::RateLimited { limit: 1 })));
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(matches!(
            RateLimit::new(0, 10),
            Err(AppError::InvalidConfiguration { .. })
        ));
        assert!(RateLimit::new(10, 0).is_err());
    }
}
