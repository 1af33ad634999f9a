pub mod client;
pub mod error;
pub mod rate_limiter;
pub mod supabase;

pub use client::{Identity, ProfileStore, TradeOrder, TradeQuery, TradeStore};
pub use error::ApiError;
pub use rate_limiter::RateLimiter;
