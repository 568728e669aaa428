//! Rate limiting services for the application layer.

pub mod rate_limiter;
pub mod sliding_window;

pub use rate_limiter::{Admission, FailMode, Inspection, RateLimiter};
pub use sliding_window::{SlidingWindowCounter, WindowEstimate};
