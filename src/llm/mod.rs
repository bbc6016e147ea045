// The external text-generation capability and the policies wrapped around it.

pub mod prompts;
pub mod rate_limiter;
pub mod traits;

pub use rate_limiter::{RateLimiter, Throttled};
pub use traits::TextGenerator;
