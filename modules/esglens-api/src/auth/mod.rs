pub mod api_key;
pub mod extractor;
pub mod jwt;
pub mod rate_limit;

pub use extractor::{Principal, RequireAuth};
pub use jwt::JwtService;
pub use rate_limit::RateLimiter;
