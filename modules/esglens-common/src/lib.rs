pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use error::{ErrorKind, EsgError};
pub use retry::{with_retry, RetryPolicy};
pub use types::*;
