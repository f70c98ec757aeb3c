pub mod health;
pub mod metrics;
pub mod server;

pub use health::HealthChecker;
pub use metrics::{DocumentTracker, MetricsCollector};
pub use server::MonitorState;
