pub mod admin;
pub mod auth;
pub mod companies;
pub mod health;
pub mod indicators;
pub mod scores;
pub mod telemetry;
