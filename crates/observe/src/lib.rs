//! Logging setup shared by the deployer binary and its tests: subscriber
//! initialization and a panic hook that reports through `tracing`.
pub mod config;
pub mod panic_hook;
pub mod tracing;

pub use config::Config;
