// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod charting;
pub mod conditions;
pub mod config;
pub mod experiment;
pub mod regression;
pub mod results;
pub mod runtime;
pub mod scores;
pub mod session;
pub mod util;

/// Tick interval for the event loop; also paces the reaction-test arm check.
pub const TICK_RATE_MS: u64 = 50;
