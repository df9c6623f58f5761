//! HTTP surface for the dashboard and ad-hoc callers.

pub mod handlers;
pub mod server;
pub mod types;

pub use server::RiskServer;
