//! HTTP surface of the EPG cache.

pub mod api;
pub mod metrics;
pub mod state;
