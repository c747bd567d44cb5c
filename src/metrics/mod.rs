//! Metrics export module.
//!
//! Batch totals can be pushed to a Prometheus Push Gateway once a run has
//! finished.
//!
//! # Submodules
//!
//! - `prom` - Prometheus metrics integration

pub mod prom;
