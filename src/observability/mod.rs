//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! stats/ and http/ produce:
//!     → logging.rs (structured diagnostic events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stderr
//!     → Prometheus text snapshot (CLI `--print-metrics`)
//! ```
//!
//! # Design Decisions
//! - Diagnostic logging is independent of the transfer log
//! - Metrics are cheap (atomic increments, no-ops without a recorder)

pub mod logging;
pub mod metrics;
