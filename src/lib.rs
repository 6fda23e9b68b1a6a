//! Transfer statistics for an instrumented HTTP client.
//!
//! Every request/response pair sent through [`InstrumentedClient`] can be
//! measured (header bytes, body bytes, time from response headers to the
//! end of the body) and written as one `key=value` line to a transfer log.
//! The log is off until a sink is installed with
//! [`InstrumentedClient::log_http_stats`].

pub mod config;
pub mod http;
pub mod observability;
pub mod stats;

pub use config::ClientConfig;
pub use crate::http::{ClientError, CountingBody, InstrumentedClient};
pub use stats::{tag_request, LineSink, TransferCorrelator};
