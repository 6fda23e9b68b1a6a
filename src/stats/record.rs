//! Per-side transfer measurements.
//!
//! # Responsibilities
//! - Hold header/body byte counts for one side of a transfer
//! - Hold start/stop instants for the response side
//! - Render sizes the way the transfer log expects (`-1` for unknown)

use std::time::{Duration, Instant};

use http::StatusCode;

/// Sentinel key written when a request was never tagged.
pub const UNTAGGED_KEY: &str = "none";

/// Measurements for one side (request or response) of a transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsRecord {
    /// Byte length of the header-only serialization.
    pub header_size: usize,
    /// Body byte count, `None` until known.
    pub body_size: Option<u64>,
    pub start: Option<Instant>,
    pub stop: Option<Instant>,
}

impl StatsRecord {
    /// Request-side record: header size plus the declared body length.
    pub fn request(header_size: usize, declared_length: Option<u64>) -> Self {
        Self {
            header_size,
            body_size: declared_length,
            start: None,
            stop: None,
        }
    }

    /// Response-side record opened when the headers were observed.
    ///
    /// The body size stays unset until [`StatsRecord::finish`]; a declared
    /// `Content-Length` is never used for the response side.
    pub fn response(header_size: usize, observed_at: Instant) -> Self {
        Self {
            header_size,
            body_size: None,
            start: Some(observed_at),
            stop: None,
        }
    }

    /// Record the counted body size and the stop instant.
    pub fn finish(&mut self, body_size: u64, stop: Instant) {
        self.body_size = Some(body_size);
        self.stop = Some(stop);
    }

    /// True once both the body size and the stop instant are set.
    pub fn is_complete(&self) -> bool {
        self.body_size.is_some() && self.stop.is_some()
    }

    /// Body size as written to the log; unknown sizes render as `-1`.
    pub fn body_size_field(&self) -> i64 {
        match self.body_size {
            Some(size) => i64::try_from(size).unwrap_or(i64::MAX),
            None => -1,
        }
    }

    /// Elapsed time between start and stop, zero if either is missing.
    pub fn elapsed(&self) -> Duration {
        match (self.start, self.stop) {
            (Some(start), Some(stop)) => stop.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }
}

/// One request/response exchange under observation.
#[derive(Debug, Clone)]
pub struct Transfer {
    /// Correlation key, [`UNTAGGED_KEY`] when the request was not tagged.
    pub key: String,
    pub request: StatsRecord,
    pub response: StatsRecord,
    /// Status of the response the transfer was opened for.
    pub status: StatusCode,
    /// Full target URL of the originating request.
    pub url: String,
}

impl Transfer {
    /// Response duration in whole nanoseconds.
    pub fn response_nanos(&self) -> u128 {
        self.response.elapsed().as_nanos()
    }
}
