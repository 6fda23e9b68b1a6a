//! Transfer log line formatting and emission.
//!
//! # Line formats
//! ```text
//! concurrent=<int> time=<unix-seconds> version=<string>
//! key=<string> reqheader=<int> reqbody=<int> resheader=<int> resbody=<int> restime=<ns> status=<int> url=<string>
//! ```
//!
//! Field order is fixed; log parsers depend on it.
//!
//! # Design Decisions
//! - A line is formatted completely in memory and handed to the sink in one
//!   call, so a sink that writes each call atomically never interleaves lines
//! - Write failures stay here: they are traced and dropped

use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::Mutex;

use crate::stats::record::Transfer;

/// Destination for transfer log lines.
///
/// Implementations must write each `line` as a unit: two concurrent calls
/// must never produce interleaved bytes.
pub trait LineSink: Send + Sync {
    fn write_line(&self, line: &[u8]) -> io::Result<()>;
}

impl<W: Write + Send> LineSink for Mutex<W> {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let mut out = self
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "sink mutex poisoned"))?;
        out.write_all(line)?;
        out.flush()
    }
}

/// Format the preamble written when the log is enabled.
pub fn preamble_line(concurrent: usize, unix_secs: u64, version: &str) -> String {
    format!("concurrent={} time={} version={}\n", concurrent, unix_secs, version)
}

/// Format the line for a completed transfer.
pub fn transfer_line(transfer: &Transfer) -> String {
    let mut line = String::with_capacity(128 + transfer.key.len() + transfer.url.len());
    // Writing into a String cannot fail.
    let _ = writeln!(
        line,
        "key={} reqheader={} reqbody={} resheader={} resbody={} restime={} status={} url={}",
        transfer.key,
        transfer.request.header_size,
        transfer.request.body_size_field(),
        transfer.response.header_size,
        transfer.response.body_size_field(),
        transfer.response_nanos(),
        transfer.status.as_u16(),
        transfer.url,
    );
    line
}

/// Write one line for `transfer` to `sink`.
pub fn emit(sink: &dyn LineSink, transfer: &Transfer) {
    write_or_trace(sink, transfer_line(transfer).as_bytes());
}

/// Hand a formatted line to `sink`, tracing and dropping any failure.
pub(crate) fn write_or_trace(sink: &dyn LineSink, line: &[u8]) {
    if let Err(e) = sink.write_line(line) {
        tracing::debug!(error = %e, "Transfer log write failed");
    }
}
