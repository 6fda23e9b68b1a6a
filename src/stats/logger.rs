//! Transfer log enable switch.
//!
//! # Responsibilities
//! - Hold the (optional) sink for transfer lines
//! - Write the preamble when a sink is installed
//! - Answer "is logging on?" with a single atomic pointer load
//!
//! # Design Decisions
//! - Constructed disabled; `enable` may be called again to swap sinks
//! - The caller keeps ownership of the sink through its own `Arc`; the logger
//!   never closes it

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwapOption;

use crate::stats::emitter::{preamble_line, write_or_trace, LineSink};

/// Installed sink. Wrapped because `ArcSwapOption` needs a sized payload.
struct SinkSlot(Arc<dyn LineSink>);

/// Enable switch and sink holder for the transfer log.
pub struct StatsLogger {
    sink: ArcSwapOption<SinkSlot>,
    concurrent_transfers: usize,
    version: String,
}

impl StatsLogger {
    /// Create a disabled logger.
    ///
    /// `concurrent_transfers` and `version` are reported in the preamble.
    pub fn new(concurrent_transfers: usize, version: impl Into<String>) -> Self {
        Self {
            sink: ArcSwapOption::empty(),
            concurrent_transfers,
            version: version.into(),
        }
    }

    /// Install `sink` and write the preamble to it.
    ///
    /// A second call replaces the previous sink without error.
    pub fn enable<S: LineSink + 'static>(&self, sink: Arc<S>) {
        let unix_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let preamble = preamble_line(self.concurrent_transfers, unix_secs, &self.version);
        write_or_trace(sink.as_ref(), preamble.as_bytes());

        let replaced = self.sink.swap(Some(Arc::new(SinkSlot(sink))));
        tracing::debug!(
            concurrent = self.concurrent_transfers,
            replaced = replaced.is_some(),
            "Transfer log enabled"
        );
    }

    /// True iff a sink is installed.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.sink.load().is_some()
    }

    /// Current sink, if logging is enabled.
    pub fn sink(&self) -> Option<Arc<dyn LineSink>> {
        self.sink.load_full().map(|slot| slot.0.clone())
    }

    pub fn concurrent_transfers(&self) -> usize {
        self.concurrent_transfers
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl std::fmt::Debug for StatsLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsLogger")
            .field("enabled", &self.is_enabled())
            .field("concurrent_transfers", &self.concurrent_transfers)
            .field("version", &self.version)
            .finish()
    }
}
