//! Transfer correlation table.
//!
//! # Responsibilities
//! - Assign each instrumented response a [`TransferId`]
//! - Open a transfer when response headers arrive
//! - Close it once the body has been consumed, then emit its line
//!
//! # Design Decisions
//! - One mutex guards the table; it covers only insert/remove and is never
//!   held across a body read or a sink write
//! - The table is created on first use
//! - Closing an unknown or already-closed transfer is silent

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use http::Response;
use hyper::ext::ReasonPhrase;

use crate::observability::metrics;
use crate::stats::emitter::emit;
use crate::stats::head::response_head_len;
use crate::stats::logger::StatsLogger;
use crate::stats::record::{StatsRecord, Transfer, UNTAGGED_KEY};
use crate::stats::tag::RequestSnapshot;

/// Identity of an instrumented response, stored in its extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferId(u64);

impl TransferId {
    pub fn get(self) -> u64 {
        self.0
    }
}

type TransferTable = Option<HashMap<TransferId, Transfer>>;

/// Links in-flight responses to the stats captured for them.
#[derive(Debug)]
pub struct TransferCorrelator {
    logger: StatsLogger,
    transfers: Mutex<TransferTable>,
    next_id: AtomicU64,
}

impl TransferCorrelator {
    pub fn new(logger: StatsLogger) -> Self {
        Self {
            logger,
            transfers: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn logger(&self) -> &StatsLogger {
        &self.logger
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.logger.is_enabled()
    }

    /// Give `response` a fresh identity and attach its request snapshot.
    pub fn track<B>(&self, response: &mut Response<B>, snapshot: RequestSnapshot) -> TransferId {
        let id = TransferId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let extensions = response.extensions_mut();
        extensions.insert(id);
        extensions.insert(snapshot);
        id
    }

    /// Start tracking `response`, whose headers were observed at `observed_at`.
    pub fn open_transfer<B>(&self, response: &Response<B>, observed_at: Instant) {
        if !self.is_enabled() {
            return;
        }

        let Some(id) = response.extensions().get::<TransferId>().copied() else {
            tracing::debug!("Response has no transfer id; not tracked");
            return;
        };

        let snapshot = response.extensions().get::<RequestSnapshot>();
        let reason = response.extensions().get::<ReasonPhrase>().map(ReasonPhrase::as_bytes);
        let header_size = response_head_len(
            response.status(),
            reason,
            response.version(),
            response.headers(),
        )
        .unwrap_or_else(|e| {
            tracing::debug!(transfer_id = id.0, error = %e, "Response head not measurable");
            0
        });

        let transfer = Transfer {
            key: snapshot.map_or(UNTAGGED_KEY, |s| s.key()).to_string(),
            request: snapshot.map(RequestSnapshot::record).unwrap_or_default(),
            response: StatsRecord::response(header_size, observed_at),
            status: response.status(),
            url: snapshot.map(|s| s.url.clone()).unwrap_or_default(),
        };

        let reopened = {
            let mut guard = self.lock();
            let table = guard.get_or_insert_with(HashMap::new);
            table.insert(id, transfer).is_some()
        };

        if reopened {
            tracing::debug!(transfer_id = id.0, "Transfer reopened; previous record dropped");
            return;
        }
        tracing::trace!(transfer_id = id.0, "Transfer opened");
        metrics::record_transfer_opened();
    }

    /// Finish tracking `response` with the counted body size.
    ///
    /// Does nothing for `None`, for responses that were never opened, and
    /// for responses that were already closed.
    pub fn close_transfer<B>(&self, response: Option<&Response<B>>, body_size: u64) {
        let Some(id) = response.and_then(|r| r.extensions().get::<TransferId>().copied()) else {
            return;
        };
        self.close_by_id(id, body_size);
    }

    /// Finish tracking the transfer `id` with the counted body size.
    pub fn close_by_id(&self, id: TransferId, body_size: u64) {
        if !self.is_enabled() {
            return;
        }

        let transfer = {
            let mut guard = self.lock();
            let Some(table) = guard.as_mut() else {
                return;
            };
            let Some(mut transfer) = table.remove(&id) else {
                return;
            };
            transfer.response.finish(body_size, Instant::now());
            transfer
        };
        debug_assert!(transfer.response.is_complete());

        if let Some(sink) = self.logger.sink() {
            emit(sink.as_ref(), &transfer);
        }

        tracing::trace!(
            transfer_id = id.0,
            key = %transfer.key,
            body_size,
            "Transfer closed"
        );
        metrics::record_transfer_closed(
            transfer.status.as_u16(),
            body_size,
            transfer.response.elapsed(),
        );
    }

    /// Number of transfers currently open.
    pub fn live_transfers(&self) -> usize {
        self.lock().as_ref().map_or(0, HashMap::len)
    }

    fn lock(&self) -> MutexGuard<'_, TransferTable> {
        self.transfers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
