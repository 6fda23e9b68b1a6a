//! Request tagging.
//!
//! # Responsibilities
//! - Attach an opaque correlation key to an outbound request
//! - Read the key back, tolerating untagged requests
//! - Snapshot the request metadata a transfer line needs, so it can travel
//!   with the response after the request itself has been consumed
//!
//! # Design Decisions
//! - The key lives in the request's typed extensions under a crate-private
//!   newtype, so no other extension can collide with it
//! - Keys are not validated; attribution quality is up to the caller

use std::sync::Arc;

use http::header::CONTENT_LENGTH;
use http::Request;
use hyper::body::Body;

use crate::stats::head::request_head_len;
use crate::stats::record::{StatsRecord, UNTAGGED_KEY};

/// Extension slot holding the correlation key.
#[derive(Debug, Clone)]
struct TransferKey(Arc<str>);

/// Return `request` tagged with `key`.
///
/// The request is consumed and handed back with the tag set; a previous tag
/// is replaced.
pub fn tag_request<B>(mut request: Request<B>, key: impl Into<String>) -> Request<B> {
    let key: String = key.into();
    request.extensions_mut().insert(TransferKey(Arc::from(key)));
    request
}

/// Correlation key carried by `request`, [`UNTAGGED_KEY`] when absent.
pub fn request_key<B>(request: &Request<B>) -> &str {
    request
        .extensions()
        .get::<TransferKey>()
        .map(|k| &*k.0)
        .unwrap_or(UNTAGGED_KEY)
}

/// Request metadata captured right before the request is sent.
///
/// Attached to the response's extensions by the instrumented client so the
/// correlator can find the originating request from the response alone.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    pub key: Option<Arc<str>>,
    pub url: String,
    pub header_size: usize,
    pub declared_length: Option<u64>,
}

impl RequestSnapshot {
    /// Capture the snapshot for `request`.
    ///
    /// A head that cannot be measured counts as zero header bytes. The
    /// declared length comes from `Content-Length`, falling back to an exact
    /// body size hint; otherwise it is unknown.
    pub fn capture<B: Body>(request: &Request<B>) -> Self {
        let header_size = request_head_len(
            request.method(),
            request.uri(),
            request.version(),
            request.headers(),
        )
        .unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Request head not measurable");
            0
        });

        let declared_length = request
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .or_else(|| request.body().size_hint().exact());

        Self {
            key: request.extensions().get::<TransferKey>().map(|k| k.0.clone()),
            url: request.uri().to_string(),
            header_size,
            declared_length,
        }
    }

    /// Key for the transfer line.
    pub fn key(&self) -> &str {
        self.key.as_deref().unwrap_or(UNTAGGED_KEY)
    }

    /// Request-side record.
    pub fn record(&self) -> StatsRecord {
        StatsRecord::request(self.header_size, self.declared_length)
    }
}
