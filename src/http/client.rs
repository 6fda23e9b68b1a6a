//! Instrumented HTTP client.
//!
//! # Responsibilities
//! - Send requests through the pooled hyper-util client
//! - Snapshot each request and open its transfer when headers arrive
//! - Hand back responses whose bodies close the transfer when consumed
//! - Keep the client surface of the transfer log (enable, tag, deprecated
//!   no-ops)
//!
//! # Design Decisions
//! - With the log disabled no snapshot is taken and bodies are not counted
//! - The timeout covers the wait for response headers only; body reads are
//!   paced by the caller

use std::error::Error as StdError;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::header::{HeaderValue, USER_AGENT};
use http::{Request, Response, Uri};
use hyper::body::{Body, Incoming};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::config::HttpClientConfig;
use crate::http::body::CountingBody;
use crate::stats::{tag_request, LineSink, RequestSnapshot, StatsLogger, TransferCorrelator};

/// Errors returned by [`InstrumentedClient::request`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connecting or exchanging headers failed.
    #[error("request to {uri} failed: {source}")]
    Request {
        uri: Uri,
        source: hyper_util::client::legacy::Error,
    },

    /// No response headers arrived within the configured timeout.
    #[error("no response from {uri} within {secs}s")]
    Timeout { uri: Uri, secs: u64 },
}

/// HTTP client whose transfers can be written to a transfer log.
pub struct InstrumentedClient<B> {
    client: Client<HttpConnector, B>,
    stats: Arc<TransferCorrelator>,
    user_agent: Option<HeaderValue>,
    timeout: Duration,
}

impl<B> Clone for InstrumentedClient<B> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            stats: self.stats.clone(),
            user_agent: self.user_agent.clone(),
            timeout: self.timeout,
        }
    }
}

impl<B> InstrumentedClient<B>
where
    B: Body + Send + Unpin + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    /// Create a client from its configuration. The transfer log starts off.
    pub fn new(config: &HttpClientConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(config.concurrent_transfers)
            .build(HttpConnector::new());

        let user_agent = match HeaderValue::from_str(&config.user_agent) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(user_agent = %config.user_agent, error = %e, "Invalid user agent; not sent");
                None
            }
        };

        let logger = StatsLogger::new(config.concurrent_transfers, config.user_agent.clone());

        Self {
            client,
            stats: Arc::new(TransferCorrelator::new(logger)),
            user_agent,
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Send `request` and return the response once its headers arrive.
    ///
    /// When the transfer log is enabled, the returned body closes the
    /// transfer after it has been read to the end or dropped.
    pub async fn request(
        &self,
        mut request: Request<B>,
    ) -> Result<Response<CountingBody<Incoming>>, ClientError> {
        if let Some(ua) = &self.user_agent {
            request.headers_mut().entry(USER_AGENT).or_insert_with(|| ua.clone());
        }

        let snapshot = self
            .stats
            .is_enabled()
            .then(|| RequestSnapshot::capture(&request));
        let uri = request.uri().clone();

        let mut response = match tokio::time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => return Err(ClientError::Request { uri, source }),
            Err(_) => {
                return Err(ClientError::Timeout {
                    uri,
                    secs: self.timeout.as_secs(),
                })
            }
        };
        let observed_at = Instant::now();

        let Some(snapshot) = snapshot else {
            return Ok(response.map(CountingBody::untracked));
        };

        let id = self.stats.track(&mut response, snapshot);
        self.stats.open_transfer(&response, observed_at);
        tracing::debug!(
            transfer_id = id.get(),
            status = %response.status(),
            uri = %uri,
            "Response headers received"
        );

        let stats = self.stats.clone();
        Ok(response.map(|body| CountingBody::tracked(body, stats, id)))
    }
}

impl<B> InstrumentedClient<B> {
    /// Start writing the transfer log to `sink`, beginning with the preamble.
    ///
    /// Call before the first request; transfers already in flight are not
    /// logged. Calling again swaps in the new sink.
    pub fn log_http_stats<S: LineSink + 'static>(&self, sink: Arc<S>) {
        self.stats.logger().enable(sink);
    }

    /// Tag `request` so its transfer line carries `key`.
    pub fn log_request<T>(&self, request: Request<T>, key: impl Into<String>) -> Request<T> {
        tag_request(request, key)
    }

    /// Formerly dumped collected stats after all requests finished.
    #[deprecated(note = "call `log_http_stats` before the first request")]
    pub fn log_stats<W: Write>(&self, _out: W) {}

    /// Formerly logged a single response under `key`.
    #[deprecated(note = "tag requests with `log_request` instead")]
    pub fn log_response<T>(&self, _key: &str, _response: &Response<T>) {}

    pub fn is_logging(&self) -> bool {
        self.stats.is_enabled()
    }

    /// The transfer correlator backing this client.
    pub fn stats(&self) -> &Arc<TransferCorrelator> {
        &self.stats
    }
}
