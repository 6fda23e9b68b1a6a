//! Byte-counting response body.
//!
//! # Responsibilities
//! - Count data-frame bytes as the caller reads the response
//! - Close the transfer exactly once: at end of stream, on a body error, or
//!   when the body is dropped before it was fully read
//!
//! # Design Decisions
//! - Frames pass through untouched; only their length is observed
//! - An untracked body (logging disabled) does no counting at all

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Buf;
use hyper::body::{Body, Frame, SizeHint};

use crate::stats::{TransferCorrelator, TransferId};

/// Pending close for a tracked transfer.
#[derive(Debug)]
struct CloseOnFinish {
    correlator: Arc<TransferCorrelator>,
    id: TransferId,
}

/// Response body wrapper that reports its byte count to the correlator.
#[derive(Debug)]
pub struct CountingBody<B> {
    inner: B,
    counted: u64,
    close: Option<CloseOnFinish>,
}

impl<B> CountingBody<B> {
    /// Wrap `inner` without tracking.
    pub fn untracked(inner: B) -> Self {
        Self {
            inner,
            counted: 0,
            close: None,
        }
    }

    /// Wrap `inner`, closing transfer `id` on `correlator` when finished.
    pub fn tracked(inner: B, correlator: Arc<TransferCorrelator>, id: TransferId) -> Self {
        Self {
            inner,
            counted: 0,
            close: Some(CloseOnFinish { correlator, id }),
        }
    }

    /// Bytes read so far (always zero for untracked bodies).
    pub fn bytes_read(&self) -> u64 {
        self.counted
    }

    /// Identity of the tracked transfer, if any.
    pub fn transfer_id(&self) -> Option<TransferId> {
        self.close.as_ref().map(|c| c.id)
    }

    fn finish(&mut self) {
        if let Some(close) = self.close.take() {
            close.correlator.close_by_id(close.id, self.counted);
        }
    }
}

impl<B> Body for CountingBody<B>
where
    B: Body + Unpin,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_frame(cx);

        match &poll {
            Poll::Ready(Some(Ok(frame))) => {
                if this.close.is_some() {
                    if let Some(data) = frame.data_ref() {
                        this.counted += data.remaining() as u64;
                    }
                }
            }
            Poll::Ready(Some(Err(_))) | Poll::Ready(None) => this.finish(),
            Poll::Pending => {}
        }

        poll
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B> Drop for CountingBody<B> {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{RequestSnapshot, StatsLogger};
    use bytes::Bytes;
    use http::{Request, Response};
    use http_body_util::{BodyExt, Full, StreamBody};
    use std::convert::Infallible;
    use std::sync::Mutex;
    use std::time::Instant;

    fn setup() -> (Arc<TransferCorrelator>, Arc<Mutex<Vec<u8>>>) {
        let correlator = Arc::new(TransferCorrelator::new(StatsLogger::new(1, "t")));
        let sink = Arc::new(Mutex::new(Vec::new()));
        correlator.logger().enable(sink.clone());
        (correlator, sink)
    }

    fn open(correlator: &TransferCorrelator) -> TransferId {
        let req = Request::get("http://example.com/a").body(Full::new(Bytes::new())).unwrap();
        let mut res = Response::new(());
        let id = correlator.track(&mut res, RequestSnapshot::capture(&req));
        correlator.open_transfer(&res, Instant::now());
        id
    }

    fn resbody(sink: &Mutex<Vec<u8>>) -> Vec<String> {
        let out = String::from_utf8(sink.lock().unwrap().clone()).unwrap();
        out.lines()
            .filter_map(|l| l.split(' ').find_map(|kv| kv.strip_prefix("resbody=")))
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_full_read_closes_with_count() {
        let (correlator, sink) = setup();
        let id = open(&correlator);

        let body = CountingBody::tracked(
            Full::new(Bytes::from_static(b"hello world")),
            correlator.clone(),
            id,
        );
        let bytes = body.collect().await.unwrap().to_bytes();

        assert_eq!(bytes.len(), 11);
        assert_eq!(resbody(&sink), vec!["11"]);
        assert_eq!(correlator.live_transfers(), 0);
    }

    #[tokio::test]
    async fn test_chunked_stream_is_summed() {
        let (correlator, sink) = setup();
        let id = open(&correlator);

        let chunks = futures_util::stream::iter(vec![
            Ok::<_, Infallible>(Frame::data(Bytes::from_static(b"abc"))),
            Ok(Frame::data(Bytes::from_static(b"defgh"))),
        ]);
        let body = CountingBody::tracked(StreamBody::new(chunks), correlator.clone(), id);
        body.collect().await.unwrap();

        assert_eq!(resbody(&sink), vec!["8"]);
    }

    #[tokio::test]
    async fn test_drop_before_end_closes_with_partial_count() {
        let (correlator, sink) = setup();
        let id = open(&correlator);

        let chunks = futures_util::stream::iter(vec![
            Ok::<_, Infallible>(Frame::data(Bytes::from_static(b"abcd"))),
            Ok(Frame::data(Bytes::from_static(b"efgh"))),
        ]);
        let mut body = CountingBody::tracked(StreamBody::new(chunks), correlator.clone(), id);
        body.frame().await.unwrap().unwrap();
        assert_eq!(body.bytes_read(), 4);
        drop(body);

        assert_eq!(resbody(&sink), vec!["4"]);
        assert_eq!(correlator.live_transfers(), 0);
    }

    #[tokio::test]
    async fn test_body_error_closes_once_with_partial_count() {
        let (correlator, sink) = setup();
        let id = open(&correlator);

        let chunks = futures_util::stream::iter(vec![
            Ok(Frame::data(Bytes::from_static(b"abc"))),
            Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated")),
        ]);
        let body = CountingBody::tracked(StreamBody::new(chunks), correlator.clone(), id);
        assert!(body.collect().await.is_err());

        assert_eq!(resbody(&sink), vec!["3"]);
        assert_eq!(correlator.live_transfers(), 0);
    }

    #[tokio::test]
    async fn test_untracked_body_passes_through() {
        let body = CountingBody::untracked(Full::new(Bytes::from_static(b"xyz")));
        assert!(body.transfer_id().is_none());
        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"xyz");
    }
}
