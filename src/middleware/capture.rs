// Response body interceptor
// Forwards every frame of a response body unchanged while counting the bytes
// actually handed to the connection, then reports the total once
//
// Numan Thabit 2025 Nov

use crate::metrics::HttpMetrics;
use axum::body::{Body, Bytes};
use http_body::{Body as HttpBody, Frame, SizeHint};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Where the byte total goes once the body is finished.
pub struct ResponseSizeRecorder {
    metrics: Arc<HttpMetrics>,
    method: String,
    path: String,
}

impl ResponseSizeRecorder {
    pub fn new(metrics: Arc<HttpMetrics>, method: String, path: String) -> Self {
        Self {
            metrics,
            method,
            path,
        }
    }

    fn record(self, bytes: u64) {
        if bytes > 0 {
            self.metrics
                .observe_response_size(&self.method, &self.path, bytes);
        }
    }
}

/// Body decorator standing between the handler's response body and the
/// connection.
///
/// Only data frames the inner body actually yields are counted, so a stream
/// that fails halfway reports exactly the bytes delivered before the error.
/// Errors are passed through untouched. The total is reported when the stream
/// ends or, if the client goes away first, when the body is dropped.
pub struct CapturedBody {
    inner: Body,
    bytes: u64,
    recorder: Option<ResponseSizeRecorder>,
}

impl CapturedBody {
    pub fn new(inner: Body, recorder: ResponseSizeRecorder) -> Self {
        Self {
            inner,
            bytes: 0,
            recorder: Some(recorder),
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    fn finish(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            recorder.record(self.bytes);
        }
    }
}

impl HttpBody for CapturedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.bytes += data.len() as u64;
                }
            }
            Poll::Ready(None) => this.finish(),
            _ => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for CapturedBody {
    fn drop(&mut self) {
        self.finish();
    }
}
