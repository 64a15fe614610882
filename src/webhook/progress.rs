//! Upload progress accounting.
//!
//! Progress is observed from the request body stream: the file is split
//! into chunks, and every chunk handed to the transport advances a
//! monotonic percentage counter. Each attempt gets a fresh counter, so a
//! retried upload visibly restarts at 0.

use bytes::Bytes;
use futures_util::Stream;
use std::sync::Arc;

use super::error::WebhookError;

/// Receives progress percentages (0-100) during an upload attempt.
/// Called synchronously from the request path; implementations must not
/// block and cannot fail.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Notified before each retry with the 1-based number of the attempt that
/// just failed and its error. Same contract as [`ProgressFn`]: synchronous,
/// non-blocking, infallible.
pub type RetryFn = Arc<dyn Fn(usize, &WebhookError) + Send + Sync>;

/// Chunk size for upload bodies.
pub(crate) const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Monotonic progress counter for one upload attempt.
///
/// Emits 0 on construction (every attempt restarts the indicator) and then
/// `floor(sent * 100 / total)` whenever the percentage increases.
pub(crate) struct ProgressCounter {
    total: u64,
    sent: u64,
    last_percent: u8,
    sink: Option<ProgressFn>,
}

impl ProgressCounter {
    pub(crate) fn new(total: u64, sink: Option<ProgressFn>) -> Self {
        if let Some(sink) = &sink {
            sink(0);
        }
        Self {
            total,
            sent: 0,
            last_percent: 0,
            sink,
        }
    }

    pub(crate) fn advance(&mut self, bytes: u64) {
        self.sent = (self.sent + bytes).min(self.total);
        let percent = if self.total == 0 {
            100
        } else {
            (self.sent * 100 / self.total) as u8
        };
        if percent > self.last_percent {
            self.last_percent = percent;
            if let Some(sink) = &self.sink {
                sink(percent);
            }
        }
    }
}

/// Wraps file bytes in a chunked stream that reports progress as each
/// chunk is pulled by the transport. `Bytes::slice` is a refcount bump,
/// so retries can reuse the same backing buffer.
pub(crate) fn progress_stream(
    data: Bytes,
    sink: Option<ProgressFn>,
) -> impl Stream<Item = Result<Bytes, std::convert::Infallible>> {
    let mut counter = ProgressCounter::new(data.len() as u64, sink);
    let mut offset = 0usize;

    futures_util::stream::iter(std::iter::from_fn(move || {
        if offset >= data.len() {
            return None;
        }
        let end = (offset + UPLOAD_CHUNK_SIZE).min(data.len());
        let chunk = data.slice(offset..end);
        offset = end;
        counter.advance(chunk.len() as u64);
        Some(Ok(chunk))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::sync::Mutex;

    fn recording_sink() -> (ProgressFn, Arc<Mutex<Vec<u8>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink_events = Arc::clone(&events);
        let sink: ProgressFn = Arc::new(move |percent| {
            sink_events.lock().unwrap().push(percent);
        });
        (sink, events)
    }

    #[test]
    fn test_counter_reports_zero_then_ascends() {
        let (sink, events) = recording_sink();
        let mut counter = ProgressCounter::new(100, Some(sink));
        counter.advance(50);
        counter.advance(50);
        assert_eq!(*events.lock().unwrap(), vec![0, 50, 100]);
    }

    #[test]
    fn test_counter_is_monotonic_and_skips_repeats() {
        let (sink, events) = recording_sink();
        let mut counter = ProgressCounter::new(1000, Some(sink));
        // Sub-percent advances do not emit duplicate percentages.
        for _ in 0..10 {
            counter.advance(1);
        }
        counter.advance(990);
        let events = events.lock().unwrap();
        assert!(events.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*events.last().unwrap(), 100);
    }

    #[test]
    fn test_counter_clamps_overrun() {
        let (sink, events) = recording_sink();
        let mut counter = ProgressCounter::new(10, Some(sink));
        counter.advance(25);
        assert_eq!(*events.lock().unwrap(), vec![0, 100]);
    }

    #[tokio::test]
    async fn test_stream_chunks_and_reports() {
        let (sink, events) = recording_sink();
        let data = Bytes::from(vec![7u8; UPLOAD_CHUNK_SIZE * 2]);
        let stream = progress_stream(data.clone(), Some(sink));

        let chunks: Vec<_> = stream.collect().await;
        assert_eq!(chunks.len(), 2);
        let reassembled: Vec<u8> = chunks
            .into_iter()
            .flat_map(|c| c.unwrap().to_vec())
            .collect();
        assert_eq!(reassembled, data.to_vec());
        assert_eq!(*events.lock().unwrap(), vec![0, 50, 100]);
    }

    #[tokio::test]
    async fn test_stream_partial_final_chunk() {
        let data = Bytes::from(vec![1u8; UPLOAD_CHUNK_SIZE + 10]);
        let stream = progress_stream(data, None);
        let chunks: Vec<_> = stream.collect().await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].as_ref().unwrap().len(), 10);
    }
}
