use std::{
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    task::{Context, Poll},
};

use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use tokio::sync::watch;

/// Byte-level progress of one upload, published as a percentage.
///
/// The published value never decreases and never exceeds 100.
#[derive(Debug, Clone)]
pub struct UploadProgress {
    inner: Arc<ProgressInner>,
}

#[derive(Debug)]
struct ProgressInner {
    total: AtomicU64,
    loaded: AtomicU64,
    percent: watch::Sender<u8>,
}

impl UploadProgress {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ProgressInner {
                total: AtomicU64::new(0),
                loaded: AtomicU64::new(0),
                percent: watch::Sender::new(0),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.inner.percent.subscribe()
    }

    pub fn percent(&self) -> u8 {
        *self.inner.percent.borrow()
    }

    pub fn loaded(&self) -> u64 {
        self.inner.loaded.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.inner.total.load(Ordering::Relaxed)
    }

    pub fn set_total(&self, total: u64) {
        self.inner.total.store(total, Ordering::Relaxed);
        self.publish();
    }

    pub fn advance(&self, bytes: u64) {
        self.inner.loaded.fetch_add(bytes, Ordering::Relaxed);
        self.publish();
    }

    /// Marks the body as fully transmitted.
    pub fn finish(&self) {
        self.raise_to(100);
    }

    fn publish(&self) {
        let total = self.total();
        if total == 0 {
            return;
        }
        let loaded = self.loaded().min(total);
        // Same rounding as Math.round(loaded / total * 100).
        let percent = (u128::from(loaded) * 200 + u128::from(total)) / (u128::from(total) * 2);
        self.raise_to(percent.min(100) as u8);
    }

    fn raise_to(&self, percent: u8) {
        self.inner.percent.send_if_modified(|current| {
            if percent > *current {
                *current = percent;
                true
            } else {
                false
            }
        });
    }
}

impl Default for UploadProgress {
    fn default() -> Self {
        Self::new()
    }
}

pin_project! {
    /// Body stream that reports every chunk handed to the transport.
    pub struct ProgressStream<S> {
        #[pin]
        inner: S,
        progress: UploadProgress,
    }
}

impl<S> ProgressStream<S> {
    pub fn new(inner: S, progress: UploadProgress) -> Self {
        Self { inner, progress }
    }
}

impl<S, E> Stream for ProgressStream<S>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let polled = this.inner.poll_next(cx);
        if let Poll::Ready(Some(Ok(chunk))) = &polled {
            this.progress.advance(chunk.len() as u64);
        }
        polled
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
