//! Progress-callback trait for per-book sampling events.
//!
//! Inject an [`Arc<dyn SamplingProgressCallback>`] via
//! [`crate::config::SamplerConfigBuilder::progress_callback`] to receive
//! events as the sampler downloads and processes each book.
//!
//! # Example
//!
//! ```rust
//! use prose_sampler::{SamplerConfig, SamplingProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     sentences: AtomicUsize,
//! }
//!
//! impl SamplingProgressCallback for CountingCallback {
//!     fn on_book_complete(&self, _index: usize, _total: usize, sentences: usize) {
//!         self.sentences.fetch_add(sentences, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { sentences: AtomicUsize::new(0) });
//!
//! let config = SamplerConfig::builder()
//!     .progress_callback(counter as Arc<dyn SamplingProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the sampler as it processes each selected book.
///
/// Implementations must be `Send + Sync`: books are downloaded concurrently,
/// so the per-book methods may be called from different tasks at the same
/// time. All methods default to no-ops.
pub trait SamplingProgressCallback: Send + Sync {
    /// Called once after the catalog search, before any download.
    ///
    /// # Arguments
    /// * `total_books` — number of books selected for this run
    fn on_sampling_start(&self, total_books: usize) {
        let _ = total_books;
    }

    /// Called just before a book's text is requested.
    ///
    /// `index` is 1-based in selection order.
    fn on_book_start(&self, index: usize, total_books: usize, identifier: &str) {
        let _ = (index, total_books, identifier);
    }

    /// Called when a book passed the language gate and was extracted.
    ///
    /// `sentences` may be zero: a clean English book can still yield nothing
    /// that passes the sentence filters.
    fn on_book_complete(&self, index: usize, total_books: usize, sentences: usize) {
        let _ = (index, total_books, sentences);
    }

    /// Called when a book was downloaded but rejected by the language gate.
    fn on_book_skipped(&self, index: usize, total_books: usize, reason: &str) {
        let _ = (index, total_books, reason);
    }

    /// Called when a book's download failed after all retries.
    fn on_book_error(&self, index: usize, total_books: usize, error: &str) {
        let _ = (index, total_books, error);
    }

    /// Called once after all books have been attempted.
    ///
    /// # Arguments
    /// * `total_books`    — books attempted
    /// * `accepted_books` — books that passed the language gate
    fn on_sampling_complete(&self, total_books: usize, accepted_books: usize) {
        let _ = (total_books, accepted_books);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SamplingProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SamplerConfig`].
pub type ProgressCallback = Arc<dyn SamplingProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        skips: AtomicUsize,
        errors: AtomicUsize,
        accepted: AtomicUsize,
    }

    impl SamplingProgressCallback for TrackingCallback {
        fn on_book_start(&self, _index: usize, _total: usize, _identifier: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_book_complete(&self, _index: usize, _total: usize, _sentences: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_book_skipped(&self, _index: usize, _total: usize, _reason: &str) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }

        fn on_book_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_sampling_complete(&self, _total: usize, accepted_books: usize) {
            self.accepted.store(accepted_books, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_sampling_start(3);
        cb.on_book_start(1, 3, "abc");
        cb.on_book_complete(1, 3, 12);
        cb.on_book_skipped(2, 3, "not English");
        cb.on_book_error(3, 3, "HTTP 404");
        cb.on_sampling_complete(3, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_book_start(1, 3, "a");
        tracker.on_book_complete(1, 3, 7);
        tracker.on_book_start(2, 3, "b");
        tracker.on_book_skipped(2, 3, "not English");
        tracker.on_book_start(3, 3, "c");
        tracker.on_book_error(3, 3, "timeout");
        tracker.on_sampling_complete(3, 1);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.skips.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.accepted.load(Ordering::SeqCst), 1);
    }
}
