//! Plumbing shared by the flows: the observable loading flag and the
//! cancellation token that ties in-flight calls to the lifetime of a screen.

use crate::error::{Error, Result};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Observable "request in flight" flag.
///
/// Set through a [`LoadingGuard`], which clears it on drop. The flag is
/// therefore reset on every exit path, including errors and cancellation.
#[derive(Debug, Clone, Default)]
pub struct LoadingFlag {
    inner: Arc<AtomicBool>,
}

impl LoadingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }

    /// Mark the flag as loading until the returned guard is dropped.
    pub fn begin(&self) -> LoadingGuard {
        self.inner.store(true, Ordering::SeqCst);
        LoadingGuard {
            inner: self.inner.clone(),
        }
    }

    /// Single-flight variant of [`begin`](Self::begin): fails with
    /// [`Error::Busy`] when another call already holds the flag.
    pub fn try_begin(&self, what: &str) -> Result<LoadingGuard> {
        self.inner
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| Error::Busy(format!("{} is already in progress", what)))?;
        Ok(LoadingGuard {
            inner: self.inner.clone(),
        })
    }
}

pub struct LoadingGuard {
    inner: Arc<AtomicBool>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.inner.store(false, Ordering::SeqCst);
    }
}

/// Cancellation shared between a flow and whoever owns its screen.
///
/// Clones observe the same state. Once cancelled, a token stays cancelled.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so `changed` cannot fail here.
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Run `fut` unless `token` is cancelled first.
///
/// A cancelled call resolves to [`Error::Cancelled`] and whatever the future
/// would have produced is dropped, so callers never apply a late response.
pub async fn run_cancellable<T, F>(token: &CancelToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::Cancelled),
        res = fut => res,
    }
}
