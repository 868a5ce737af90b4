//! Caller-driven cancellation and handles for spawned executions

use hedera_core::{HederaError, Result};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Signal that aborts an execution at its next suspension point
///
/// Clones share the same signal. Once cancelled a token stays cancelled.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
    /// Fresh, uncancelled token
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Cancel every execution observing this token
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Whether [`cancel`](Self::cancel) has been called
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `future` unless `cancel` fires first
pub(crate) async fn cancellable<F: Future>(
    cancel: Option<&CancellationToken>,
    future: F,
) -> Result<F::Output> {
    match cancel {
        Some(token) => {
            if token.is_cancelled() {
                return Err(HederaError::Cancelled);
            }
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(HederaError::Cancelled),
                output = future => Ok(output),
            }
        }
        None => Ok(future.await),
    }
}

/// Drive `future` to completion on a private current-thread runtime
///
/// Must not be called from within an async context.
pub(crate) fn block_on<T>(future: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| HederaError::invalid(format!("cannot start runtime: {e}")))?
        .block_on(future)
}

/// Handle to an execution running on its own task
///
/// Awaiting the handle yields the execution's result. [`cancel`](Self::cancel)
/// stops the execution at its next suspension point, after which the handle
/// resolves to [`HederaError::Cancelled`].
#[derive(Debug)]
pub struct ExecutionHandle<T> {
    join: JoinHandle<Result<T>>,
    token: CancellationToken,
}

impl<T> ExecutionHandle<T> {
    pub(crate) fn new(join: JoinHandle<Result<T>>, token: CancellationToken) -> Self {
        Self { join, token }
    }

    /// Request cancellation of the execution
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Token controlling this execution
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether the execution has finished
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl<T> Future for ExecutionHandle<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.join).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(err)) if err.is_cancelled() => Poll::Ready(Err(HederaError::Cancelled)),
            Poll::Ready(Err(err)) => Poll::Ready(Err(HederaError::invalid(format!(
                "execution task failed: {err}"
            )))),
            Poll::Pending => Poll::Pending,
        }
    }
}
