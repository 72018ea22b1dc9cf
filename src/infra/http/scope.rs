//! Cancellation scopes for in-flight requests.
//!
//! A [`ScopeHandle`] is owned by whatever consumes the responses (a listing,
//! a search session). Dropping or cancelling it cancels every request issued
//! with one of its [`RequestScope`]s, so late responses are never applied.

use std::future::Future;

use tokio::sync::watch;

use super::ApiError;

#[derive(Debug)]
pub struct ScopeHandle {
    tx: watch::Sender<bool>,
}

impl ScopeHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn scope(&self) -> RequestScope {
        RequestScope {
            rx: self.tx.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for ScopeHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScopeHandle {
    fn drop(&mut self) {
        self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct RequestScope {
    rx: watch::Receiver<bool>,
}

impl RequestScope {
    /// A scope that is never cancelled.
    pub fn detached() -> Self {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the owning handle cancels; never resolves for detached scopes.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                if *rx.borrow() {
                    return;
                }
                std::future::pending::<()>().await;
            }
        }
    }

    /// Runs `fut` unless the scope is cancelled first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        if self.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        tokio::select! {
            biased;
            () = self.cancelled() => Err(ApiError::Cancelled),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn dropping_the_handle_cancels_pending_work() {
        let handle = ScopeHandle::new();
        let scope = handle.scope();
        let task = tokio::spawn(async move {
            scope
                .run(async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok::<_, ApiError>(1)
                })
                .await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(handle);

        let result = task.await.expect("join");
        assert!(matches!(result, Err(ApiError::Cancelled)));
    }

    #[tokio::test]
    async fn detached_scope_completes() {
        let scope = RequestScope::detached();
        let value = scope.run(async { Ok::<_, ApiError>(5) }).await;
        assert!(matches!(value, Ok(5)));
        assert!(!scope.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_scope_rejects_before_starting() {
        let handle = ScopeHandle::new();
        handle.cancel();
        let result = handle.scope().run(async { Ok::<_, ApiError>(()) }).await;
        assert!(matches!(result, Err(ApiError::Cancelled)));
        assert!(handle.is_cancelled());
    }
}
