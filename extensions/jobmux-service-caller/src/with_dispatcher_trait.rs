use jobmux::rpc::JobDispatcher;

/// Async access to a shared [`JobDispatcher`] behind whichever mutex its owner
/// uses.
///
/// The work is passed in as a closure so that no lock guard has to cross an
/// `.await`; the guard types of `tokio` and `parking_lot` mutexes differ in
/// whether they are `Send`.
#[async_trait::async_trait]
pub trait WithDispatcher: Send + Sync {
    async fn with_dispatcher<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut JobDispatcher) -> R + Send,
        R: Send;
}

#[cfg(feature = "tokio_support")]
#[async_trait::async_trait]
impl WithDispatcher for tokio::sync::Mutex<JobDispatcher> {
    async fn with_dispatcher<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut JobDispatcher) -> R + Send,
        R: Send,
    {
        let mut guard = self.lock().await;
        f(&mut guard)
    }
}

#[async_trait::async_trait]
impl WithDispatcher for parking_lot::Mutex<JobDispatcher> {
    async fn with_dispatcher<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut JobDispatcher) -> R + Send,
        R: Send,
    {
        // Blocks the thread; only suitable where dispatch never holds the lock
        // across an await.
        let mut guard = self.lock();
        f(&mut guard)
    }
}
