use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use storecache_core::retry::RetryOptions;

use super::with_retry;

/// Wraps a fallible async operation so that every call runs under
/// `options` and yields a plain `Result`.
///
/// The returned closure has the same shape as the input: it resolves to the
/// value on success and to the last attempt's error on failure. This is the
/// adapter to use when handing a retried producer to
/// [`MemoryCache::get`](crate::cache::MemoryCache::get).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use storecache::retry::wrap_with_retry;
/// use storecache_core::retry::{FailureKind, RetryOptions};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let fetch = wrap_with_retry(
///     || async { Err::<u32, _>(FailureKind::from_status(403)) },
///     RetryOptions::default().base_delay(Duration::ZERO),
/// );
///
/// assert_eq!(fetch().await, Err(FailureKind::ClientRejected { status: 403 }));
/// # }
/// ```
pub fn wrap_with_retry<F, Fut, T, E>(
    operation: F,
    options: RetryOptions<E>,
) -> impl Fn() -> BoxFuture<'static, Result<T, E>> + Clone + Send + Sync
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let operation = Arc::new(operation);

    move || {
        let operation = Arc::clone(&operation);
        let options = options.clone();
        async move { with_retry(|| operation(), &options).await.into_result() }.boxed()
    }
}

/// Like [`wrap_with_retry`] for operations that take an argument.
///
/// The argument is cloned for every attempt.
pub fn wrap_with_retry_args<F, Fut, A, T, E>(
    operation: F,
    options: RetryOptions<E>,
) -> impl Fn(A) -> BoxFuture<'static, Result<T, E>> + Clone + Send + Sync
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    A: Clone + Send + Sync + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let operation = Arc::new(operation);

    move |args: A| {
        let operation = Arc::clone(&operation);
        let options = options.clone();
        async move {
            with_retry(|| operation(args.clone()), &options)
                .await
                .into_result()
        }
        .boxed()
    }
}
