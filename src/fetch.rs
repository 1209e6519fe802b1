//! The transport contract consumed by the executor.

use std::future::Future;

use crate::error::BoxError;
use crate::hook::BoxFuture;
use crate::request::Request;
use crate::response::Response;

/// Implemented for every valid transport function.
///
/// Satisfied by any closure or `async fn` of the shape
///
/// ```text
/// FnOnce(Request) -> impl Future<Output = Result<Response, E>>
/// ```
///
/// where `E` converts into [`BoxError`]. The executor calls it at most once
/// per download, and only if no request hook short-circuited.
pub trait Fetch: Send {
    #[doc(hidden)]
    fn fetch(self, request: Request) -> BoxFuture<Result<Response, BoxError>>;
}

impl<F, Fut, E> Fetch for F
where
    F: FnOnce(Request) -> Fut + Send,
    Fut: Future<Output = Result<Response, E>> + Send + 'static,
    E: Into<BoxError>,
{
    fn fetch(self, request: Request) -> BoxFuture<Result<Response, BoxError>> {
        let fut = self(request);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }
}
