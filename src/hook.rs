//! Hook traits and type erasure.
//!
//! # How hooks are stored
//!
//! A registry holds hooks written as closures of many different types in a
//! single ordered list per [`HookKind`]. Each hook is erased behind one
//! `Arc<dyn Fn>` with a uniform signature, and the information whether it
//! wants a [`Context`] is recorded next to it when it is erased:
//!
//! ```text
//! |req: Request, cx: Context| async { … }     ← user writes this
//!        ↓ Interceptor::on_request(hook)
//! hook.into_boxed_hook()                      ← OnRequest<(Request, Context)> impl
//!        ↓
//! BoxedHook { call: Arc<dyn Fn>, wants_context: true }
//!        ↓ at fetch time
//! (call)(req, Some(cx))                       ← one vtable dispatch
//! ```
//!
//! The marker type parameter (`(Request,)` vs `(Request, Context)`) is what
//! lets one closure-taking method accept both arities: the compiler picks the
//! impl from the closure's declared parameters, which is also how the context
//! requirement is decided once, at registration, with no per-call inspection.
//! Closures must annotate their parameter types for the impl to be found.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{BoxError, Error};
use crate::outcome::{HookOutput, IntoHookResult};
use crate::request::Request;
use crate::response::Response;

// ── Hook kinds ────────────────────────────────────────────────────────────────

/// The three interception points of a fetch.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HookKind {
    /// Before the fetch. May short-circuit it.
    Request,
    /// After a response was produced. Runs in reverse registration order.
    Response,
    /// After the request chain or the fetch failed. Runs in reverse
    /// registration order.
    Exception,
}

impl HookKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Request   => "process_request",
            Self::Response  => "process_response",
            Self::Exception => "process_exception",
        }
    }

    /// Human-readable return set, used in type-mismatch errors.
    pub(crate) fn allowed_returns(self) -> &'static str {
        match self {
            Self::Request | Self::Exception => "nothing, Response or Request",
            Self::Response                  => "Response or Request",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future.
pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type ErasedFn<I> = dyn Fn(I, Option<Context>) -> BoxFuture<Result<HookOutput, BoxError>> + Send + Sync;

/// A type-erased hook shared across every concurrent chain.
///
/// `I` is what the hook consumes besides the context: a [`Request`] for
/// request hooks, `(Request, Response)` for response hooks and
/// `(Request, Error)` for exception hooks.
#[doc(hidden)]
pub struct BoxedHook<I> {
    call: Arc<ErasedFn<I>>,
    wants_context: bool,
}

impl<I> BoxedHook<I> {
    fn new<C>(wants_context: bool, call: C) -> Self
    where
        C: Fn(I, Option<Context>) -> BoxFuture<Result<HookOutput, BoxError>> + Send + Sync + 'static,
    {
        Self { call: Arc::new(call), wants_context }
    }

    pub(crate) fn wants_context(&self) -> bool {
        self.wants_context
    }

    pub(crate) fn call(&self, input: I, cx: Option<Context>) -> BoxFuture<Result<HookOutput, BoxError>> {
        (self.call)(input, cx)
    }
}

impl<I> Clone for BoxedHook<I> {
    fn clone(&self) -> Self {
        Self { call: Arc::clone(&self.call), wants_context: self.wants_context }
    }
}

// ── Public hook traits ────────────────────────────────────────────────────────

/// Implemented for every valid request hook.
///
/// You never implement this yourself. It is satisfied by any closure or
/// function of the shape
///
/// ```text
/// Fn(Request) -> impl Future<Output = impl IntoHookResult>
/// Fn(Request, Context) -> impl Future<Output = impl IntoHookResult>
/// ```
///
/// Allowed results: nothing, a `Response` or a `Request`.
pub trait OnRequest<M>: private::Sealed<M> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_hook(self) -> BoxedHook<Request>;
}

/// Implemented for every valid response hook:
///
/// ```text
/// Fn(Request, Response) -> impl Future<Output = impl IntoHookResult>
/// Fn(Request, Response, Context) -> impl Future<Output = impl IntoHookResult>
/// ```
///
/// Allowed results: a `Response` or a `Request`. Producing nothing is a
/// [`Error::TypeMismatch`].
pub trait OnResponse<M>: private::Sealed<M> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_hook(self) -> BoxedHook<(Request, Response)>;
}

/// Implemented for every valid exception hook:
///
/// ```text
/// Fn(Request, Error) -> impl Future<Output = impl IntoHookResult>
/// Fn(Request, Error, Context) -> impl Future<Output = impl IntoHookResult>
/// ```
///
/// Allowed results: nothing, a `Response` or a `Request`.
pub trait OnException<M>: private::Sealed<M> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_hook(self) -> BoxedHook<(Request, Error)>;
}

/// Only the blanket impls below can satisfy the hook traits.
mod private {
    pub trait Sealed<M> {}
}

// ── Sealing ───────────────────────────────────────────────────────────────────

impl<F, Fut> private::Sealed<(Request,)> for F
where
    F: Fn(Request) -> Fut,
{
}

impl<F, Fut> private::Sealed<(Request, Context)> for F
where
    F: Fn(Request, Context) -> Fut,
{
}

impl<F, Fut> private::Sealed<(Request, Response)> for F
where
    F: Fn(Request, Response) -> Fut,
{
}

impl<F, Fut> private::Sealed<(Request, Response, Context)> for F
where
    F: Fn(Request, Response, Context) -> Fut,
{
}

impl<F, Fut> private::Sealed<(Request, Error)> for F
where
    F: Fn(Request, Error) -> Fut,
{
}

impl<F, Fut> private::Sealed<(Request, Error, Context)> for F
where
    F: Fn(Request, Error, Context) -> Fut,
{
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> OnRequest<(Request,)> for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHookResult,
{
    fn into_boxed_hook(self) -> BoxedHook<Request> {
        BoxedHook::<Request>::new(false, move |req, _cx| {
            let fut = self(req);
            Box::pin(async move { fut.await.into_hook_result() })
        })
    }
}

impl<F, Fut, R> OnRequest<(Request, Context)> for F
where
    F: Fn(Request, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHookResult,
{
    fn into_boxed_hook(self) -> BoxedHook<Request> {
        BoxedHook::<Request>::new(true, move |req, cx: Option<Context>| {
            let fut = self(req, cx.unwrap_or_default());
            Box::pin(async move { fut.await.into_hook_result() })
        })
    }
}

impl<F, Fut, R> OnResponse<(Request, Response)> for F
where
    F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHookResult,
{
    fn into_boxed_hook(self) -> BoxedHook<(Request, Response)> {
        BoxedHook::<(Request, Response)>::new(false, move |(req, resp), _cx| {
            let fut = self(req, resp);
            Box::pin(async move { fut.await.into_hook_result() })
        })
    }
}

impl<F, Fut, R> OnResponse<(Request, Response, Context)> for F
where
    F: Fn(Request, Response, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHookResult,
{
    fn into_boxed_hook(self) -> BoxedHook<(Request, Response)> {
        BoxedHook::<(Request, Response)>::new(true, move |(req, resp), cx: Option<Context>| {
            let fut = self(req, resp, cx.unwrap_or_default());
            Box::pin(async move { fut.await.into_hook_result() })
        })
    }
}

impl<F, Fut, R> OnException<(Request, Error)> for F
where
    F: Fn(Request, Error) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHookResult,
{
    fn into_boxed_hook(self) -> BoxedHook<(Request, Error)> {
        BoxedHook::<(Request, Error)>::new(false, move |(req, err), _cx| {
            let fut = self(req, err);
            Box::pin(async move { fut.await.into_hook_result() })
        })
    }
}

impl<F, Fut, R> OnException<(Request, Error, Context)> for F
where
    F: Fn(Request, Error, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHookResult,
{
    fn into_boxed_hook(self) -> BoxedHook<(Request, Error)> {
        BoxedHook::<(Request, Error)>::new(true, move |(req, err), cx: Option<Context>| {
            let fut = self(req, err, cx.unwrap_or_default());
            Box::pin(async move { fut.await.into_hook_result() })
        })
    }
}
