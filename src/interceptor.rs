//! Interceptor capability descriptors.

use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::hook::{BoxedHook, OnException, OnRequest, OnResponse};
use crate::request::Request;
use crate::response::Response;

/// A named bundle of optional hooks.
///
/// Which hooks are present is fixed when the descriptor is built; the
/// [`Registry`](crate::Registry) reads it once and never asks again.
///
/// ```rust
/// use sieve::{Context, Interceptor, Request, Response};
///
/// let user_agent = Interceptor::new("UserAgent")
///     .on_request(|req: Request, cx: Context| async move {
///         // A request hook that returns a Request ends the chain: the caller
///         // reschedules it.
///         if req.header("user-agent").is_none() {
///             return Some(req.with_header("user-agent", cx.actor()));
///         }
///         None
///     })
///     .on_response(|_req: Request, resp: Response| async move { resp });
/// ```
pub struct Interceptor {
    pub(crate) name: Arc<str>,
    pub(crate) on_request: Option<BoxedHook<Request>>,
    pub(crate) on_response: Option<BoxedHook<(Request, Response)>>,
    pub(crate) on_exception: Option<BoxedHook<(Request, Error)>>,
}

impl Interceptor {
    /// The name identifies the interceptor in telemetry and errors.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into(), on_request: None, on_response: None, on_exception: None }
    }

    pub fn on_request<M>(mut self, hook: impl OnRequest<M>) -> Self {
        self.on_request = Some(hook.into_boxed_hook());
        self
    }

    pub fn on_response<M>(mut self, hook: impl OnResponse<M>) -> Self {
        self.on_response = Some(hook.into_boxed_hook());
        self
    }

    pub fn on_exception<M>(mut self, hook: impl OnException<M>) -> Self {
        self.on_exception = Some(hook.into_boxed_hook());
        self
    }

    pub fn name(&self) -> &str { &self.name }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("name", &self.name)
            .field("on_request", &self.on_request.is_some())
            .field("on_response", &self.on_response.is_some())
            .field("on_exception", &self.on_exception.is_some())
            .finish()
    }
}
