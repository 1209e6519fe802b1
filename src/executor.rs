//! Chain executor.
//!
//! # The download path
//!
//! ```text
//! download(fetch, req)
//!   │
//!   ├─ process_request ── request hooks in order ── first non-empty result wins
//!   │        │                       └─ all empty → fetch(req)
//!   │        └─ error ── yield once ── process_exception ── reverse order
//!   │                                        ├─ first non-empty result wins
//!   │                                        └─ none → original error returned
//!   │
//!   └─ process_response ── Request → returned untouched
//!                           Response → response hooks in reverse order
//!                                      └─ a Request ends the chain
//! ```
//!
//! Recovery is attempted once: only failures of the request chain or the
//! fetch reach the exception hooks. Errors raised by response or exception
//! hooks go straight to the caller.
//!
//! Within a chain hooks run strictly one after another, each one's result
//! feeding the next. Distinct downloads share nothing but the read-only
//! [`Registry`], so an `Executor` can be cloned into as many tasks as needed.

use std::sync::Arc;

use tracing::debug;

use crate::context::Context;
use crate::error::Error;
use crate::fetch::Fetch;
use crate::hook::HookKind;
use crate::observer::Observer;
use crate::outcome::{HookOutput, Outcome};
use crate::registry::{RegisteredHook, Registry};
use crate::request::Request;
use crate::response::Response;
use crate::trace::{ChainScope, Tracer};

/// Runs the registered hooks around a fetch.
#[derive(Clone)]
pub struct Executor {
    registry: Arc<Registry>,
    context: Context,
    tracer: Tracer,
}

impl Executor {
    /// Creates an executor with a default [`Context`] that logs its events
    /// through [`LogObserver`](crate::LogObserver).
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
            context: Context::default(),
            tracer: Tracer::default(),
        }
    }

    /// The context handed to hooks that declare a [`Context`] parameter.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Routes method and chain events to `observer`.
    pub fn with_observer(mut self, observer: impl Observer + 'static) -> Self {
        self.tracer = Tracer::new(Arc::new(observer));
        self
    }

    pub fn registry(&self) -> &Registry { &self.registry }
    pub fn context(&self) -> &Context { &self.context }

    // ── Orchestration ─────────────────────────────────────────────────────────

    /// Sends `request` through the request hooks, `fetch`, the exception hooks
    /// if anything failed, and the response hooks.
    ///
    /// Resolves to the final [`Response`], or to a
    /// [`Request`] the caller should schedule instead.
    pub async fn download<F: Fetch>(&self, fetch: F, request: Request) -> Result<Outcome, Error> {
        let result = match self.process_request(&request, fetch).await {
            Ok(outcome) => outcome,
            Err(error) => {
                // Let other tasks run before recovering, so a burst of
                // failures does not monopolise the worker.
                tokio::task::yield_now().await;
                self.process_exception(&request, error).await?
            }
        };
        self.process_response(&request, Some(result)).await
    }

    // ── Chains ────────────────────────────────────────────────────────────────

    /// Runs the request hooks in registration order, then `fetch` if none of
    /// them produced a result.
    pub async fn process_request<F: Fetch>(&self, request: &Request, fetch: F) -> Result<Outcome, Error> {
        let mut chain = self.tracer.chain(HookKind::Request, Outcome::Request(request.clone()));
        let result = self.run_request_chain(&mut chain, request, fetch).await;
        chain.finish(result.as_ref().err());
        result
    }

    async fn run_request_chain<F: Fetch>(
        &self,
        chain: &mut ChainScope<'_>,
        request: &Request,
        fetch: F,
    ) -> Result<Outcome, Error> {
        for entry in self.registry.request_hooks() {
            let produced = self
                .invoke(chain, HookKind::Request, entry, request.clone(), HookOutput::optional)
                .await?;
            if let Some(outcome) = produced {
                debug!(middleware = %entry.middleware(), url = request.url(), "request chain short-circuited");
                return Ok(outcome);
            }
        }
        let response = fetch.fetch(request.clone()).await.map_err(Error::fetch)?;
        Ok(Outcome::Response(response))
    }

    /// Runs the response hooks in reverse registration order over `result`.
    ///
    /// A `Request` result bypasses the hooks entirely: response hooks only
    /// ever see real responses. `None` means the orchestration is broken and
    /// fails with [`Error::InvalidState`].
    pub async fn process_response(&self, request: &Request, result: Option<Outcome>) -> Result<Outcome, Error> {
        let response = match result {
            None => return Err(Error::InvalidState("process_response received no result")),
            Some(Outcome::Request(retry)) => return Ok(Outcome::Request(retry)),
            Some(Outcome::Response(response)) => response,
        };

        let mut chain = self.tracer.chain(HookKind::Response, Outcome::Response(response.clone()));
        let result = self.run_response_chain(&mut chain, request, response).await;
        if let Ok(outcome) = &result {
            chain.set_subject(outcome.clone());
        }
        chain.finish(result.as_ref().err());
        result
    }

    async fn run_response_chain(
        &self,
        chain: &mut ChainScope<'_>,
        request: &Request,
        mut response: Response,
    ) -> Result<Outcome, Error> {
        for entry in self.registry.response_hooks() {
            let input = (request.clone(), response);
            match self.invoke(chain, HookKind::Response, entry, input, HookOutput::required).await? {
                Outcome::Response(next) => response = next,
                Outcome::Request(retry) => {
                    debug!(middleware = %entry.middleware(), url = retry.url(), "response chain returned a request");
                    return Ok(Outcome::Request(retry));
                }
            }
        }
        Ok(Outcome::Response(response))
    }

    /// Runs the exception hooks in reverse registration order.
    ///
    /// The first hook that produces a result resolves the failure. If none
    /// does, `error` itself is returned unchanged.
    pub async fn process_exception(&self, request: &Request, error: Error) -> Result<Outcome, Error> {
        let mut chain = self.tracer.chain(HookKind::Exception, Outcome::Request(request.clone()));
        let result = self.run_exception_chain(&mut chain, request, error).await;
        chain.finish(result.as_ref().err());
        result
    }

    async fn run_exception_chain(
        &self,
        chain: &mut ChainScope<'_>,
        request: &Request,
        error: Error,
    ) -> Result<Outcome, Error> {
        for entry in self.registry.exception_hooks() {
            let input = (request.clone(), error.clone());
            let produced = self
                .invoke(chain, HookKind::Exception, entry, input, HookOutput::optional)
                .await?;
            if let Some(outcome) = produced {
                debug!(middleware = %entry.middleware(), url = request.url(), %error, "exception resolved");
                return Ok(outcome);
            }
        }
        Err(error)
    }

    // ── Single hook ───────────────────────────────────────────────────────────

    /// Calls one hook, validates what it produced with `accept`, and records
    /// the invocation whatever the result.
    async fn invoke<I, T>(
        &self,
        chain: &mut ChainScope<'_>,
        kind: HookKind,
        entry: &RegisteredHook<I>,
        input: I,
        accept: fn(HookOutput) -> Result<T, HookOutput>,
    ) -> Result<T, Error> {
        let middleware = entry.middleware();
        chain.enter(middleware);
        let call = self.tracer.invocation(kind, middleware);

        let context = entry.hook().wants_context().then(|| self.context.clone());
        let result = match entry.hook().call(input, context).await {
            Ok(output) => accept(output).map_err(|got| Error::TypeMismatch {
                middleware: Arc::clone(middleware),
                hook: kind,
                expected: kind.allowed_returns(),
                got: got.kind_name(),
            }),
            Err(source) => Err(Error::hook(kind, middleware, source)),
        };

        call.finish(result.as_ref().err());
        result
    }
}
