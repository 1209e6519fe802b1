//! # sieve
//!
//! Ordered, async middleware chains around an outbound fetch.
//!
//! ## The contract
//!
//! An [`Interceptor`] is a named bundle of up to three optional hooks. A
//! [`Registry`] orders them once at startup; an [`Executor`] runs them around
//! every fetch:
//!
//! - **request hooks**, in registration order, before the fetch. The first
//!   one to produce a `Response` or a `Request` short-circuits the rest and
//!   the fetch.
//! - **exception hooks**, in reverse order, when a request hook or the fetch
//!   failed. The first one to produce a result recovers; otherwise the
//!   original error is returned.
//! - **response hooks**, in reverse order, over the response. Each one's
//!   response feeds the next; a `Request` ends the chain.
//!
//! What stays outside: the transport (any `async` function from [`Request`]
//! to [`Response`]), the policies of individual middlewares, and where the
//! telemetry goes (any [`Observer`]).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::StatusCode;
//! use sieve::{BoxError, Executor, Interceptor, Registry, Request, Response};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sieve::Error> {
//!     let auth = Interceptor::new("Auth")
//!         .on_request(|req: Request| async move {
//!             // Nothing means "carry on".
//!             if req.header("authorization").is_some() { return None; }
//!             Some(req.with_header("authorization", "Bearer token"))
//!         });
//!
//!     let executor = Executor::new(Registry::new([auth])?);
//!     let outcome = executor
//!         .download(fetch, Request::get("https://example.com/").with_header("authorization", "x"))
//!         .await?;
//!     println!("{:?}", outcome.as_response().map(Response::status));
//!     Ok(())
//! }
//!
//! async fn fetch(req: Request) -> Result<Response, BoxError> {
//!     Ok(Response::new(req.url(), StatusCode::OK))
//! }
//! ```

mod compat;
mod config;
mod context;
mod error;
mod executor;
mod fetch;
mod hook;
mod interceptor;
mod observer;
mod outcome;
mod registry;
mod request;
mod response;
mod trace;

pub use config::{Catalog, MiddlewareSettings, Slot};
pub use context::Context;
pub use error::{BoxError, Error, SharedError};
pub use executor::Executor;
pub use fetch::Fetch;
pub use hook::{HookKind, OnException, OnRequest, OnResponse};
pub use interceptor::Interceptor;
pub use observer::{LogObserver, MultiObserver, NoopObserver, Observer};
pub use outcome::{HookOutput, IntoHookOutput, IntoHookResult, Outcome};
pub use registry::Registry;
pub use request::Request;
pub use response::{Response, ResponseBuilder};
pub use trace::{ChainRecord, InvocationRecord, MANAGER_KIND, TraceEvent};
