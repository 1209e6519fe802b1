//! Blocking entry point for callers that predate the async executor.

use std::collections::HashSet;
use std::future::Future;
use std::panic::Location;
use std::sync::{LazyLock, Mutex, PoisonError};

use tokio::runtime::{Builder, Handle, RuntimeFlavor};
use tracing::warn;

use crate::context::Context;
use crate::error::{BoxError, Error};
use crate::executor::Executor;
use crate::outcome::Outcome;
use crate::request::Request;
use crate::response::Response;

/// Call sites already warned about, for the whole process.
static WARNED: LazyLock<Mutex<HashSet<&'static Location<'static>>>> = LazyLock::new(Mutex::default);

/// Returns `true` the first time `site` is seen.
fn first_visit(site: &'static Location<'static>) -> bool {
    WARNED.lock().unwrap_or_else(PoisonError::into_inner).insert(site)
}

impl Executor {
    /// Blocking form of [`download`](Executor::download) for callers whose
    /// transport takes the context as a second argument.
    ///
    /// `context` replaces the executor's own for this call. Outside a tokio
    /// runtime a current-thread runtime is built for the call; inside a
    /// multi-threaded runtime the worker is handed over with
    /// [`block_in_place`](tokio::task::block_in_place). A current-thread
    /// runtime cannot be blocked on and yields [`Error::InvalidState`].
    ///
    /// A deprecation warning is logged once per calling location.
    #[deprecated(note = "use `Executor::download` with a single-argument fetch instead")]
    #[track_caller]
    pub fn download_blocking<F, Fut, E>(
        &self,
        fetch: F,
        request: Request,
        context: Context,
    ) -> Result<Outcome, Error>
    where
        F: FnOnce(Request, Context) -> Fut + Send,
        Fut: Future<Output = Result<Response, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let site = Location::caller();
        if first_visit(site) {
            warn!(
                caller = %site,
                "Executor::download_blocking() is deprecated, use Executor::download() instead"
            );
        }

        let scoped = self.clone().with_context(context.clone());
        block_on(scoped.download(move |req: Request| fetch(req, context), request))
    }
}

fn block_on<T>(fut: impl Future<Output = Result<T, Error>>) -> Result<T, Error> {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::CurrentThread => Err(Error::InvalidState(
            "download_blocking cannot block a current-thread runtime",
        )),
        Ok(handle) => tokio::task::block_in_place(|| handle.block_on(fut)),
        Err(_) => Builder::new_current_thread().enable_all().build()?.block_on(fut),
    }
}
