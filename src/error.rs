//! Unified error type.

use std::error::Error as StdError;
use std::sync::Arc;

use crate::hook::HookKind;

/// Boxed error accepted from hooks and transports.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Shared form of a [`BoxError`], so one failure can be recorded in
/// telemetry, handed to exception hooks and still be returned verbatim.
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// The error type returned by the middleware chains.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    /// A hook produced a value outside the return set allowed for its kind.
    #[error("middleware {middleware} must return {expected} from {hook}, got {got}")]
    TypeMismatch {
        middleware: Arc<str>,
        hook: HookKind,
        expected: &'static str,
        got: &'static str,
    },

    /// The chains were driven in a way that cannot happen in a correct
    /// orchestration.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// A hook raised an error.
    #[error("{hook} of middleware {middleware} failed: {source}")]
    Hook {
        middleware: Arc<str>,
        hook: HookKind,
        #[source]
        source: SharedError,
    },

    /// The transport raised an error.
    #[error("fetch failed: {0}")]
    Fetch(#[source] SharedError),

    /// Middleware settings could not be loaded or assembled.
    #[error("middleware configuration: {0}")]
    Config(String),

    /// No runtime could be obtained for a blocking call.
    #[error("runtime: {0}")]
    Runtime(#[source] Arc<std::io::Error>),
}

impl Error {
    pub(crate) fn hook(hook: HookKind, middleware: &Arc<str>, source: BoxError) -> Self {
        Self::Hook { middleware: Arc::clone(middleware), hook, source: Arc::from(source) }
    }

    pub(crate) fn fetch(source: BoxError) -> Self {
        Self::Fetch(Arc::from(source))
    }

    /// Searches the wrapped hook or transport error, and everything it wraps,
    /// for an error of type `T`.
    ///
    /// ```rust
    /// # use sieve::Error;
    /// # fn is_timeout(err: &Error) -> bool {
    /// err.find_source::<std::io::Error>()
    ///     .is_some_and(|e| e.kind() == std::io::ErrorKind::TimedOut)
    /// # }
    /// ```
    pub fn find_source<T: StdError + 'static>(&self) -> Option<&T> {
        let mut current: Option<&(dyn StdError + 'static)> = match self {
            Self::Hook { source, .. } | Self::Fetch(source) => Some(&**source),
            _ => None,
        };
        while let Some(err) = current {
            if let Some(found) = err.downcast_ref::<T>() {
                return Some(found);
            }
            current = err.source();
        }
        None
    }

    /// Name of the middleware the error is attributed to, if any.
    pub fn middleware(&self) -> Option<&str> {
        match self {
            Self::TypeMismatch { middleware, .. } | Self::Hook { middleware, .. } => Some(&**middleware),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Runtime(Arc::new(e))
    }
}
