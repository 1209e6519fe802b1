//! Capability registry: the ordered hook lists.
//!
//! Built once from an ordered list of [`Interceptor`]s and immutable
//! afterwards, so every concurrent chain reads it without synchronisation.
//!
//! Request hooks are kept in registration order. Response and exception hooks
//! are pushed to the front, so they run in reverse registration order: the
//! interceptor registered last sits closest to the transport, sees the request
//! last and the response first.
//!
//! ```text
//! register [A, B, C]
//!   request    A → B → C → fetch
//!   response   C → B → A → caller
//!   exception  C → B → A
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::Error;
use crate::hook::{BoxedHook, HookKind};
use crate::interceptor::Interceptor;
use crate::request::Request;
use crate::response::Response;

/// One hook of one interceptor, with the name it is reported under.
pub(crate) struct RegisteredHook<I> {
    middleware: Arc<str>,
    hook: BoxedHook<I>,
}

impl<I> RegisteredHook<I> {
    fn new(middleware: &Arc<str>, hook: BoxedHook<I>) -> Self {
        Self { middleware: Arc::clone(middleware), hook }
    }

    pub(crate) fn middleware(&self) -> &Arc<str> {
        &self.middleware
    }

    pub(crate) fn hook(&self) -> &BoxedHook<I> {
        &self.hook
    }
}

/// The ordered hook lists of every registered interceptor.
pub struct Registry {
    request: Vec<RegisteredHook<Request>>,
    response: VecDeque<RegisteredHook<(Request, Response)>>,
    exception: VecDeque<RegisteredHook<(Request, Error)>>,
}

impl Registry {
    /// Registers `interceptors` in the given order.
    ///
    /// Fails fast if an interceptor has an empty name, since names are what
    /// telemetry and errors identify middlewares by.
    pub fn new(interceptors: impl IntoIterator<Item = Interceptor>) -> Result<Self, Error> {
        let mut registry = Self {
            request: Vec::new(),
            response: VecDeque::new(),
            exception: VecDeque::new(),
        };
        for (position, interceptor) in interceptors.into_iter().enumerate() {
            registry.add(position, interceptor)?;
        }
        Ok(registry)
    }

    fn add(&mut self, position: usize, interceptor: Interceptor) -> Result<(), Error> {
        let Interceptor { name, on_request, on_response, on_exception } = interceptor;
        if name.trim().is_empty() {
            return Err(Error::Config(format!("interceptor at position {position} has no name")));
        }
        if let Some(hook) = on_request {
            self.request.push(RegisteredHook::new(&name, hook));
        }
        if let Some(hook) = on_response {
            self.response.push_front(RegisteredHook::new(&name, hook));
        }
        if let Some(hook) = on_exception {
            self.exception.push_front(RegisteredHook::new(&name, hook));
        }
        Ok(())
    }

    /// Middleware names in the order their `kind` hooks run.
    pub fn middlewares(&self, kind: HookKind) -> Vec<&str> {
        match kind {
            HookKind::Request   => self.request.iter().map(|h| &*h.middleware).collect(),
            HookKind::Response  => self.response.iter().map(|h| &*h.middleware).collect(),
            HookKind::Exception => self.exception.iter().map(|h| &*h.middleware).collect(),
        }
    }

    /// Whether `middleware`'s `kind` hook takes a [`Context`](crate::Context).
    /// `None` if that middleware registered no such hook.
    pub fn requires_context(&self, kind: HookKind, middleware: &str) -> Option<bool> {
        fn find<'a, I: 'a>(hooks: impl IntoIterator<Item = &'a RegisteredHook<I>>, name: &str) -> Option<bool> {
            hooks.into_iter()
                .find(|h| &*h.middleware == name)
                .map(|h| h.hook.wants_context())
        }

        match kind {
            HookKind::Request   => find(&self.request, middleware),
            HookKind::Response  => find(&self.response, middleware),
            HookKind::Exception => find(&self.exception, middleware),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.request.is_empty() && self.response.is_empty() && self.exception.is_empty()
    }

    pub(crate) fn request_hooks(&self) -> impl Iterator<Item = &RegisteredHook<Request>> {
        self.request.iter()
    }

    pub(crate) fn response_hooks(&self) -> impl Iterator<Item = &RegisteredHook<(Request, Response)>> {
        self.response.iter()
    }

    pub(crate) fn exception_hooks(&self) -> impl Iterator<Item = &RegisteredHook<(Request, Error)>> {
        self.exception.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Context;

    fn full(name: &str) -> Interceptor {
        Interceptor::new(name)
            .on_request(|_req: Request| async {})
            .on_response(|_req: Request, resp: Response| async move { resp })
            .on_exception(|_req: Request, _err: Error| async {})
    }

    #[test]
    fn request_hooks_keep_order_response_and_exception_reverse_it() {
        let registry = Registry::new([full("A"), full("B"), full("C")]).unwrap();

        assert_eq!(registry.middlewares(HookKind::Request), ["A", "B", "C"]);
        assert_eq!(registry.middlewares(HookKind::Response), ["C", "B", "A"]);
        assert_eq!(registry.middlewares(HookKind::Exception), ["C", "B", "A"]);
    }

    #[test]
    fn only_present_hooks_are_registered() {
        let auth = Interceptor::new("Auth").on_request(|_req: Request| async {});
        let cache = Interceptor::new("Cache")
            .on_request(|_req: Request| async {})
            .on_response(|_req: Request, resp: Response| async move { resp });

        let registry = Registry::new([auth, cache]).unwrap();

        assert_eq!(registry.middlewares(HookKind::Request), ["Auth", "Cache"]);
        assert_eq!(registry.middlewares(HookKind::Response), ["Cache"]);
        assert!(registry.middlewares(HookKind::Exception).is_empty());
    }

    #[test]
    fn context_requirement_follows_declared_parameters() {
        let interceptor = Interceptor::new("Stats")
            .on_request(|_req: Request, _cx: Context| async {})
            .on_response(|_req: Request, resp: Response| async move { resp });

        let registry = Registry::new([interceptor]).unwrap();

        assert_eq!(registry.requires_context(HookKind::Request, "Stats"), Some(true));
        assert_eq!(registry.requires_context(HookKind::Response, "Stats"), Some(false));
        assert_eq!(registry.requires_context(HookKind::Exception, "Stats"), None);
    }

    #[test]
    fn unnamed_interceptor_is_rejected() {
        let err = Registry::new([full("A"), Interceptor::new("  ")]).err().unwrap();
        assert!(matches!(err, Error::Config(msg) if msg.contains("position 1")));
    }

    #[test]
    fn empty_registry() {
        assert!(Registry::new(Vec::<Interceptor>::new()).unwrap().is_empty());
    }
}
