//! Invocation tracing.
//!
//! Every hook call produces one [`InvocationRecord`] and every chain run one
//! [`ChainRecord`]. Both are emitted from `Drop`, so they go out exactly once
//! on every exit path: normal return, short-circuit, error propagation, and
//! also when the task driving the chain is cancelled mid-way, in which case
//! the record carries `cancelled: true`. A scope dropped while a hook panics
//! carries `panicked: true` instead.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::error::Error;
use crate::hook::HookKind;
use crate::observer::{LogObserver, Observer};
use crate::outcome::Outcome;

/// Manager kind reported with every event.
pub const MANAGER_KIND: &str = "downloader middleware";

// ── Records ───────────────────────────────────────────────────────────────────

/// One completed hook call.
#[derive(Clone, Debug)]
pub struct InvocationRecord {
    pub manager: &'static str,
    pub hook: HookKind,
    pub middleware: Arc<str>,
    pub duration: Duration,
    pub error: Option<Error>,
    pub cancelled: bool,
    pub panicked: bool,
}

/// One completed chain run.
#[derive(Clone, Debug)]
pub struct ChainRecord {
    pub manager: &'static str,
    pub hook: HookKind,
    /// The request the chain ran for, or for response chains the value the
    /// chain resolved to.
    pub subject: Outcome,
    /// Middlewares whose hook was invoked, in invocation order.
    pub middlewares: Vec<Arc<str>>,
    pub count: usize,
    pub started_at: Instant,
    pub duration: Duration,
    pub error: Option<Error>,
    pub cancelled: bool,
    pub panicked: bool,
}

impl InvocationRecord {
    pub fn duration_secs(&self) -> f64 { self.duration.as_secs_f64() }
}

impl ChainRecord {
    pub fn duration_secs(&self) -> f64 { self.duration.as_secs_f64() }
}

/// Event delivered to an [`Observer`].
#[derive(Clone, Debug)]
pub enum TraceEvent {
    MethodComplete(InvocationRecord),
    ChainComplete(ChainRecord),
}

impl TraceEvent {
    pub fn hook(&self) -> HookKind {
        match self {
            Self::MethodComplete(r) => r.hook,
            Self::ChainComplete(r) => r.hook,
        }
    }
}

// ── Tracer ────────────────────────────────────────────────────────────────────

/// Hands records to the configured observer and contains its failures.
#[derive(Clone)]
pub(crate) struct Tracer {
    observer: Arc<dyn Observer>,
}

impl Tracer {
    pub(crate) fn new(observer: Arc<dyn Observer>) -> Self {
        Self { observer }
    }

    pub(crate) fn chain(&self, hook: HookKind, subject: Outcome) -> ChainScope<'_> {
        ChainScope {
            tracer: self,
            hook,
            subject: Some(subject),
            middlewares: Vec::new(),
            started_at: Instant::now(),
            error: None,
            finished: false,
        }
    }

    pub(crate) fn invocation(&self, hook: HookKind, middleware: &Arc<str>) -> InvocationScope<'_> {
        InvocationScope {
            tracer: self,
            hook,
            middleware: Arc::clone(middleware),
            started_at: Instant::now(),
            error: None,
            finished: false,
        }
    }

    fn emit(&self, event: TraceEvent) {
        let observer = &self.observer;
        if panic::catch_unwind(AssertUnwindSafe(|| observer.record_event(&event))).is_err() {
            warn!(observer = observer.name(), hook = %event.hook(), "trace observer panicked, event dropped");
        }
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new(Arc::new(LogObserver))
    }
}

// ── Scopes ────────────────────────────────────────────────────────────────────

/// Open chain record. Emits a [`ChainRecord`] when dropped.
pub(crate) struct ChainScope<'a> {
    tracer: &'a Tracer,
    hook: HookKind,
    subject: Option<Outcome>,
    middlewares: Vec<Arc<str>>,
    started_at: Instant,
    error: Option<Error>,
    finished: bool,
}

impl ChainScope<'_> {
    /// Notes that `middleware`'s hook is about to run.
    pub(crate) fn enter(&mut self, middleware: &Arc<str>) {
        self.middlewares.push(Arc::clone(middleware));
    }

    pub(crate) fn set_subject(&mut self, subject: Outcome) {
        self.subject = Some(subject);
    }

    pub(crate) fn finish(mut self, error: Option<&Error>) {
        self.error = error.cloned();
        self.finished = true;
    }
}

impl Drop for ChainScope<'_> {
    fn drop(&mut self) {
        let Some(subject) = self.subject.take() else { return };
        let middlewares = std::mem::take(&mut self.middlewares);
        let panicked = !self.finished && std::thread::panicking();
        let record = ChainRecord {
            manager: MANAGER_KIND,
            hook: self.hook,
            subject,
            count: middlewares.len(),
            middlewares,
            started_at: self.started_at,
            duration: self.started_at.elapsed(),
            error: self.error.take(),
            cancelled: !self.finished && !panicked,
            panicked,
        };
        self.tracer.emit(TraceEvent::ChainComplete(record));
    }
}

/// Open invocation record. Emits an [`InvocationRecord`] when dropped.
pub(crate) struct InvocationScope<'a> {
    tracer: &'a Tracer,
    hook: HookKind,
    middleware: Arc<str>,
    started_at: Instant,
    error: Option<Error>,
    finished: bool,
}

impl InvocationScope<'_> {
    pub(crate) fn finish(mut self, error: Option<&Error>) {
        self.error = error.cloned();
        self.finished = true;
    }
}

impl Drop for InvocationScope<'_> {
    fn drop(&mut self) {
        let panicked = !self.finished && std::thread::panicking();
        let record = InvocationRecord {
            manager: MANAGER_KIND,
            hook: self.hook,
            middleware: Arc::clone(&self.middleware),
            duration: self.started_at.elapsed(),
            error: self.error.take(),
            cancelled: !self.finished && !panicked,
            panicked,
        };
        self.tracer.emit(TraceEvent::MethodComplete(record));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::Request;

    #[derive(Default)]
    struct Collect(Mutex<Vec<TraceEvent>>);

    impl Observer for Collect {
        fn record_event(&self, event: &TraceEvent) {
            self.0.lock().unwrap().push(event.clone());
        }

        fn name(&self) -> &str { "collect" }
    }

    struct Panicking;

    impl Observer for Panicking {
        fn record_event(&self, _event: &TraceEvent) {
            panic!("sink down");
        }

        fn name(&self) -> &str { "panicking" }
    }

    fn subject() -> Outcome {
        Outcome::Request(Request::get("https://example.com/"))
    }

    #[test]
    fn finished_chain_reports_names_and_error() {
        let sink = Arc::new(Collect::default());
        let tracer = Tracer::new(sink.clone());
        let name: Arc<str> = Arc::from("Auth");

        let mut chain = tracer.chain(HookKind::Request, subject());
        chain.enter(&name);
        chain.finish(Some(&Error::InvalidState("boom")));

        let events = sink.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        let TraceEvent::ChainComplete(record) = &events[0] else { panic!("expected chain event") };
        assert_eq!(record.count, 1);
        assert_eq!(&*record.middlewares[0], "Auth");
        assert!(matches!(record.error, Some(Error::InvalidState("boom"))));
        assert!(!record.cancelled);
    }

    #[test]
    fn dropped_scopes_are_reported_as_cancelled() {
        let sink = Arc::new(Collect::default());
        let tracer = Tracer::new(sink.clone());
        let name: Arc<str> = Arc::from("Slow");

        {
            let mut chain = tracer.chain(HookKind::Response, subject());
            chain.enter(&name);
            let _call = tracer.invocation(HookKind::Response, &name);
        }

        let events = sink.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], TraceEvent::MethodComplete(r) if r.cancelled && !r.panicked));
        assert!(matches!(&events[1], TraceEvent::ChainComplete(r) if r.cancelled && r.count == 1));
    }

    #[test]
    fn scopes_unwound_by_a_panic_are_not_reported_as_cancelled() {
        let sink = Arc::new(Collect::default());
        let tracer = Tracer::new(sink.clone());
        let name: Arc<str> = Arc::from("Buggy");

        let unwound = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut chain = tracer.chain(HookKind::Request, subject());
            chain.enter(&name);
            let _call = tracer.invocation(HookKind::Request, &name);
            panic!("hook bug");
        }));
        assert!(unwound.is_err());

        let events = sink.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], TraceEvent::MethodComplete(r) if r.panicked && !r.cancelled));
        assert!(matches!(&events[1], TraceEvent::ChainComplete(r) if r.panicked && !r.cancelled));
    }

    #[test]
    fn panicking_observer_is_contained() {
        let tracer = Tracer::new(Arc::new(Panicking));
        let name: Arc<str> = Arc::from("Auth");

        tracer.invocation(HookKind::Request, &name).finish(None);
        tracer.chain(HookKind::Request, subject()).finish(None);
    }
}
