//! Telemetry sinks for middleware events.
//!
//! | Backend | Description |
//! |---------|-------------|
//! | [`NoopObserver`]  | Discards everything |
//! | [`LogObserver`]   | Emits structured `tracing` events at debug level (default) |
//! | [`MultiObserver`] | Fan-out to several backends |
//!
//! Observers are fire-and-forget: they return nothing, and a panicking
//! observer is contained so it never changes a chain's outcome. Inside a
//! [`MultiObserver`] each backend is contained on its own, so one failing
//! backend does not starve the others.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::trace::TraceEvent;

/// Receiver of method- and chain-level middleware events.
pub trait Observer: Send + Sync {
    fn record_event(&self, event: &TraceEvent);

    /// Human-readable backend name, used when reporting sink failures.
    fn name(&self) -> &str;
}

/// Observer that discards every event.
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn record_event(&self, _event: &TraceEvent) {}

    fn name(&self) -> &str { "noop" }
}

/// Observer that logs events via `tracing`.
pub struct LogObserver;

impl Observer for LogObserver {
    fn record_event(&self, event: &TraceEvent) {
        match event {
            TraceEvent::MethodComplete(r) => {
                let error = r.error.as_ref().map(ToString::to_string).unwrap_or_default();
                debug!(
                    manager = r.manager,
                    hook = %r.hook,
                    middleware = %r.middleware,
                    duration_secs = r.duration_secs(),
                    error = error.as_str(),
                    cancelled = r.cancelled,
                    panicked = r.panicked,
                    "middleware method complete"
                );
            }
            TraceEvent::ChainComplete(r) => {
                let error = r.error.as_ref().map(ToString::to_string).unwrap_or_default();
                debug!(
                    manager = r.manager,
                    hook = %r.hook,
                    middlewares = ?r.middlewares,
                    count = r.count,
                    duration_secs = r.duration_secs(),
                    error = error.as_str(),
                    cancelled = r.cancelled,
                    panicked = r.panicked,
                    "middleware chain complete"
                );
            }
        }
    }

    fn name(&self) -> &str { "log" }
}

/// Observer that forwards every event to each of its backends in order.
pub struct MultiObserver {
    observers: Vec<Arc<dyn Observer>>,
}

impl MultiObserver {
    pub fn new(observers: Vec<Arc<dyn Observer>>) -> Self {
        Self { observers }
    }
}

impl Observer for MultiObserver {
    fn record_event(&self, event: &TraceEvent) {
        for observer in &self.observers {
            if panic::catch_unwind(AssertUnwindSafe(|| observer.record_event(event))).is_err() {
                warn!(observer = observer.name(), hook = %event.hook(), "observer backend panicked, event dropped");
            }
        }
    }

    fn name(&self) -> &str { "multi" }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::hook::HookKind;
    use crate::trace::{InvocationRecord, MANAGER_KIND};

    struct Failing;

    impl Observer for Failing {
        fn record_event(&self, _event: &TraceEvent) {
            panic!("backend down");
        }

        fn name(&self) -> &str { "failing" }
    }

    #[derive(Default)]
    struct Count(Mutex<usize>);

    impl Observer for Count {
        fn record_event(&self, _event: &TraceEvent) {
            *self.0.lock().unwrap() += 1;
        }

        fn name(&self) -> &str { "count" }
    }

    fn event() -> TraceEvent {
        TraceEvent::MethodComplete(InvocationRecord {
            manager: MANAGER_KIND,
            hook: HookKind::Request,
            middleware: Arc::from("Auth"),
            duration: std::time::Duration::from_millis(3),
            error: None,
            cancelled: false,
            panicked: false,
        })
    }

    #[test]
    fn multi_observer_isolates_each_backend() {
        let before = Arc::new(Count::default());
        let after = Arc::new(Count::default());
        let backends: Vec<Arc<dyn Observer>> = vec![
            before.clone() as Arc<dyn Observer>,
            Arc::new(Failing),
            Arc::new(Failing),
            after.clone() as Arc<dyn Observer>,
        ];
        let multi = MultiObserver::new(backends);

        multi.record_event(&event());
        multi.record_event(&event());

        assert_eq!(*before.0.lock().unwrap(), 2);
        assert_eq!(*after.0.lock().unwrap(), 2);
    }

    #[test]
    fn log_observer_accepts_every_event() {
        LogObserver.record_event(&event());
        NoopObserver.record_event(&event());
    }
}
