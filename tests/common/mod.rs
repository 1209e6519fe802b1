#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use http::StatusCode;
use sieve::{
    BoxError, ChainRecord, Error, HookKind, Interceptor, InvocationRecord, Observer, Request,
    Response, TraceEvent,
};

/// Shared, ordered log of which hooks ran.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Observer that keeps every event for later assertions.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<TraceEvent>>>);

impl Observer for Recorder {
    fn record_event(&self, event: &TraceEvent) {
        self.0.lock().unwrap().push(event.clone());
    }

    fn name(&self) -> &str { "recorder" }
}

impl Recorder {
    pub fn events(&self) -> Vec<TraceEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<InvocationRecord> {
        self.0.lock().unwrap().iter()
            .filter_map(|e| match e {
                TraceEvent::MethodComplete(r) => Some(r.clone()),
                TraceEvent::ChainComplete(_) => None,
            })
            .collect()
    }

    pub fn chains(&self) -> Vec<ChainRecord> {
        self.0.lock().unwrap().iter()
            .filter_map(|e| match e {
                TraceEvent::ChainComplete(r) => Some(r.clone()),
                TraceEvent::MethodComplete(_) => None,
            })
            .collect()
    }

    pub fn chain(&self, hook: HookKind) -> Option<ChainRecord> {
        self.chains().into_iter().find(|c| c.hook == hook)
    }
}

pub fn names(record: &ChainRecord) -> Vec<&str> {
    record.middlewares.iter().map(|n| &**n).collect()
}

pub fn url() -> &'static str {
    "https://example.com/page"
}

/// Interceptor with all three hooks, each of which only logs itself.
pub fn passthrough(name: &'static str, journal: &Journal) -> Interceptor {
    let (on_req, on_resp, on_exc) = (journal.clone(), journal.clone(), journal.clone());
    Interceptor::new(name)
        .on_request(move |_req: Request| {
            on_req.push(format!("{name}.request"));
            async {}
        })
        .on_response(move |_req: Request, resp: Response| {
            on_resp.push(format!("{name}.response"));
            async move { resp }
        })
        .on_exception(move |_req: Request, _err: Error| {
            on_exc.push(format!("{name}.exception"));
            async {}
        })
}

/// Transport that logs itself and answers `status`.
pub fn ok_fetch(
    journal: &Journal,
    status: StatusCode,
) -> impl FnOnce(Request) -> std::future::Ready<Result<Response, BoxError>> + Send + use<> {
    let journal = journal.clone();
    move |req: Request| {
        journal.push("fetch");
        std::future::ready(Ok(Response::new(req.url(), status)))
    }
}

/// Transport that logs itself and fails with `message`.
pub fn failing_fetch(
    journal: &Journal,
    message: &'static str,
) -> impl FnOnce(Request) -> std::future::Ready<Result<Response, BoxError>> + Send + use<> {
    let journal = journal.clone();
    move |_req: Request| {
        journal.push("fetch");
        std::future::ready(Err(message.into()))
    }
}
