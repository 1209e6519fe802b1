//! Minimal sieve example: an auth gate, a toy cache and a retry-on-error middleware
//! around a fake transport.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use http::StatusCode;
use sieve::{BoxError, Context, Error, Executor, Interceptor, Outcome, Registry, Request, Response};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let cache: Arc<Mutex<HashMap<String, Response>>> = Arc::default();

    let executor = Executor::new(Registry::new([auth(), caching(&cache), retry()])?)
        .with_context(Context::new("demo-crawler"));

    for url in ["https://example.com/a", "https://example.com/a", "https://example.com/flaky"] {
        let request = Request::get(url).with_header("authorization", "Bearer demo");
        match executor.download(transport, request).await? {
            Outcome::Response(resp) => println!("{url} → {}", resp.status()),
            Outcome::Request(req) => println!("{url} → reschedule {}", req.url()),
        }
    }
    Ok(())
}

// Answers 401 locally for requests without credentials.
fn auth() -> Interceptor {
    Interceptor::new("Auth").on_request(|req: Request| async move {
        if req.header("authorization").is_some() {
            return None;
        }
        Some(Response::new(req.url(), StatusCode::UNAUTHORIZED))
    })
}

// Serves repeated GETs from memory and stores every 200.
fn caching(store: &Arc<Mutex<HashMap<String, Response>>>) -> Interceptor {
    let read = Arc::clone(store);
    let write = Arc::clone(store);
    Interceptor::new("Cache")
        .on_request(move |req: Request| {
            let hit = read.lock().unwrap().get(req.url()).cloned();
            async move { hit }
        })
        .on_response(move |req: Request, resp: Response| {
            if resp.status() == StatusCode::OK {
                write.lock().unwrap().insert(req.url().to_owned(), resp.clone());
            }
            async move { resp }
        })
}

// Turns transport failures into a reschedule, at most once per request.
fn retry() -> Interceptor {
    Interceptor::new("Retry").on_exception(|req: Request, err: Error, cx: Context| async move {
        if req.meta("retried").is_some() {
            return None;
        }
        tracing::info!(actor = cx.actor(), url = req.url(), %err, "retrying");
        Some(req.with_meta("retried", "1"))
    })
}

async fn transport(req: Request) -> Result<Response, BoxError> {
    if req.url().ends_with("/flaky") {
        return Err("connection reset".into());
    }
    Ok(Response::builder(req.url()).header("content-type", "text/html").body("<html/>"))
}
