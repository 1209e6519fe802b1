//! Execution context optionally handed to hooks.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Execution-scoped information about the actor a fetch is made for.
///
/// Hooks opt in to receiving it by taking it as their last argument; see
/// [`OnRequest`](crate::OnRequest). Cloning is two atomic increments.
#[derive(Clone, Debug)]
pub struct Context {
    actor: Arc<str>,
    attributes: Arc<BTreeMap<String, String>>,
}

impl Context {
    pub fn new(actor: impl Into<Arc<str>>) -> Self {
        Self { actor: actor.into(), attributes: Arc::default() }
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        Arc::make_mut(&mut self.attributes).insert(key.to_owned(), value.to_owned());
        self
    }

    /// Name of the originating actor (crawler, spider, job).
    pub fn actor(&self) -> &str { &self.actor }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

impl Default for Context {
    fn default() -> Self { Self::new("default") }
}
