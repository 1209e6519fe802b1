//! Middleware settings and settings-driven registry assembly.
//!
//! Which middlewares are active, and in what order, comes from two tables
//! mapping a middleware name to its order: a base table shipped by the
//! application and a user table layered over it. A middleware is disabled by
//! setting it to `false`.
//!
//! ```toml
//! [downloader_middlewares_base]
//! UserAgent = 500
//! Retry = 550
//!
//! [downloader_middlewares]
//! Auth = 100
//! Retry = false
//! ```
//!
//! Lower orders sit closer to the engine, higher ones closer to the
//! transport. Equal orders are broken by name so the result never depends on
//! table iteration order.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::Error;
use crate::interceptor::Interceptor;
use crate::registry::Registry;

/// One entry of a middleware table.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum Slot {
    Order(i64),
    /// Only `false` is meaningful: it disables the middleware.
    Enabled(bool),
}

/// The `downloader_middlewares*` tables.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MiddlewareSettings {
    #[serde(default)]
    pub downloader_middlewares_base: BTreeMap<String, Slot>,
    #[serde(default)]
    pub downloader_middlewares: BTreeMap<String, Slot>,
}

impl MiddlewareSettings {
    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        toml::from_str(source).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Active middleware names, lowest order first.
    pub fn component_list(&self) -> Result<Vec<String>, Error> {
        let mut merged = self.downloader_middlewares_base.clone();
        merged.extend(self.downloader_middlewares.iter().map(|(k, v)| (k.clone(), *v)));

        let mut active = Vec::with_capacity(merged.len());
        for (name, slot) in merged {
            match slot {
                Slot::Order(order) => active.push((order, name)),
                Slot::Enabled(false) => {}
                Slot::Enabled(true) => {
                    return Err(Error::Config(format!(
                        "middleware {name}: expected an integer order or `false`, got `true`"
                    )));
                }
            }
        }
        active.sort();
        Ok(active.into_iter().map(|(_, name)| name).collect())
    }
}

// ── Catalog ───────────────────────────────────────────────────────────────────

type Factory = Box<dyn Fn() -> Option<Interceptor> + Send + Sync>;

/// Named interceptor factories that settings can refer to.
///
/// A factory returning `None` declines to run under the current
/// configuration; the middleware is then skipped rather than failing startup.
#[derive(Default)]
pub struct Catalog {
    factories: HashMap<String, Factory>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`. Returns `self` for chaining.
    pub fn register(
        mut self,
        name: &str,
        factory: impl Fn() -> Option<Interceptor> + Send + Sync + 'static,
    ) -> Self {
        self.factories.insert(name.to_owned(), Box::new(factory));
        self
    }
}

impl Registry {
    /// Builds the registry for the middlewares `settings` enable, in the
    /// order they specify.
    pub fn from_settings(settings: &MiddlewareSettings, catalog: &Catalog) -> Result<Self, Error> {
        let mut interceptors = Vec::new();
        let mut enabled = Vec::new();
        for name in settings.component_list()? {
            let factory = catalog.factories.get(&name)
                .ok_or_else(|| Error::Config(format!("unknown middleware {name}")))?;
            match factory() {
                Some(interceptor) => {
                    enabled.push(name);
                    interceptors.push(interceptor);
                }
                None => info!(middleware = %name, "middleware not configured, skipping"),
            }
        }
        info!(middlewares = ?enabled, "enabled downloader middlewares");
        Self::new(interceptors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HookKind, Request};

    fn named(name: &'static str) -> impl Fn() -> Option<Interceptor> + Send + Sync + 'static {
        move || Some(Interceptor::new(name).on_request(|_req: Request| async {}))
    }

    #[test]
    fn user_table_overrides_base_and_disables() {
        let settings = MiddlewareSettings::from_toml_str(
            r#"
            [downloader_middlewares_base]
            UserAgent = 500
            Retry = 550
            Cookies = 700

            [downloader_middlewares]
            Auth = 100
            Retry = false
            Cookies = 50
            "#,
        )
        .unwrap();

        assert_eq!(settings.component_list().unwrap(), ["Cookies", "Auth", "UserAgent"]);
    }

    #[test]
    fn equal_orders_are_broken_by_name() {
        let settings = MiddlewareSettings::from_toml_str("[downloader_middlewares]\nb = 1\na = 1\n").unwrap();
        assert_eq!(settings.component_list().unwrap(), ["a", "b"]);
    }

    #[test]
    fn true_is_not_an_order() {
        let settings = MiddlewareSettings::from_toml_str("[downloader_middlewares]\nAuth = true\n").unwrap();
        assert!(matches!(settings.component_list(), Err(Error::Config(_))));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        assert!(matches!(
            MiddlewareSettings::from_toml_str("[downloader_middlewares]\nAuth = \"high\"\n"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn registry_follows_settings_and_skips_unconfigured() {
        let settings = MiddlewareSettings::from_toml_str(
            "[downloader_middlewares]\nCache = 900\nAuth = 100\nProxy = 750\n",
        )
        .unwrap();
        let catalog = Catalog::new()
            .register("Auth", named("Auth"))
            .register("Cache", named("Cache"))
            .register("Proxy", || None);

        let registry = Registry::from_settings(&settings, &catalog).unwrap();
        assert_eq!(registry.middlewares(HookKind::Request), ["Auth", "Cache"]);
    }

    #[test]
    fn unknown_middleware_fails_startup() {
        let settings = MiddlewareSettings::from_toml_str("[downloader_middlewares]\nGhost = 1\n").unwrap();
        let err = Registry::from_settings(&settings, &Catalog::new()).err().unwrap();
        assert!(matches!(err, Error::Config(msg) if msg.contains("Ghost")));
    }
}
