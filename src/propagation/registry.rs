//! Ordered propagator registry.
//!
//! # Responsibilities
//! - Keep the propagators of a process in registration order
//! - Apply all of them as a unit on every inject and extract
//! - Stop at the first failing propagator
//!
//! # Design Decisions
//! - Inject keeps headers written before a failure (each field is independent)
//! - Extract is all-or-nothing: a failure discards the partially built context
//! - One mutex covers configuration and every call; it is never held across
//!   an `.await`, and codecs are pure, so the hold is short

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use http::HeaderMap;

use crate::config::validation::check_collisions;
use crate::config::RegistryConfig;
use crate::context::Context;
use crate::error::{ConfigError, Error};
use crate::propagation::Propagator;

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Handle to an ordered list of propagators.
///
/// Clones share the same list. Configure it once at startup, symmetrically on
/// both peers, then use it from any number of threads.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    config: RegistryConfig,
    propagators: Mutex<Vec<Box<dyn Propagator>>>,
}

impl Registry {
    /// Create an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with the given configuration.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                propagators: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Process-wide registry used by [`crate::configure`], [`crate::inject`]
    /// and [`crate::extract`].
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::new)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Append `propagators` after those already registered.
    ///
    /// Calls are cumulative. If any propagator in the batch is rejected,
    /// none of them is appended.
    pub fn configure<I>(&self, propagators: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = Box<dyn Propagator>>,
    {
        let batch: Vec<Box<dyn Propagator>> = propagators.into_iter().collect();
        let mut registered = self.lock();

        check_collisions(
            &self.inner.config,
            registered.iter().map(|p| p.header_name()),
            batch.iter().map(|p| (p.name(), p.header_name())),
        )?;

        for p in &batch {
            tracing::info!(propagator = p.name(), header = %p.header_name(), "Propagator registered");
        }
        registered.extend(batch);
        Ok(())
    }

    /// Append a single propagator.
    pub fn register<P>(&self, propagator: P) -> Result<(), ConfigError>
    where
        P: Propagator + 'static,
    {
        self.configure([propagator.boxed()])
    }

    /// Write every registered value of `cx` into `headers`.
    ///
    /// Stops at the first failing propagator; headers written by the ones
    /// before it stay set.
    pub fn inject(&self, cx: &Context, headers: &mut HeaderMap) -> Result<(), Error> {
        let propagators = self.lock();
        for p in propagators.iter() {
            if let Err(e) = p.inject(cx, headers) {
                tracing::debug!(propagator = p.name(), error = %e, "Inject stopped");
                return Err(Error::Inject(e));
            }
        }
        Ok(())
    }

    /// Fold every registered header of `headers` into `cx`.
    ///
    /// Each propagator sees the context as extended by the ones before it.
    /// On failure the partially extended context is dropped.
    pub fn extract(&self, cx: Context, headers: &HeaderMap) -> Result<Context, Error> {
        let propagators = self.lock();
        let mut cx = cx;
        for p in propagators.iter() {
            cx = p.extract(cx, headers).map_err(|e| {
                tracing::debug!(propagator = p.name(), error = %e, "Extract stopped");
                Error::Extract(e)
            })?;
        }
        Ok(cx)
    }

    /// Names of the registered propagators, in order.
    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The list is append-only, so a panic inside a codec cannot leave it
    // half-written; keep serving after poisoning.
    fn lock(&self) -> MutexGuard<'_, Vec<Box<dyn Propagator>>> {
        self.inner
            .propagators
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.inner.config)
            .field("propagators", &self.names())
            .finish()
    }
}

/// Append propagators to the process-wide registry.
pub fn configure<I>(propagators: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = Box<dyn Propagator>>,
{
    Registry::global().configure(propagators)
}

/// Inject `cx` into `headers` with the process-wide registry.
pub fn inject(cx: &Context, headers: &mut HeaderMap) -> Result<(), Error> {
    Registry::global().inject(cx, headers)
}

/// Extract `headers` into `cx` with the process-wide registry.
pub fn extract(cx: Context, headers: &HeaderMap) -> Result<Context, Error> {
    Registry::global().extract(cx, headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextKey;
    use crate::error::{BoxError, PropagatorError};
    use crate::propagation::ValuePropagator;

    #[test]
    fn configure_is_cumulative_and_ordered() {
        let a: ContextKey<String> = ContextKey::new("a");
        let b: ContextKey<String> = ContextKey::new("b");
        let registry = Registry::new();

        registry.register(ValuePropagator::json("a", &a).unwrap()).unwrap();
        registry
            .configure([ValuePropagator::json("b", &b).unwrap().boxed()])
            .unwrap();

        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn rejected_batch_appends_nothing() {
        let a: ContextKey<String> = ContextKey::new("a");
        let registry = Registry::new();
        registry.register(ValuePropagator::json("a", &a).unwrap()).unwrap();

        let err = registry
            .configure([
                ValuePropagator::json("c", &a).unwrap().boxed(),
                ValuePropagator::json("a", &a).unwrap().boxed(),
            ])
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName { .. }));
        assert_eq!(registry.names(), vec!["a"]);
    }

    #[test]
    fn lenient_registry_keeps_duplicates() {
        let a: ContextKey<String> = ContextKey::new("a");
        let registry = Registry::with_config(RegistryConfig {
            reject_duplicate_names: false,
        });
        registry.register(ValuePropagator::json("a", &a).unwrap()).unwrap();
        registry.register(ValuePropagator::json("a", &a).unwrap()).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn clones_share_the_list() {
        let a: ContextKey<String> = ContextKey::new("a");
        let registry = Registry::new();
        let handle = registry.clone();
        handle.register(ValuePropagator::json("a", &a).unwrap()).unwrap();
        assert!(!registry.is_empty());
    }

    #[test]
    fn extract_threads_context_in_order() {
        let user: ContextKey<String> = ContextKey::new("user");
        let greeting: ContextKey<String> = ContextKey::new("greeting");

        // Decodes its payload as a greeting for whoever "user" holds.
        let greet = move |cx: &Context, key: &ContextKey<String>, data: &[u8]| -> Result<Context, BoxError> {
            let who = cx.get(&user).ok_or("user not decoded yet")?;
            let word = std::str::from_utf8(data)?;
            Ok(cx.with_value(key, format!("{word}, {who}")))
        };
        let raw = |cx: &Context, key: &ContextKey<String>| -> Result<Vec<u8>, BoxError> {
            Ok(cx.get(key).map(|s| s.as_bytes().to_vec()).unwrap_or_default())
        };

        let registry = Registry::new();
        registry
            .configure([
                ValuePropagator::json("user", &user).unwrap().boxed(),
                ValuePropagator::new("greeting", &greeting, raw, greet).unwrap().boxed(),
            ])
            .unwrap();

        let sent = Context::new()
            .with_value(&user, "ada".to_string())
            .with_value(&greeting, "hello".to_string());
        let mut headers = HeaderMap::new();
        registry.inject(&sent, &mut headers).unwrap();

        let received = registry.extract(Context::new(), &headers).unwrap();
        assert_eq!(received.get(&greeting).map(String::as_str), Some("hello, ada"));
    }

    #[test]
    fn inject_error_is_wrapped_with_call_label() {
        let key: ContextKey<String> = ContextKey::new("k");
        let failing = |_: &Context, _: &ContextKey<String>| -> Result<Vec<u8>, BoxError> {
            Err("failed!".into())
        };
        let registry = Registry::new();
        registry
            .register(ValuePropagator::new("encode", &key, failing, crate::codec::JsonCodec).unwrap())
            .unwrap();

        let err = registry.inject(&Context::new(), &mut HeaderMap::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "inject context values: encode context value `encode`: failed!"
        );
        assert!(matches!(err.propagator_error(), PropagatorError::Encode { .. }));
    }

    #[test]
    fn survives_a_panicking_codec_and_serves_threads() {
        let key: ContextKey<String> = ContextKey::new("str");
        let boom: ContextKey<String> = ContextKey::new("boom");
        let panicking = |cx: &Context, key: &ContextKey<String>| -> Result<Vec<u8>, BoxError> {
            match cx.get(key) {
                Some(_) => panic!("codec bug"),
                None => Ok(Vec::new()),
            }
        };

        let registry = Registry::new();
        registry
            .configure([
                ValuePropagator::json("str", &key).unwrap().boxed(),
                ValuePropagator::new("boom", &boom, panicking, crate::codec::JsonCodec)
                    .unwrap()
                    .boxed(),
            ])
            .unwrap();

        let handle = registry.clone();
        let crashed = std::thread::spawn(move || {
            let cx = Context::new().with_value(&boom, "x".to_string());
            let _ = handle.inject(&cx, &mut HeaderMap::new());
        })
        .join();
        assert!(crashed.is_err());
        assert!(registry.inner.propagators.is_poisoned());

        let workers: Vec<_> = (0..8)
            .map(|i| {
                let handle = registry.clone();
                std::thread::spawn(move || {
                    let sent = Context::new().with_value(&key, format!("v{i}"));
                    let mut headers = HeaderMap::new();
                    handle.inject(&sent, &mut headers).unwrap();
                    let received = handle.extract(Context::new(), &headers).unwrap();
                    received.get(&key).cloned()
                })
            })
            .collect();

        for (i, worker) in workers.into_iter().enumerate() {
            assert_eq!(worker.join().unwrap(), Some(format!("v{i}")));
        }
        assert_eq!(registry.names(), vec!["str", "boom"]);
    }

    #[test]
    fn handles_expose_their_config() {
        let strict = Registry::new();
        assert!(strict.config().reject_duplicate_names);

        let lenient = Registry::with_config(RegistryConfig {
            reject_duplicate_names: false,
        });
        assert!(!lenient.clone().config().reject_duplicate_names);
    }

    #[test]
    fn empty_registry_is_a_no_op() {
        let registry = Registry::new();
        let mut headers = HeaderMap::new();
        registry.inject(&Context::new(), &mut headers).unwrap();
        assert!(headers.is_empty());

        let cx = registry.extract(Context::new(), &headers).unwrap();
        assert!(cx.is_empty());
    }
}
