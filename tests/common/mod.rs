//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::LazyLock;

use axum::Router;
use ctxwire::{BoxError, Context, ContextKey, Propagator, Registry, ValuePropagator};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// Keys shared by the client and server side of a test.
pub struct Keys {
    pub str: ContextKey<String>,
    pub int: ContextKey<i64>,
    pub log: ContextKey<LogState>,
}

pub static KEYS: LazyLock<Keys> = LazyLock::new(|| Keys {
    str: ContextKey::new("str"),
    int: ContextKey::new("int"),
    log: ContextKey::new("log"),
});

/// One structured log record; unset fields are left out of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl LogEntry {
    pub fn service(v: &str) -> Self {
        Self { service: Some(v.into()), ..Self::default() }
    }

    pub fn index(v: &str) -> Self {
        Self { index: Some(v.into()), ..Self::default() }
    }

    pub fn user_token(v: &str) -> Self {
        Self { user_token: Some(v.into()), ..Self::default() }
    }

    pub fn latency_ms(v: u64) -> Self {
        Self { latency_ms: Some(v), ..Self::default() }
    }

    /// Later attributes win over earlier ones.
    fn overlay(&mut self, other: &LogEntry) {
        if other.service.is_some() {
            self.service = other.service.clone();
        }
        if other.index.is_some() {
            self.index = other.index.clone();
        }
        if other.user_token.is_some() {
            self.user_token = other.user_token.clone();
        }
        if other.latency_ms.is_some() {
            self.latency_ms = other.latency_ms;
        }
    }
}

/// Log attributes accumulated along a request.
#[derive(Debug, Clone, Default)]
pub struct LogState {
    pub attrs: Vec<LogEntry>,
}

impl LogState {
    pub fn new(attrs: Vec<LogEntry>) -> Self {
        Self { attrs }
    }

    pub fn record(&self) -> LogEntry {
        self.attrs.iter().fold(LogEntry::default(), |mut acc, attr| {
            acc.overlay(attr);
            acc
        })
    }
}

/// Sends the folded record.
pub fn encode_log(cx: &Context, key: &ContextKey<LogState>) -> Result<Vec<u8>, BoxError> {
    match cx.get(key) {
        Some(state) => Ok(serde_json::to_vec(&state.record())?),
        None => Ok(Vec::new()),
    }
}

/// Appends the received record to the local log, if there is one.
pub fn decode_log(cx: &Context, key: &ContextKey<LogState>, data: &[u8]) -> Result<Context, BoxError> {
    let Some(state) = cx.get(key) else {
        return Ok(cx.clone());
    };
    let entry: LogEntry = serde_json::from_slice(data)?;
    let mut state = state.clone();
    state.attrs.push(entry);
    Ok(cx.with_value(key, state))
}

/// Registry configured the same way on both peers.
pub fn registry() -> Registry {
    let registry = Registry::new();
    registry
        .configure([
            ValuePropagator::json("str", &KEYS.str).unwrap().boxed(),
            ValuePropagator::json("int", &KEYS.int).unwrap().boxed(),
            ValuePropagator::new("log", &KEYS.log, encode_log, decode_log).unwrap().boxed(),
        ])
        .unwrap();
    registry
}

/// Install a test subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Serve `router` on an ephemeral local port.
pub async fn start_server(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}
