//! Shared HTTP Client Module
//!
//! One lazily built `reqwest::Client` is reused by both remote providers so
//! connections and TLS sessions are pooled across a structuring run.
//! A client with a non-default timeout is built on request.

use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

/// Timeout of the shared client
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

static SHARED_CLIENT: Lazy<Client> = Lazy::new(|| build(DEFAULT_TIMEOUT));

fn build(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(8)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("[HttpClient] Falling back to default client: {}", e);
            Client::new()
        })
}

/// Get the global client
#[inline]
pub fn shared_client() -> &'static Client {
    &SHARED_CLIENT
}

/// Client honoring `timeout`; the shared instance when it matches the default
pub fn client_with_timeout(timeout: Duration) -> Client {
    if timeout == DEFAULT_TIMEOUT {
        shared_client().clone()
    } else {
        build(timeout)
    }
}
