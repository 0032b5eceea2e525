//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{body::Body, http::Request, Router};
use chat_gateway::clock::MockClock;
use chat_gateway::observability::logging::{AccessRecord, LogSink};
use chat_gateway::{GatewayConfig, GatewayServer, Shutdown};
use chrono::{DateTime, TimeZone, Utc};
use tokio::net::TcpListener;

/// 10:00 UTC, inside the default opening hours.
pub fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
}

/// Access log that keeps lines in memory.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl LogSink for MemorySink {
    fn record(&self, record: &AccessRecord) {
        self.lines.lock().unwrap().push(record.line());
    }
}

/// Start a mock chat service that echoes what it received.
///
/// Returns its address and a counter of requests that reached it.
pub async fn start_mock_upstream() -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let app = Router::new().fallback(move |req: Request<Body>| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            let client = req
                .headers()
                .get("x-gateway-client-key")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();
            format!("upstream {} {} client={}", req.method(), req.uri().path(), client)
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, hits)
}

/// A gateway running on an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub clock: MockClock,
    pub sink: Arc<MemorySink>,
    pub shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_gateway(mut config: GatewayConfig, upstream: SocketAddr) -> TestGateway {
    config.upstream.address = upstream.to_string();

    let clock = MockClock::new(morning());
    let sink = Arc::new(MemorySink::default());
    let server = GatewayServer::with_parts(config, Arc::new(clock.clone()), sink.clone()).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestGateway {
        addr,
        clock,
        sink,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
