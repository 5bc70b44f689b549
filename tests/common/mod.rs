// tests/common/mod.rs
// Shared fakes for the record source / page publisher seams and a tiny
// in-process HTTP server helper.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::Router;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

use supabase_notion_sync::{PagePublisher, PageProperties, Record, RecordId, RecordSource};

pub fn rec(id: i64, name: Option<&str>, status: Option<&str>, created_at: &str) -> Record {
    Record {
        id: RecordId::from(id),
        name: name.map(str::to_string),
        status: status.map(str::to_string),
        created_at: Some(created_at.to_string()),
    }
}

pub fn batch(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            let name = format!("row-{i}");
            rec(i as i64, Some(&name), Some("Open"), "2024-01-01T00:00:00Z")
        })
        .collect()
}

/// Scripted source: optional leading failures, then a fixed result.
pub struct FakeSource {
    result: std::result::Result<Vec<Record>, String>,
    fail_first: usize,
    calls: AtomicUsize,
    started: Arc<Notify>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeSource {
    pub fn ok(records: Vec<Record>) -> Self {
        Self {
            result: Ok(records),
            fail_first: 0,
            calls: AtomicUsize::new(0),
            started: Arc::new(Notify::new()),
            gate: None,
        }
    }

    pub fn err(msg: &str) -> Self {
        Self {
            result: Err(msg.to_string()),
            ..Self::ok(vec![])
        }
    }

    /// The first `n` fetches fail with "connection refused".
    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    /// Block every fetch until the test adds a permit to the returned semaphore.
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn started(&self) -> Arc<Notify> {
        self.started.clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for FakeSource {
    async fn fetch_recent(&self) -> Result<Vec<Record>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        if n < self.fail_first {
            return Err(anyhow!("connection refused"));
        }
        match &self.result {
            Ok(v) => Ok(v.clone()),
            Err(msg) => Err(anyhow!("{msg}")),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Records every page it is asked to create; call indices in `fail_on` error out.
#[derive(Default)]
pub struct RecordingPublisher {
    seen: Mutex<Vec<PageProperties>>,
    fail_on: HashSet<usize>,
    delay: Duration,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(calls: &[usize]) -> Self {
        Self {
            fail_on: calls.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// Each create_page sleeps `delay` before it is recorded.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn failing_always(n: usize) -> Self {
        Self::failing_on(&(0..n).collect::<Vec<_>>())
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn titles(&self) -> Vec<String> {
        self.seen.lock().iter().map(|p| p.title().to_string()).collect()
    }

    pub fn pages(&self) -> Vec<PageProperties> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl PagePublisher for RecordingPublisher {
    async fn create_page(&self, properties: &PageProperties) -> Result<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let idx = {
            let mut seen = self.seen.lock();
            seen.push(properties.clone());
            seen.len() - 1
        };
        if self.fail_on.contains(&idx) {
            return Err(anyhow!("notion returned 400 Bad Request: validation_error"));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Serve `app` on an ephemeral localhost port; returns the base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}

/// A localhost URL nothing listens on.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}
