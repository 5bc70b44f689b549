// src/health_probe.rs
//! Dependency liveness probe used by the `health-probe` binary.

use reqwest::Client;
use std::fmt::Write as _;
use std::time::Duration;

use crate::config::BridgeConfig;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTarget {
    pub name: String,
    pub url: Option<String>,
    /// Sent as `apikey` (Supabase REST root refuses anonymous requests).
    pub api_key: Option<String>,
}

impl ServiceTarget {
    pub fn new(name: &str, url: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            url,
            api_key: None,
        }
    }
}

/// Application, static site host, store REST root, in that order.
pub fn targets_from_config(cfg: &BridgeConfig) -> Vec<ServiceTarget> {
    vec![
        ServiceTarget::new("Application", Some(cfg.app_url.clone())),
        ServiceTarget::new("Netlify", cfg.netlify_site_url.clone()),
        ServiceTarget {
            api_key: cfg.supabase_key.clone(),
            ..ServiceTarget::new("Supabase", cfg.supabase_rest_root())
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// No URL configured; does not affect the verdict.
    Skipped,
    Healthy,
    Unhealthy(u16),
    Unreachable(String),
}

impl ProbeOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ProbeOutcome::Unhealthy(_) | ProbeOutcome::Unreachable(_))
    }

    pub fn line(&self, name: &str) -> String {
        match self {
            ProbeOutcome::Skipped => format!("⚠️  {name}: URL not configured"),
            ProbeOutcome::Healthy => format!("✅ {name}: Healthy"),
            ProbeOutcome::Unhealthy(code) => {
                format!("❌ {name}: Unhealthy (Status: {code})")
            }
            ProbeOutcome::Unreachable(msg) => format!("❌ {name}: Unreachable ({msg})"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    pub results: Vec<(String, ProbeOutcome)>,
}

impl ProbeReport {
    pub fn all_healthy(&self) -> bool {
        !self.results.iter().any(|(_, o)| o.is_failure())
    }

    pub fn exit_code(&self) -> i32 {
        if self.all_healthy() {
            0
        } else {
            1
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("🏥 Starting health checks...\n\n");
        for (name, outcome) in &self.results {
            let _ = writeln!(out, "{}", outcome.line(name));
        }
        let verdict = if self.all_healthy() {
            "✅ All services healthy"
        } else {
            "❌ Some services unhealthy"
        };
        let _ = writeln!(out, "\n{verdict}");
        out
    }
}

/// GET the target once. Only HTTP 200 counts as healthy.
pub async fn check(client: &Client, target: &ServiceTarget, timeout: Duration) -> ProbeOutcome {
    let Some(url) = target.url.as_deref() else {
        return ProbeOutcome::Skipped;
    };

    let mut req = client.get(url).timeout(timeout);
    if let Some(key) = &target.api_key {
        req = req.header("apikey", key);
    }

    match req.send().await {
        Ok(rsp) if rsp.status() == reqwest::StatusCode::OK => ProbeOutcome::Healthy,
        Ok(rsp) => ProbeOutcome::Unhealthy(rsp.status().as_u16()),
        Err(e) => {
            tracing::debug!(service = %target.name, error = ?e, "probe request failed");
            ProbeOutcome::Unreachable(e.to_string())
        }
    }
}

/// Check targets sequentially, keeping their order in the report.
pub async fn run_probe(client: &Client, targets: &[ServiceTarget], timeout: Duration) -> ProbeReport {
    let mut report = ProbeReport::default();
    for t in targets {
        let outcome = check(client, t, timeout).await;
        report.results.push((t.name.clone(), outcome));
    }
    report
}
