// src/source/supabase.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{Record, RecordSource, BATCH_SIZE};
use crate::config::{BridgeConfig, DEFAULT_HTTP_TIMEOUT_SECS};

/// Reads the most recent rows of one table through Supabase's PostgREST API.
#[derive(Clone)]
pub struct SupabaseSource {
    base_url: Option<String>,
    api_key: Option<String>,
    table: String,
    client: Client,
    timeout: Duration,
}

impl SupabaseSource {
    pub fn new(base_url: Option<String>, api_key: Option<String>, table: String) -> Self {
        Self {
            base_url,
            api_key,
            table,
            client: Client::new(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn from_config(cfg: &BridgeConfig, client: Client) -> Self {
        Self::new(
            cfg.supabase_url.clone(),
            cfg.supabase_key.clone(),
            cfg.supabase_table.clone(),
        )
        .with_client(client)
        .with_timeout(cfg.http_timeout())
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn endpoint(&self) -> Result<String> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| anyhow!("SUPABASE_URL is not configured"))?;
        Ok(format!(
            "{}/rest/v1/{}",
            base.trim_end_matches('/'),
            self.table
        ))
    }
}

#[async_trait]
impl RecordSource for SupabaseSource {
    async fn fetch_recent(&self) -> Result<Vec<Record>> {
        let url = self.endpoint()?;
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("SUPABASE_KEY is not configured"))?;
        let limit = BATCH_SIZE.to_string();

        let rsp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header("apikey", key)
            .bearer_auth(key)
            .header("Accept", "application/json")
            .query(&[
                ("select", "*"),
                ("order", "created_at.desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("supabase request to table '{}'", self.table))?;

        let status = rsp.status();
        if !status.is_success() {
            let body = rsp.text().await.unwrap_or_default();
            return Err(anyhow!("supabase returned {status}: {}", body.trim()));
        }

        let mut rows: Vec<Record> = rsp
            .json()
            .await
            .with_context(|| format!("decoding rows from table '{}'", self.table))?;
        // batch never exceeds BATCH_SIZE, whatever `limit` upstream honoured
        rows.truncate(BATCH_SIZE);
        Ok(rows)
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}
