// src/publish/notion.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{PagePublisher, PageProperties};
use crate::config::{BridgeConfig, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_NOTION_API_URL};

pub const NOTION_VERSION: &str = "2022-06-28";

/// Creates pages in one Notion database. No idempotency key is sent, so
/// re-publishing a record creates another page.
#[derive(Clone)]
pub struct NotionPublisher {
    api_url: String,
    token: Option<String>,
    database_id: Option<String>,
    client: Client,
    timeout: Duration,
}

impl NotionPublisher {
    pub fn new(token: Option<String>, database_id: Option<String>) -> Self {
        Self {
            api_url: DEFAULT_NOTION_API_URL.to_string(),
            token,
            database_id,
            client: Client::new(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn from_config(cfg: &BridgeConfig, client: Client) -> Self {
        Self::new(cfg.notion_token.clone(), cfg.notion_database_id.clone())
            .with_api_url(cfg.notion_api_url.clone())
            .with_client(client)
            .with_timeout(cfg.http_timeout())
    }

    pub fn with_api_url(mut self, url: String) -> Self {
        self.api_url = url;
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct CreatePageRequest<'a> {
    parent: Parent<'a>,
    properties: &'a PageProperties,
}

#[derive(Serialize)]
struct Parent<'a> {
    database_id: &'a str,
}

#[async_trait]
impl PagePublisher for NotionPublisher {
    async fn create_page(&self, properties: &PageProperties) -> Result<()> {
        let database_id = self
            .database_id
            .as_deref()
            .ok_or_else(|| anyhow!("NOTION_DATABASE_ID is not configured"))?;
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| anyhow!("NOTION_TOKEN is not configured"))?;

        let body = CreatePageRequest {
            parent: Parent { database_id },
            properties,
        };

        let rsp = self
            .client
            .post(format!("{}/v1/pages", self.api_url.trim_end_matches('/')))
            .timeout(self.timeout)
            .bearer_auth(token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await
            .context("notion create page request")?;

        let status = rsp.status();
        if !status.is_success() {
            let text = rsp.text().await.unwrap_or_default();
            return Err(anyhow!("notion returned {status}: {}", text.trim()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "notion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::map_record;
    use crate::source::{Record, RecordId};

    fn props() -> PageProperties {
        map_record(&Record {
            id: RecordId::from(1i64),
            name: Some("A".into()),
            status: None,
            created_at: Some("2024-01-01".into()),
        })
    }

    #[test]
    fn request_body_nests_parent_and_properties() {
        let p = props();
        let body = CreatePageRequest {
            parent: Parent { database_id: "db-1" },
            properties: &p,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["parent"]["database_id"], "db-1");
        assert_eq!(v["properties"]["Status"]["select"]["name"], "New");
    }

    #[tokio::test]
    async fn missing_database_id_fails_at_call_time() {
        let publisher = NotionPublisher::new(Some("secret".into()), None);
        let err = publisher.create_page(&props()).await.unwrap_err();
        assert_eq!(err.to_string(), "NOTION_DATABASE_ID is not configured");
    }
}
