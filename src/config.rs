// src/config.rs
//! Runtime configuration: optional TOML file, then environment overrides.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "BRIDGE_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/bridge.toml";

pub const DEFAULT_TABLE: &str = "records";
pub const DEFAULT_NOTION_API_URL: &str = "https://api.notion.com";
pub const DEFAULT_APP_URL: &str = "http://localhost:3000/health";
pub const DEFAULT_PORT: u16 = 3000;
/// Top of every hour (seconds-first cron).
pub const DEFAULT_SYNC_CRON: &str = "0 0 * * * *";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub supabase_table: String,
    pub notion_token: Option<String>,
    pub notion_database_id: Option<String>,
    pub notion_api_url: String,
    pub app_url: String,
    pub netlify_site_url: Option<String>,
    pub port: u16,
    pub sync_cron: String,
    pub scheduler_enabled: bool,
    pub single_flight: bool,
    pub http_timeout_secs: u64,
    pub metrics_enabled: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_key: None,
            supabase_table: DEFAULT_TABLE.to_string(),
            notion_token: None,
            notion_database_id: None,
            notion_api_url: DEFAULT_NOTION_API_URL.to_string(),
            app_url: DEFAULT_APP_URL.to_string(),
            netlify_site_url: None,
            port: DEFAULT_PORT,
            sync_cron: DEFAULT_SYNC_CRON.to_string(),
            scheduler_enabled: true,
            single_flight: true,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            metrics_enabled: false,
        }
    }
}

/// Every key is optional; absent keys keep the built-in default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub supabase_table: Option<String>,
    pub notion_token: Option<String>,
    pub notion_database_id: Option<String>,
    pub notion_api_url: Option<String>,
    pub app_url: Option<String>,
    pub netlify_site_url: Option<String>,
    pub port: Option<u16>,
    pub sync_cron: Option<String>,
    pub scheduler_enabled: Option<bool>,
    pub single_flight: Option<bool>,
    pub http_timeout_secs: Option<u64>,
    pub metrics_enabled: Option<bool>,
}

impl BridgeConfig {
    /// Load using the process environment:
    /// 1) file at $BRIDGE_CONFIG_PATH (must exist when set)
    /// 2) config/bridge.toml if present
    /// 3) env vars override whatever the file provided
    pub fn load() -> Result<Self> {
        let file = load_file_default()?;
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merge a parsed file with a key lookup (env in production, a map in tests).
    pub fn from_sources<F>(file: FileConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).and_then(non_blank);
        let d = BridgeConfig::default();

        Ok(Self {
            supabase_url: get("SUPABASE_URL").or(file.supabase_url.and_then(non_blank)),
            supabase_key: get("SUPABASE_KEY").or(file.supabase_key.and_then(non_blank)),
            supabase_table: get("SUPABASE_TABLE")
                .or(file.supabase_table.and_then(non_blank))
                .unwrap_or(d.supabase_table),
            notion_token: get("NOTION_TOKEN").or(file.notion_token.and_then(non_blank)),
            notion_database_id: get("NOTION_DATABASE_ID")
                .or(file.notion_database_id.and_then(non_blank)),
            notion_api_url: get("NOTION_API_URL")
                .or(file.notion_api_url.and_then(non_blank))
                .unwrap_or(d.notion_api_url),
            app_url: get("APP_URL")
                .or(file.app_url.and_then(non_blank))
                .unwrap_or(d.app_url),
            netlify_site_url: get("NETLIFY_SITE_URL")
                .or(file.netlify_site_url.and_then(non_blank)),
            port: match get("PORT") {
                Some(v) => parse_num("PORT", &v)?,
                None => file.port.unwrap_or(d.port),
            },
            sync_cron: get("SYNC_CRON")
                .or(file.sync_cron.and_then(non_blank))
                .unwrap_or(d.sync_cron),
            scheduler_enabled: match get("SYNC_SCHEDULER_ENABLED") {
                Some(v) => parse_flag("SYNC_SCHEDULER_ENABLED", &v)?,
                None => file.scheduler_enabled.unwrap_or(d.scheduler_enabled),
            },
            single_flight: match get("SYNC_SINGLE_FLIGHT") {
                Some(v) => parse_flag("SYNC_SINGLE_FLIGHT", &v)?,
                None => file.single_flight.unwrap_or(d.single_flight),
            },
            http_timeout_secs: non_zero(
                "HTTP_TIMEOUT_SECS",
                match get("HTTP_TIMEOUT_SECS") {
                    Some(v) => parse_num("HTTP_TIMEOUT_SECS", &v)?,
                    None => file.http_timeout_secs.unwrap_or(d.http_timeout_secs),
                },
            )?,
            metrics_enabled: match get("METRICS_ENABLED") {
                Some(v) => parse_flag("METRICS_ENABLED", &v)?,
                None => file.metrics_enabled.unwrap_or(d.metrics_enabled),
            },
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// PostgREST root of the backing store, if a store URL is configured.
    pub fn supabase_rest_root(&self) -> Option<String> {
        self.supabase_url
            .as_deref()
            .map(|u| format!("{}/rest/v1/", u.trim_end_matches('/')))
    }
}

/// Parse a config file from an explicit path.
pub fn load_file_from(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
}

/// Resolve the optional config file: $BRIDGE_CONFIG_PATH, then config/bridge.toml.
pub fn load_file_default() -> Result<FileConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_file_from(&pb);
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
    if fallback.exists() {
        return load_file_from(&fallback);
    }
    Ok(FileConfig::default())
}

fn non_blank(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

pub(crate) fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("{key}: expected a boolean, got '{other}'")),
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| anyhow!("{key}: expected a number, got '{raw}'"))
}

/// A zero timeout would fail every outbound call immediately.
fn non_zero(key: &str, secs: u64) -> Result<u64> {
    if secs == 0 {
        return Err(anyhow!("{key}: must be at least 1 second, got 0"));
    }
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let cfg = BridgeConfig::from_sources(FileConfig::default(), lookup(&[])).unwrap();
        assert_eq!(cfg, BridgeConfig::default());
        assert_eq!(cfg.supabase_table, "records");
        assert_eq!(cfg.sync_cron, "0 0 * * * *");
        assert_eq!(cfg.http_timeout(), Duration::from_secs(5));
        assert!(cfg.single_flight);
    }

    #[test]
    fn env_overrides_file() {
        let file: FileConfig = toml::from_str(
            r#"
supabase_table = "events"
port = 8080
single_flight = false
"#,
        )
        .unwrap();
        let cfg = BridgeConfig::from_sources(
            file,
            lookup(&[("PORT", "9090"), ("SUPABASE_URL", "https://x.supabase.co")]),
        )
        .unwrap();
        assert_eq!(cfg.supabase_table, "events");
        assert_eq!(cfg.port, 9090);
        assert!(!cfg.single_flight);
        assert_eq!(cfg.supabase_url.as_deref(), Some("https://x.supabase.co"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = BridgeConfig::from_sources(
            FileConfig::default(),
            lookup(&[("SUPABASE_TABLE", "   "), ("NOTION_TOKEN", "")]),
        )
        .unwrap();
        assert_eq!(cfg.supabase_table, "records");
        assert!(cfg.notion_token.is_none());
    }

    #[test]
    fn bad_flag_and_number_name_the_key() {
        let err = BridgeConfig::from_sources(
            FileConfig::default(),
            lookup(&[("SYNC_SINGLE_FLIGHT", "maybe")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("SYNC_SINGLE_FLIGHT"));

        let err = BridgeConfig::from_sources(FileConfig::default(), lookup(&[("PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn zero_timeout_is_rejected_from_env_and_file() {
        let err = BridgeConfig::from_sources(
            FileConfig::default(),
            lookup(&[("HTTP_TIMEOUT_SECS", "0")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("HTTP_TIMEOUT_SECS"), "got: {err}");

        let file: FileConfig = toml::from_str("http_timeout_secs = 0").unwrap();
        assert!(BridgeConfig::from_sources(file, lookup(&[])).is_err());

        let cfg = BridgeConfig::from_sources(
            FileConfig::default(),
            lookup(&[("HTTP_TIMEOUT_SECS", "1")]),
        )
        .unwrap();
        assert_eq!(cfg.http_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn rest_root_strips_trailing_slash() {
        let cfg = BridgeConfig {
            supabase_url: Some("https://x.supabase.co/".into()),
            ..BridgeConfig::default()
        };
        assert_eq!(
            cfg.supabase_rest_root().as_deref(),
            Some("https://x.supabase.co/rest/v1/")
        );
        assert!(BridgeConfig::default().supabase_rest_root().is_none());
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let res: Result<FileConfig, _> = toml::from_str(r#"supabase_tabel = "typo""#);
        assert!(res.is_err());
    }
}
