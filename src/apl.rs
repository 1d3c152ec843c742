//! Auth persistence layer (APL): per-installation Saleor endpoint and token.
//!
//! Two backends mirror the deployment split: a single JSON file for local
//! single-instance runs, and the Upstash Redis REST API for multi-tenant
//! deployments.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Auth data handed out at install time; immutable for the lifetime of a
/// webhook request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthData {
    #[serde(rename = "saleorApiUrl")]
    pub saleor_api_url: String,
    pub token: String,
}

#[async_trait::async_trait]
pub trait Apl: Send + Sync {
    async fn get(&self, saleor_api_url: &str) -> Result<Option<AuthData>>;
    async fn set(&self, auth_data: AuthData) -> Result<()>;
    async fn delete(&self, saleor_api_url: &str) -> Result<()>;
}

/// File-backed APL: one JSON object keyed by Saleor API URL.
pub struct FileApl {
    path: PathBuf,
}

impl FileApl {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_all(&self) -> Result<HashMap<String, AuthData>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("corrupt auth data file {}", self.path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => {
                Err(err).with_context(|| format!("reading auth data file {}", self.path.display()))
            }
        }
    }

    async fn write_all(&self, entries: &HashMap<String, AuthData>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .with_context(|| format!("writing auth data file {}", self.path.display()))
    }
}

#[async_trait::async_trait]
impl Apl for FileApl {
    async fn get(&self, saleor_api_url: &str) -> Result<Option<AuthData>> {
        Ok(self.read_all().await?.remove(saleor_api_url))
    }

    async fn set(&self, auth_data: AuthData) -> Result<()> {
        let mut entries = self.read_all().await?;
        entries.insert(auth_data.saleor_api_url.clone(), auth_data);
        self.write_all(&entries).await
    }

    async fn delete(&self, saleor_api_url: &str) -> Result<()> {
        let mut entries = self.read_all().await?;
        if entries.remove(saleor_api_url).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}

const UPSTASH_KEY_PREFIX: &str = "saleor-app-auth";

/// Upstash Redis REST APL. Commands are sent as JSON arrays to the REST
/// endpoint so keys containing URLs need no path encoding.
pub struct UpstashApl {
    http: reqwest::Client,
    rest_url: String,
    rest_token: String,
}

#[derive(Deserialize)]
struct UpstashReply {
    result: Option<serde_json::Value>,
    error: Option<String>,
}

impl UpstashApl {
    pub fn new(rest_url: impl Into<String>, rest_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            rest_url: rest_url.into(),
            rest_token: rest_token.into(),
        }
    }

    fn key(saleor_api_url: &str) -> String {
        format!("{UPSTASH_KEY_PREFIX}:{saleor_api_url}")
    }

    async fn command(&self, command: serde_json::Value) -> Result<Option<serde_json::Value>> {
        let reply: UpstashReply = self
            .http
            .post(&self.rest_url)
            .bearer_auth(&self.rest_token)
            .json(&command)
            .send()
            .await
            .context("upstash request failed")?
            .error_for_status()
            .context("upstash returned an error status")?
            .json()
            .await
            .context("upstash reply was not valid JSON")?;
        if let Some(error) = reply.error {
            return Err(anyhow!("upstash command rejected: {error}"));
        }
        Ok(reply.result)
    }
}

#[async_trait::async_trait]
impl Apl for UpstashApl {
    async fn get(&self, saleor_api_url: &str) -> Result<Option<AuthData>> {
        let key = Self::key(saleor_api_url);
        match self.command(serde_json::json!(["GET", key])).await? {
            Some(serde_json::Value::String(raw)) => {
                let auth: AuthData =
                    serde_json::from_str(&raw).context("corrupt auth data in upstash")?;
                Ok(Some(auth))
            }
            _ => Ok(None),
        }
    }

    async fn set(&self, auth_data: AuthData) -> Result<()> {
        let key = Self::key(&auth_data.saleor_api_url);
        let value = serde_json::to_string(&auth_data)?;
        self.command(serde_json::json!(["SET", key, value])).await?;
        Ok(())
    }

    async fn delete(&self, saleor_api_url: &str) -> Result<()> {
        let key = Self::key(saleor_api_url);
        self.command(serde_json::json!(["DEL", key])).await?;
        Ok(())
    }
}
