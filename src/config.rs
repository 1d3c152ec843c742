use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

/// Which auth persistence layer backs the app.
///
/// Unset `APL` defaults to the file store (single-instance dev deployments);
/// any value other than `file` or `upstash` is a startup error rather than a
/// silent fall-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AplBackend {
    File,
    Upstash,
}

impl std::str::FromStr for AplBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "file" => Ok(AplBackend::File),
            "upstash" => Ok(AplBackend::Upstash),
            other => bail!("unrecognized APL backend {other:?} (expected \"file\" or \"upstash\")"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpstashConfig {
    pub rest_url: String,
    pub rest_token: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub apl_backend: AplBackend,
    pub apl_file_path: PathBuf,
    pub upstash: Option<UpstashConfig>,
    /// Public base URL of the app, used for manifest target URLs and as the
    /// `externalUrl` echoed in transaction results.
    pub app_base_url: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let apl_backend = match env::var("APL") {
            Ok(value) => value.parse::<AplBackend>()?,
            Err(_) => AplBackend::File,
        };

        let upstash = match apl_backend {
            AplBackend::Upstash => {
                let rest_url = env::var("UPSTASH_URL")
                    .context("UPSTASH_URL must be set when APL=upstash")?;
                let rest_token = env::var("UPSTASH_TOKEN")
                    .context("UPSTASH_TOKEN must be set when APL=upstash")?;
                Some(UpstashConfig {
                    rest_url,
                    rest_token,
                })
            }
            AplBackend::File => None,
        };

        let apl_file_path = env::var("APL_FILE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".auth-data.json"));
        let app_base_url =
            env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000/".to_string());
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid port number")?;

        Ok(Self {
            apl_backend,
            apl_file_path,
            upstash,
            app_base_url,
            host,
            port,
        })
    }
}
