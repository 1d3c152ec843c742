use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

type TokenSupplier = Arc<dyn Fn() -> String + Send + Sync>;

/// Authenticated GraphQL client for a single Saleor installation.
///
/// The token is supplied by a closure so callers can plug in rotation later;
/// the COD flow itself never issues a query, but the client is constructed
/// per request exactly where follow-up queries would go.
#[derive(Clone)]
pub struct GraphqlClient {
    http: reqwest::Client,
    api_url: String,
    token_supplier: TokenSupplier,
}

#[derive(Deserialize)]
struct GraphqlReply {
    data: Option<Value>,
    errors: Option<Vec<Value>>,
}

impl GraphqlClient {
    pub fn new<F>(api_url: impl Into<String>, token_supplier: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            token_supplier: Arc::new(token_supplier),
        }
    }

    pub async fn query(&self, document: &str, variables: Value) -> Result<Value> {
        let token = (self.token_supplier)();
        let reply: GraphqlReply = self
            .http
            .post(&self.api_url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "query": document, "variables": variables }))
            .send()
            .await
            .context("graphql request failed")?
            .error_for_status()
            .context("graphql endpoint returned an error status")?
            .json()
            .await
            .context("graphql reply was not valid JSON")?;

        if let Some(errors) = reply.errors.filter(|errs| !errs.is_empty()) {
            return Err(anyhow!("graphql errors: {}", Value::Array(errors)));
        }
        reply.data.ok_or_else(|| anyhow!("graphql reply had no data"))
    }
}
