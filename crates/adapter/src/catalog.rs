use std::time::Duration;

use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::path::resolve;
use crate::template::{BackendTemplate, ConnectionValues};

/// Model endpoint sentinel for the bundled Anthropic catalog. Anthropic
/// exposes no model-list endpoint, so connections configured with this
/// value resolve against a fixed catalog without any network call.
pub const CLAUDE_SENTINEL: &str = "{{CLAUDE}}";

const TIMEOUT_SECS: u64 = 90;

/// Retrieves a backend's list of available models.
///
/// This is the sole asynchronous operation in the crate. Dropping the
/// future returned by [`CatalogFetcher::fetch`] aborts the underlying
/// request, so callers supersede a stale fetch by simply starting a new
/// one and discarding the old future (last request wins).
#[derive(Debug, Clone)]
pub struct CatalogFetcher {
    client: reqwest::Client,
}

impl CatalogFetcher {
    /// Creates a fetcher with a reusable HTTP client.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    /// Fetches the model catalog for `connection`.
    ///
    /// Issues one GET to the connection's model endpoint, authenticated by
    /// the template's auth rule, and extracts the model sequence at the
    /// template's `model_list_path`.
    ///
    /// # Errors
    ///
    /// Every failure here is recoverable: a non-success status, transport
    /// error or undecodable body leaves the caller's catalog as it was.
    /// Request building is still possible with the last known selection.
    pub async fn fetch(
        &self,
        template: &BackendTemplate,
        connection: &ConnectionValues,
    ) -> Result<Vec<Value>> {
        if connection.model_endpoint == CLAUDE_SENTINEL {
            return Ok(claude_catalog());
        }

        let mut request = self.client.get(&connection.model_endpoint);
        if template.uses_api_key {
            request = request.header(
                template.auth_header.as_str(),
                format!("{}{}", template.auth_prefix, connection.api_key),
            );
        }

        log::debug!("GET: {}", connection.model_endpoint);
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet = body.chars().take(240).collect::<String>();
            log::error!("catalog fetch failed with {status}: {snippet}");
            return Err(Error::CatalogStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        let body: Value = response.json().await?;
        match resolve(&body, &template.model_list_path) {
            Some(Value::Array(models)) => Ok(models.clone()),
            Some(other) => {
                log::warn!(
                    "expected a model list at `{}`, got {other}",
                    template.model_list_path
                );
                Ok(Vec::new())
            }
            None => {
                log::warn!("no model list at `{}`", template.model_list_path);
                Ok(Vec::new())
            }
        }
    }
}

/// Fixed catalog substituted for the [`CLAUDE_SENTINEL`] endpoint.
fn claude_catalog() -> Vec<Value> {
    vec![
        json!({"name": "claude-3-7-sonnet-latest", "context_length": 200000}),
        json!({"name": "claude-3-5-sonnet-latest", "context_length": 200000}),
        json!({"name": "claude-3-5-haiku-latest", "context_length": 200000}),
        json!({"name": "claude-3-opus-latest", "context_length": 200000}),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn sentinel_endpoint_uses_the_bundled_catalog() {
        let templates = crate::template::builtin_templates();
        let template = &templates[0];
        let connection: ConnectionValues = serde_json::from_value(json!({
            "friendlyName": "claude",
            "endpoint": "https://api.anthropic.com/v1/messages",
            "modelEndpoint": CLAUDE_SENTINEL,
            "apiKey": "sk-ant",
            "model": {},
            "active": true,
        }))
        .unwrap();

        let fetcher = CatalogFetcher::new().unwrap();
        let models = fetcher.fetch(template, &connection).await.unwrap();
        assert!(!models.is_empty());
        assert_eq!(models[0]["context_length"], json!(200000));
    }
}
