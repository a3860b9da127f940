//! Machine translation of commit descriptions.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::schema::TranslationSettings;

pub trait Translator {
    fn translate(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String>;
}

/// Client for a LibreTranslate-compatible `/translate` endpoint.
#[derive(Debug, Clone)]
pub struct HttpTranslator {
    endpoint: String,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
}

impl HttpTranslator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn from_settings(settings: &TranslationSettings) -> Self {
        Self::new(settings.endpoint.clone())
    }

    fn url(&self) -> String {
        format!("{}/translate", self.endpoint.trim_end_matches('/'))
    }

    async fn request(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String> {
        let url = self.url();
        let client = reqwest::Client::builder()
            .user_agent(concat!("graft/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let response = client
            .post(&url)
            .json(&TranslateRequest {
                q: text,
                source,
                target,
                format: "text",
            })
            .send()
            .await
            .with_context(|| format!("Failed to reach translation service at {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Translation failed: HTTP {} from {}", response.status(), url);
        }

        let body: TranslateResponse = response
            .json()
            .await
            .context("Failed to parse translation response")?;
        Ok(body.translated_text)
    }
}

impl Translator for HttpTranslator {
    fn translate(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String> {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))?;
        runtime.block_on(self.request(text, source, target))
    }
}
