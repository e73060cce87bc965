use serde::{Deserialize, Serialize};

use super::credentials::{CredentialPool, ProviderError};

const PROVIDER: &str = "serper";
const MAX_SNIPPETS: usize = 5;

/// Stands in for web context when no key works; embedded verbatim in the prompt.
pub const WEB_CONTEXT_UNAVAILABLE: &str =
    "Web search context is currently unavailable for this question.";

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    snippet: Option<String>,
}

/// The outcome of a web lookup: either real snippets or the fallback sentence.
#[derive(Debug, Clone, PartialEq)]
pub enum WebContext {
    Snippets(String),
    Unavailable,
}

impl WebContext {
    pub fn as_str(&self) -> &str {
        match self {
            WebContext::Snippets(text) => text.as_str(),
            WebContext::Unavailable => WEB_CONTEXT_UNAVAILABLE,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, WebContext::Snippets(_))
    }
}

#[derive(Debug, Clone)]
pub struct WebContextClient {
    client: reqwest::Client,
    pool: CredentialPool,
    api_url: String,
}

impl WebContextClient {
    pub fn new(client: reqwest::Client, pool: CredentialPool, api_url: &str) -> Self {
        Self {
            client,
            pool,
            api_url: api_url.to_string(),
        }
    }

    /// Up to five organic snippets joined by newlines. A reply with no usable
    /// snippet counts as unavailable.
    pub async fn context(&self, query: &str) -> WebContext {
        match self.try_snippets(query).await {
            Ok(snippets) if snippets.is_empty() => {
                tracing::warn!(query, "web search returned no snippets");
                WebContext::Unavailable
            }
            Ok(snippets) => WebContext::Snippets(snippets.join("\n")),
            Err(e) => {
                tracing::warn!(error = %e, query, "web context degraded to fallback");
                WebContext::Unavailable
            }
        }
    }

    pub async fn try_snippets(&self, query: &str) -> Result<Vec<String>, ProviderError> {
        self.pool
            .first_success(|key| self.search_with_key(key, query))
            .await
    }

    async fn search_with_key(&self, key: String, query: &str) -> Result<Vec<String>, ProviderError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("X-API-KEY", key)
            .header("Content-Type", "application/json")
            .json(&SearchRequest { q: query })
            .send()
            .await
            .map_err(ProviderError::transport(PROVIDER))?;

        let results: SearchResponse = ProviderError::check(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(ProviderError::decode(PROVIDER))?;

        Ok(extract_snippets(results))
    }
}

fn extract_snippets(results: SearchResponse) -> Vec<String> {
    results
        .organic
        .into_iter()
        .filter_map(|r| r.snippet)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(MAX_SNIPPETS)
        .collect()
}
