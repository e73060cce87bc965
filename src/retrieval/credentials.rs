use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of one provider call with one credential. Every variant is
/// recoverable: the pool moves on to the next key.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{provider} response could not be decoded: {source}")]
    Decode {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("all {0} credentials exhausted")]
    Exhausted(&'static str),
}

impl ProviderError {
    pub fn transport(provider: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Transport { provider, source }
    }

    pub fn decode(provider: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Decode { provider, source }
    }

    /// Turns a non-success response into `Status`, passing successes through.
    pub async fn check(
        provider: &'static str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, Self> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Self::Status {
            provider,
            status,
            body,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Credential {
    pub name: String,
    pub value: Option<String>,
}

/// Ordered keys for one provider, tried front to back on every call.
#[derive(Debug, Clone)]
pub struct CredentialPool {
    provider: &'static str,
    credentials: Vec<Credential>,
    cooldown: Duration,
    benched: Arc<Mutex<HashMap<String, Instant>>>,
}

impl CredentialPool {
    pub fn new(provider: &'static str, keys: Vec<(String, Option<String>)>) -> Self {
        Self {
            provider,
            credentials: keys
                .into_iter()
                .map(|(name, value)| Credential { name, value })
                .collect(),
            cooldown: Duration::ZERO,
            benched: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Keys that fail are tried last until `cooldown` has passed.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Number of keys that are actually set.
    pub fn usable(&self) -> usize {
        self.credentials.iter().filter(|c| c.value.is_some()).count()
    }

    /// Runs `call` with each usable key in order and returns the first success.
    pub async fn first_success<T, F, Fut>(&self, mut call: F) -> Result<T, ProviderError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        for credential in self.attempt_order() {
            let Some(key) = credential.value.clone() else {
                tracing::debug!(
                    provider = self.provider,
                    credential = %credential.name,
                    "skipping unset credential"
                );
                continue;
            };

            match call(key).await {
                Ok(value) => {
                    self.reinstate(&credential.name);
                    tracing::debug!(
                        provider = self.provider,
                        credential = %credential.name,
                        "provider call succeeded"
                    );
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(
                        provider = self.provider,
                        credential = %credential.name,
                        error = %e,
                        "credential failed, trying next"
                    );
                    self.bench(&credential.name);
                }
            }
        }

        Err(ProviderError::Exhausted(self.provider))
    }

    /// Fresh keys in configured order, then benched keys in configured order.
    fn attempt_order(&self) -> Vec<&Credential> {
        if self.cooldown.is_zero() {
            return self.credentials.iter().collect();
        }

        let now = Instant::now();
        let mut benched = self.benched.lock().unwrap_or_else(|e| e.into_inner());
        benched.retain(|_, since| now.duration_since(*since) < self.cooldown);

        let (fresh, resting): (Vec<&Credential>, Vec<&Credential>) = self
            .credentials
            .iter()
            .partition(|c| !benched.contains_key(&c.name));
        fresh.into_iter().chain(resting).collect()
    }

    fn bench(&self, name: &str) {
        if self.cooldown.is_zero() {
            return;
        }
        let mut benched = self.benched.lock().unwrap_or_else(|e| e.into_inner());
        benched.insert(name.to_string(), Instant::now());
    }

    fn reinstate(&self, name: &str) {
        if self.cooldown.is_zero() {
            return;
        }
        let mut benched = self.benched.lock().unwrap_or_else(|e| e.into_inner());
        benched.remove(name);
    }
}
