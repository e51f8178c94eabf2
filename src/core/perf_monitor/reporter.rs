//! Fire-and-forget delivery of samples to the analytics endpoint.
//!
//! One POST per sample, bounded by a timeout. Failures are logged once and
//! dropped: no retry, no queue, nothing surfaces to the caller.

use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use url::Url;

use super::metrics::SampleValue;
use crate::platform::{EffectiveConnectionType, Host, Viewport};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(reqwest::Error),

    #[error("endpoint answered {0}")]
    Status(StatusCode),
}

/// JSON document posted for every sample
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    pub metric: String,
    pub value: SampleValue,
    pub timestamp: i64,
    pub url: String,
    pub user_agent: String,
    pub viewport: Option<Viewport>,
    pub connection: Option<EffectiveConnectionType>,
}

#[derive(Clone)]
pub struct Reporter {
    client: Client,
    endpoint: Url,
    timeout: Duration,
    host: Arc<dyn Host>,
    namespace: Option<String>,
}

impl Reporter {
    pub fn new(
        endpoint: Url,
        timeout: Duration,
        host: Arc<dyn Host>,
    ) -> crate::error::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vitalwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            timeout,
            host,
            namespace: None,
        })
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn payload(&self, metric: &str, value: SampleValue) -> ReportPayload {
        let context = self.host.page_context();
        let metric = match &self.namespace {
            Some(namespace) => format!("{}/{}", namespace, metric),
            None => metric.to_string(),
        };

        ReportPayload {
            metric,
            value,
            timestamp: chrono::Utc::now().timestamp_millis(),
            url: context.url,
            user_agent: context.user_agent,
            viewport: context.viewport,
            connection: context.connection,
        }
    }

    /// Queue one delivery on the current runtime and return immediately.
    pub fn report(&self, metric: &str, value: SampleValue) {
        let Ok(runtime) = Handle::try_current() else {
            log::debug!("No async runtime, dropping report for '{}'", metric);
            return;
        };

        let payload = self.payload(metric, value);
        let reporter = self.clone();

        runtime.spawn(async move {
            if let Err(e) = reporter.deliver(&payload).await {
                log::warn!("Failed to report '{}': {}", payload.metric, e);
            }
        });
    }

    /// Single delivery attempt.
    pub async fn deliver(&self, payload: &ReportPayload) -> Result<(), ReportError> {
        let request = self.client.post(self.endpoint.clone()).json(payload).send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| ReportError::Timeout(self.timeout))?
            .map_err(|e| {
                if e.is_timeout() {
                    ReportError::Timeout(self.timeout)
                } else {
                    ReportError::Network(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(ReportError::Status(response.status()));
        }

        Ok(())
    }
}
