//! Delivery of the run summary: a dead-man's-switch ping and a push
//! notification. Neither can fail the run; every problem is logged.

use crate::retry::Retry;
use std::{sync::Arc, time::Duration};
use stratus_core::{
    context::RunContext, model::RunResult, secrets::SecretValue, settings::Notifications,
};

mod healthchecks;
mod ntfy;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// An HTTP POST with a plain-text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub bearer_token: Option<SecretValue>,
    pub body: String,
}

impl Request {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Request {
            url: url.into(),
            headers: Vec::new(),
            bearer_token: None,
            body: body.into(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Sends the request and returns the response status code.
    async fn post(&self, request: &Request) -> Result<u16, Error>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("stratus/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(ReqwestTransport { client })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, request: &Request) -> Result<u16, Error> {
        let mut builder = self.client.post(&request.url).body(request.body.clone());
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token.expose());
        }
        let response = builder.send().await.map_err(|e| Error::Transport {
            url: request.url.clone(),
            source: Box::new(e),
        })?;
        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) if !body.is_empty() => tracing::debug!(status, %body, "response"),
            _ => tracing::debug!(status, "response"),
        }
        Ok(status)
    }
}

/// Posts the request once and treats anything but a 2xx status as failure.
async fn deliver(transport: &dyn Transport, request: &Request) -> Result<(), Error> {
    let status = transport.post(request).await?;
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(Error::Status {
            url: request.url.clone(),
            status,
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Delivery {
    /// Not configured.
    Skipped,
    Delivered { attempts: u32 },
    Failed { attempts: u32 },
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Outcome {
    pub healthcheck: Delivery,
    pub push: Delivery,
}

#[derive(Debug, Clone)]
pub struct Notifier {
    transport: Arc<dyn Transport>,
    retry: Retry,
    server_name: String,
    ntfy_url: Option<String>,
    ntfy_token: Option<SecretValue>,
    healthchecks_url: Option<String>,
    top_services: usize,
}

impl Notifier {
    pub fn new(transport: Arc<dyn Transport>, context: &RunContext, settings: &Notifications) -> Self {
        Notifier {
            transport,
            retry: Retry::new(settings.max_attempts, settings.retry_delay),
            server_name: context.server_name.clone(),
            ntfy_url: context.ntfy_url.clone(),
            ntfy_token: context.ntfy_token.clone(),
            healthchecks_url: context.healthchecks_url.clone(),
            top_services: settings.top_services,
        }
    }

    async fn ping(&self, result: &RunResult) -> Delivery {
        let url = match &self.healthchecks_url {
            Some(url) => url,
            None => return Delivery::Skipped,
        };
        let request = healthchecks::request(url, &self.server_name, result);
        match deliver(self.transport.as_ref(), &request).await {
            Ok(()) => {
                tracing::info!(
                    "healthchecks ping sent ({})",
                    if result.succeeded() { "success" } else { "fail" }
                );
                Delivery::Delivered { attempts: 1 }
            }
            Err(e) => {
                tracing::error!("healthchecks ping failed: {}", stratus_core::exec::error_chain(&e));
                Delivery::Failed { attempts: 1 }
            }
        }
    }

    async fn push(&self, result: &RunResult) -> Delivery {
        let url = match &self.ntfy_url {
            Some(url) => url,
            None => {
                tracing::warn!("no ntfy URL configured, skipping push notification");
                return Delivery::Skipped;
            }
        };
        let request = ntfy::request(
            url,
            self.ntfy_token.as_ref(),
            &self.server_name,
            result,
            self.top_services,
        );
        let transport = self.transport.as_ref();
        let request = &request;
        let attempted = self
            .retry
            .run("ntfy notification", |_| deliver(transport, request))
            .await;
        match attempted.result {
            Ok(()) => {
                tracing::info!("ntfy notification sent to {}", url);
                Delivery::Delivered {
                    attempts: attempted.attempts,
                }
            }
            Err(e) => {
                tracing::error!(
                    "ntfy notification to {} failed after {} attempts: {}",
                    url,
                    attempted.attempts,
                    stratus_core::exec::error_chain(&e)
                );
                Delivery::Failed {
                    attempts: attempted.attempts,
                }
            }
        }
    }

    /// Pings the dead-man's switch first, then pushes the summary with
    /// retries.
    pub async fn send(&self, result: &RunResult) -> Outcome {
        let healthcheck = self.ping(result).await;
        let push = self.push(result).await;
        Outcome { healthcheck, push }
    }
}
