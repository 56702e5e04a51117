// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request execution: the resolve / authenticate / send / retry loop.
//!
//! One call moves through `Uninitialized -> Resolving -> Ready -> Sending`
//! and ends in success, a terminal failure, or a bounded `RetryWait ->
//! Resolving` loop. Resolution failures are terminal for the call and never
//! consume retry budget; HTTP-level rejections are terminal because the
//! device's answer is deterministic; only transient network faults re-enter
//! the loop, each retry re-resolving the host into a fresh
//! [`ConnectionContext`].

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::client::connection::{ConnectionContext, WSMAN_PATH};
use crate::client::resolver;
use crate::client::AmtClientConfig;
use crate::error::{AmtError, Result};
use crate::runtime::{is_transient, RetryConfig};
use crate::wsman::{DigestAuthenticator, WsmanRequest};

const SOAP_CONTENT_TYPE: &str = "application/soap+xml;charset=UTF-8";

/// Drives authenticated WS-Management exchanges against one device.
#[derive(Debug)]
pub struct RequestExecutor {
    config: AmtClientConfig,
    retry: RetryConfig,
    auth: DigestAuthenticator,
    // Shared across concurrent callers; re-resolution replaces the whole
    // value, last writer wins.
    context: RwLock<Option<ConnectionContext>>,
}

impl RequestExecutor {
    /// Create an executor for `config`, sharing `retry` with the digest
    /// challenge probe.
    #[must_use]
    pub fn new(config: AmtClientConfig, retry: RetryConfig) -> Self {
        let auth = DigestAuthenticator::new(
            config.username.clone(),
            config.password.clone(),
            retry.clone(),
        );
        Self {
            config,
            retry,
            auth,
            context: RwLock::new(None),
        }
    }

    /// Execute one WS-Management exchange and return the raw response body.
    pub async fn send(&self, request: &WsmanRequest) -> Result<String> {
        let mut attempt: u32 = 0;

        loop {
            let context = self.ensure_context().await?;
            let url = context.base_url.clone();

            let authorization = self
                .auth
                .authorization_for(&context.agent, url.as_str(), "POST", WSMAN_PATH)
                .await?;

            let mut http_request = context
                .agent
                .post(url.clone())
                .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
                .header("SOAPAction", request.action)
                .body(request.body.clone());
            if let Some(header) = authorization {
                http_request = http_request.header(AUTHORIZATION, header);
            }

            debug!(action = request.action, %url, attempt, "Sending WS-Management request");

            let outcome = async {
                let response = http_request.send().await?;
                let status = response.status();
                let body = response.text().await?;
                Ok::<_, reqwest::Error>((status, body))
            }
            .await;

            match outcome {
                Ok((status, body)) => {
                    if !status.is_success() {
                        return Err(AmtError::Protocol {
                            status: status.as_u16(),
                            body,
                        });
                    }
                    return Ok(body);
                }
                Err(err) if is_transient(&err) => {
                    if attempt < self.retry.max_retries {
                        warn!(%err, attempt, "Transient network fault, re-resolving and retrying");
                        self.retry.wait(attempt).await;
                        self.invalidate_context().await;
                        attempt += 1;
                    } else {
                        return Err(AmtError::ConnectionExhausted {
                            attempts: attempt + 1,
                            endpoint: url.to_string(),
                            source: err,
                        });
                    }
                }
                Err(err) => return Err(AmtError::Transport(err)),
            }
        }
    }

    /// Return the current context, resolving the host and building a fresh
    /// one if none exists.
    async fn ensure_context(&self) -> Result<ConnectionContext> {
        if let Some(context) = self.context.read().await.as_ref() {
            return Ok(context.clone());
        }

        let ip = resolver::resolve(
            &self.config.host,
            self.config.port,
            self.config.force_ipv4,
        )
        .await?;
        let context = ConnectionContext::establish(ip, &self.config)?;

        let mut slot = self.context.write().await;
        *slot = Some(context.clone());
        Ok(context)
    }

    async fn invalidate_context(&self) {
        let mut slot = self.context.write().await;
        *slot = None;
    }
}
