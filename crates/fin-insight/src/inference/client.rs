use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::models::{LoanPrediction, SegmentAssignment};
use super::{InferenceError, InferenceService};
use crate::config::InferenceConfig;
use crate::forms::{LoanPayload, SegmentPayload};

const APPLICATION_ERROR_FALLBACK: &str =
    "There was a problem processing your application. Please verify your information and try again.";

/// JSON-over-HTTP client for the two hosted models.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: Client,
    loan_url: String,
    segment_url: String,
}

impl InferenceClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, config))
    }

    pub fn with_client(client: Client, config: &InferenceConfig) -> Self {
        let base = config.base_url.trim_end_matches('/');
        Self {
            client,
            loan_url: format!("{base}{}", config.loan_path),
            segment_url: format!("{base}{}", config.segment_path),
        }
    }

    async fn post_json<B>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<(StatusCode, Value), InferenceError>
    where
        B: Serialize + Sync + ?Sized,
    {
        debug!(%url, "inference request");
        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| network_failure(url, err))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| network_failure(url, err))?;
        let parsed = serde_json::from_slice::<Value>(&bytes).ok();

        if !status.is_success() {
            let message = match parsed {
                Some(body) => error_field(&body)
                    .unwrap_or_else(|| format!("Request failed with status: {}", status.as_u16())),
                None => status_line(status),
            };
            warn!(%url, status = status.as_u16(), %message, "inference request failed");
            return Err(InferenceError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = parsed.ok_or_else(|| {
            warn!(%url, status = status.as_u16(), "inference response was not JSON");
            InferenceError::Http {
                status: status.as_u16(),
                message: status_line(status),
            }
        })?;
        Ok((status, body))
    }

    fn decode<T: DeserializeOwned>(status: StatusCode, body: Value) -> Result<T, InferenceError> {
        serde_json::from_value(body).map_err(|err| {
            warn!(
                status = status.as_u16(),
                error = %err,
                "inference response has an unexpected shape"
            );
            InferenceError::Http {
                status: status.as_u16(),
                message: status_line(status),
            }
        })
    }
}

fn network_failure(url: &str, err: reqwest::Error) -> InferenceError {
    warn!(%url, error = %err, "inference endpoint unreachable");
    InferenceError::Network {
        detail: err.without_url().to_string(),
    }
}

fn status_line(status: StatusCode) -> String {
    format!(
        "Request failed: {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    )
}

fn error_field(body: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl InferenceService for InferenceClient {
    async fn predict_loan(&self, payload: &LoanPayload) -> Result<LoanPrediction, InferenceError> {
        let (status, body) = self.post_json(&self.loan_url, payload).await?;
        if body.get("status").and_then(Value::as_str) != Some("success") {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or(APPLICATION_ERROR_FALLBACK)
                .to_string();
            warn!(%message, "loan model reported a failure");
            return Err(InferenceError::Application { message });
        }
        Self::decode(status, body)
    }

    async fn segment_profile(
        &self,
        payload: &SegmentPayload,
    ) -> Result<SegmentAssignment, InferenceError> {
        let (status, body) = self.post_json(&self.segment_url, payload).await?;
        Self::decode(status, body)
    }
}
