//! Final submission of a completed application.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::model::ApplicationRecord;

use super::response::ServiceResponse;

const SUCCESS_MESSAGE: &str = "Registration successful.";
const NO_RESPONSE_MESSAGE: &str = "No response received from registration service.";

/// Accepts a completed record. `data` carries the registration reference.
#[async_trait]
pub trait RegistrationService: Send + Sync {
    async fn submit(&self, record: &ApplicationRecord) -> ServiceResponse<String>;
}

/// Pretends to register after a fixed delay. Used when no endpoint is
/// configured.
#[derive(Debug, Clone)]
pub struct SimulatedRegistrationService {
    delay: Duration,
}

impl SimulatedRegistrationService {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedRegistrationService {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl RegistrationService for SimulatedRegistrationService {
    async fn submit(&self, record: &ApplicationRecord) -> ServiceResponse<String> {
        tokio::time::sleep(self.delay).await;
        let reference = Uuid::new_v4().to_string();
        info!(
            %reference,
            applicant = %record.personal_info.name,
            "Simulated registration accepted"
        );
        ServiceResponse::ok(200, SUCCESS_MESSAGE, reference)
    }
}

/// Loose view of a backend reply; any field may be missing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationReply {
    status: Option<bool>,
    message: Option<String>,
    data: Option<serde_json::Value>,
    reference: Option<String>,
}

impl RegistrationReply {
    fn reference(self) -> String {
        self.reference
            .or_else(|| match self.data {
                Some(serde_json::Value::String(s)) => Some(s),
                Some(serde_json::Value::Object(map)) => map
                    .get("reference")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// POSTs the record JSON to a backend endpoint.
pub struct HttpRegistrationService {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpRegistrationService {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client for registration");
                reqwest::Client::new()
            });
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RegistrationService for HttpRegistrationService {
    async fn submit(&self, record: &ApplicationRecord) -> ServiceResponse<String> {
        let resp = match self.client.post(&self.endpoint).json(record).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "Registration request failed");
                return ServiceResponse::failed(503, NO_RESPONSE_MESSAGE);
            }
        };

        let status = resp.status();
        let code = status.as_u16();
        // Bodies are optional; an empty or non-JSON body reads as all-missing.
        let reply: RegistrationReply = resp.json().await.unwrap_or_default();

        if !status.is_success() {
            let message = reply
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("Registration service error (HTTP {code})."));
            warn!(endpoint = %self.endpoint, status = code, %message, "Registration rejected");
            return ServiceResponse::failed(code, message);
        }

        if reply.status == Some(false) {
            let message = reply
                .message
                .unwrap_or_else(|| "Registration was not accepted.".to_string());
            warn!(endpoint = %self.endpoint, %message, "Registration declined");
            return ServiceResponse::failed(code, message);
        }

        let message = reply
            .message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| SUCCESS_MESSAGE.to_string());
        let reference = reply.reference();
        info!(endpoint = %self.endpoint, %reference, "Registration accepted");
        ServiceResponse::ok(code, message, reference)
    }
}
