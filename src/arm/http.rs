//! HTTP utilities for ARM REST API calls

use super::error::{ArmError, ArmResult};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Header ARM echoes back to correlate requests in its own logs
const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Decode a response body, treating an empty body as `Null`.
pub(crate) fn decode_body(body: &str) -> ArmResult<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| ArmError::Decode(e.to_string()))
}

/// HTTP client wrapper for ARM API calls
#[derive(Clone)]
pub struct ArmHttpClient {
    client: Client,
}

impl ArmHttpClient {
    /// Create a new HTTP client
    pub fn new() -> ArmResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("armstore/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ArmError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Make a GET request
    pub async fn get(&self, url: &str, token: &str) -> ArmResult<Value> {
        self.send(Method::GET, url, token, None).await
    }

    /// Make a PUT request with a JSON body
    pub async fn put(&self, url: &str, token: &str, body: &Value) -> ArmResult<Value> {
        self.send(Method::PUT, url, token, Some(body)).await
    }

    /// Make a POST request
    pub async fn post(&self, url: &str, token: &str, body: Option<&Value>) -> ArmResult<Value> {
        self.send(Method::POST, url, token, body).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str, token: &str) -> ArmResult<Value> {
        self.send(Method::DELETE, url, token, None).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> ArmResult<Value> {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(request_id = %request_id, "{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), url)
            .bearer_auth(token)
            .header(CLIENT_REQUEST_ID_HEADER, &request_id);

        if let Some(body) = body {
            request = request.json(body);
        } else if method == Method::POST {
            // ARM rejects body-less POSTs without a length
            request = request.header(reqwest::header::CONTENT_LENGTH, 0);
        }

        let response = request.send().await.map_err(|e| ArmError::Transport {
            status: None,
            message: format!("Failed to send request: {}", e),
        })?;

        let status = response.status();
        let response_body = response.text().await.map_err(|e| ArmError::Transport {
            status: Some(status.as_u16()),
            message: format!("Failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!(
                request_id = %request_id,
                "API error: {} - {}",
                status,
                sanitize_for_log(&response_body)
            );
            return Err(status_error(status, &response_body));
        }

        decode_body(&response_body)
    }
}

/// Build a transport error from a non-2xx response.
/// Uses the ARM error envelope `{"error": {"code", "message"}}` when present.
fn status_error(status: StatusCode, body: &str) -> ArmError {
    let code = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("error")
            .and_then(|e| e.get("code"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
    });

    let message = match code {
        Some(code) => format!("{} ({})", status, code),
        None => status.to_string(),
    };

    ArmError::Transport {
        status: Some(status.as_u16()),
        message,
    }
}

/// Format an ARM error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_arm_error(error: &ArmError) -> String {
    match error.status() {
        Some(403) => return "Permission denied. Check your Azure role assignments.".to_string(),
        Some(401) => return "Authentication failed. Run 'az login'.".to_string(),
        Some(404) => return "Resource not found.".to_string(),
        Some(429) => return "Rate limit exceeded. Please try again later.".to_string(),
        Some(400) => return "Invalid request. Check your parameters.".to_string(),
        Some(409) => {
            return "Resource conflict. The resource may already exist or be in use.".to_string()
        }
        Some(500) | Some(503) => {
            return "Azure service temporarily unavailable. Please try again.".to_string()
        }
        Some(_) => {
            return "Request failed. Check your network connection and try again.".to_string()
        }
        None => {}
    }

    let error_str = error.to_string();
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(120)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
