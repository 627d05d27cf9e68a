//! ARM Client
//!
//! Main client for the Azure Resource Manager API, combining authentication
//! and HTTP functionality.

use super::auth::Credentials;
use super::error::ArmResult;
use super::http::ArmHttpClient;
use super::Transport;
use async_trait::async_trait;
use serde_json::Value;

/// Main ARM client
#[derive(Clone)]
pub struct ArmClient {
    pub credentials: Credentials,
    pub http: ArmHttpClient,
}

impl ArmClient {
    /// Create a new ARM client
    pub fn new(credentials: Credentials) -> ArmResult<Self> {
        let http = ArmHttpClient::new()?;
        Ok(Self { credentials, http })
    }

    /// Get the current access token
    pub async fn get_token(&self) -> ArmResult<String> {
        self.credentials.get_token().await
    }
}

#[async_trait]
impl Transport for ArmClient {
    async fn get(&self, url: &str) -> ArmResult<Value> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    async fn put(&self, url: &str, body: &Value) -> ArmResult<Value> {
        let token = self.get_token().await?;
        self.http.put(url, &token, body).await
    }

    async fn post(&self, url: &str, body: Option<&Value>) -> ArmResult<Value> {
        let token = self.get_token().await?;
        self.http.post(url, &token, body).await
    }

    async fn delete(&self, url: &str) -> ArmResult<Value> {
        let token = self.get_token().await?;
        self.http.delete(url, &token).await
    }
}
