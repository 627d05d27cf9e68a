//! In-memory transport and group source for unit tests

use crate::arm::error::{ArmError, ArmResult};
use crate::arm::{GroupEnumerator, ResourceGroup, Transport, UrlBuilder};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const TEST_SUBSCRIPTION: &str = "sub-1";
pub const TEST_ENDPOINT: &str = "https://management.azure.com";

pub fn storage_urls() -> UrlBuilder {
    UrlBuilder::new(
        TEST_ENDPOINT,
        TEST_SUBSCRIPTION,
        "Microsoft.Storage",
        "storageAccounts",
        "2015-05-01-preview",
    )
}

pub fn snapshot_urls() -> UrlBuilder {
    UrlBuilder::new(
        TEST_ENDPOINT,
        TEST_SUBSCRIPTION,
        "Microsoft.Compute",
        "snapshots",
        "2016-04-30-preview",
    )
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub body: Option<Value>,
}

#[derive(Clone)]
enum Reply {
    Body(Value),
    Status(u16),
}

/// Routes `(method, url)` to canned replies and records every call
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(String, String), Reply>>,
    delays: Mutex<HashMap<String, Duration>>,
    requests: Mutex<Vec<RecordedRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: &str, url: &str, body: Value) {
        self.routes
            .lock()
            .unwrap()
            .insert((method.to_string(), url.to_string()), Reply::Body(body));
    }

    pub fn fail(&self, method: &str, url: &str, status: u16) {
        self.routes
            .lock()
            .unwrap()
            .insert((method.to_string(), url.to_string()), Reply::Status(status));
    }

    pub fn delay(&self, url: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(url.to_string(), delay);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }

    /// Highest number of requests observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn handle(&self, method: &'static str, url: &str, body: Option<&Value>) -> ArmResult<Value> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url: url.to_string(),
            body: body.cloned(),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.lock().unwrap().get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .routes
            .lock()
            .unwrap()
            .get(&(method.to_string(), url.to_string()))
            .cloned();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            Some(Reply::Body(value)) => Ok(value),
            Some(Reply::Status(status)) => Err(ArmError::Transport {
                status: Some(status),
                message: format!("HTTP {}", status),
            }),
            None => Err(ArmError::Transport {
                status: Some(404),
                message: format!("no route for {} {}", method, url),
            }),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str) -> ArmResult<Value> {
        self.handle("GET", url, None).await
    }

    async fn put(&self, url: &str, body: &Value) -> ArmResult<Value> {
        self.handle("PUT", url, Some(body)).await
    }

    async fn post(&self, url: &str, body: Option<&Value>) -> ArmResult<Value> {
        self.handle("POST", url, body).await
    }

    async fn delete(&self, url: &str) -> ArmResult<Value> {
        self.handle("DELETE", url, None).await
    }
}

/// Fixed list of groups
pub struct StaticGroups {
    groups: Vec<ResourceGroup>,
    calls: AtomicUsize,
}

impl StaticGroups {
    pub fn new(names: &[&str]) -> Self {
        Self {
            groups: names
                .iter()
                .map(|name| ResourceGroup {
                    name: name.to_string(),
                    location: None,
                    id: None,
                })
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GroupEnumerator for StaticGroups {
    async fn list_resource_groups(&self) -> ArmResult<Vec<ResourceGroup>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.groups.clone())
    }
}
