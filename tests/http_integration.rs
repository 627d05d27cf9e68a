//! Integration tests for the ARM services using wiremock
//!
//! These tests drive the real HTTP client against mocked endpoints, checking
//! the wire shape of every operation and the multi-group aggregation path.

use armstore::arm::http::format_arm_error;
use armstore::arm::{ArmError, Credentials};
use armstore::resource::{KeyName, SnapshotParams, StorageAccountParams};
use armstore::{ClientConfig, ResourceClient};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{bearer_token, body_json, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUB: &str = "sub-1";
const STORAGE_VERSION: &str = "2015-05-01-preview";

fn storage_path(group: &str, rest: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Storage/storageAccounts{}",
        SUB, group, rest
    )
}

fn client_for(server: &MockServer) -> ResourceClient {
    let config = ClientConfig::new(SUB)
        .with_endpoint(&server.uri())
        .expect("mock server uri is a valid endpoint");
    ResourceClient::new(&config, Credentials::static_token("test-token"))
        .expect("client should build")
}

async fn mount_groups(server: &MockServer, groups: &[&str]) {
    let value: Vec<Value> = groups.iter().map(|g| json!({"name": g})).collect();
    Mock::given(method("GET"))
        .and(path(format!("/subscriptions/{}/resourcegroups", SUB)))
        .and(query_param("api-version", "2015-11-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": value })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_group_listing(server: &MockServer, group: &str, names: &[&str]) {
    let value: Vec<Value> = names
        .iter()
        .map(|n| json!({"name": n, "location": "westus", "properties": {"accountType": "Standard_LRS"}}))
        .collect();
    Mock::given(method("GET"))
        .and(path(storage_path(group, "")))
        .and(query_param("api-version", STORAGE_VERSION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": value })))
        .expect(1)
        .mount(server)
        .await;
}

/// Storage account operations
mod storage_tests {
    use super::*;

    /// Every request carries the token, the pinned version and a request id
    #[tokio::test]
    async fn test_get_sends_version_token_and_request_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(storage_path("rg1", "/acct1")))
            .and(query_param("api-version", STORAGE_VERSION))
            .and(bearer_token("test-token"))
            .and(header_exists("x-ms-client-request-id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "acct1",
                "location": "westus",
                "properties": {"accountType": "Standard_LRS"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let record = client_for(&server)
            .storage
            .get("acct1", "rg1", false)
            .await
            .expect("get should succeed");

        assert_eq!(record.name, "acct1");
        assert!(record.resource_group.is_none());
        assert!(!record.properties.contains_key("primaryKey"));
    }

    #[tokio::test]
    async fn test_get_with_keys_merges_keys() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(storage_path("rg1", "/acct1")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "acct1",
                "properties": {"accountType": "Standard_ZRS"}
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(storage_path("rg1", "/acct1/listKeys")))
            .and(query_param("api-version", STORAGE_VERSION))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"primaryKey": "pk", "secondaryKey": "sk"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let record = client_for(&server)
            .storage
            .get("acct1", "rg1", true)
            .await
            .expect("get should succeed");

        assert_eq!(record.properties["accountType"], "Standard_ZRS");
        assert_eq!(record.properties["primaryKey"], "pk");
        assert_eq!(record.properties["secondaryKey"], "sk");
    }

    #[tokio::test]
    async fn test_create_puts_expected_body() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(storage_path("rg1", "/acct1")))
            .and(body_json(json!({
                "name": "acct1",
                "location": "westus",
                "tags": {"env": "prod"},
                "properties": {"accountType": "Standard_RAGRS"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "acct1",
                "location": "westus",
                "properties": {"accountType": "Standard_RAGRS", "provisioningState": "Creating"}
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let params =
            StorageAccountParams::new("acct1", "westus", "Standard_RAGRS").with_tag("env", "prod");

        let created = client.storage.create(&params, "rg1").await.expect("create");
        let updated = client.storage.update(&params, "rg1").await.expect("update");
        assert_eq!(created, updated);
        assert_eq!(created["properties"]["provisioningState"], "Creating");
    }

    /// Validation failures never reach the server
    #[tokio::test]
    async fn test_invalid_create_sends_nothing() {
        let server = MockServer::start().await;
        let client = client_for(&server);

        let params = StorageAccountParams::new("acct-1", "westus", "Standard_LRS");
        let err = client.storage.create(&params, "rg1").await.unwrap_err();
        assert!(matches!(err, ArmError::InvalidAccountName(_)));

        let received = server.received_requests().await.unwrap_or_default();
        assert!(received.is_empty());
    }

    #[tokio::test]
    async fn test_delete_with_empty_body() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path(storage_path("rg1", "/acct1")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .storage
            .delete("acct1", "rg1")
            .await
            .expect("delete should succeed");
        assert_eq!(response, Value::Null);
    }

    #[tokio::test]
    async fn test_regenerate_key_posts_key_name() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(storage_path("rg1", "/acct1/regenerateKey")))
            .and(body_json(json!({"keyName": "key2"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"primaryKey": "pk", "secondaryKey": "fresh"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let keys = client_for(&server)
            .storage
            .regenerate_key("acct1", "rg1", KeyName::Key2)
            .await
            .expect("regenerate should succeed");
        assert_eq!(keys.secondary_key, "fresh");
    }

    #[tokio::test]
    async fn test_not_found_is_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(storage_path("rg1", "/missing")))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": "ResourceNotFound", "message": "gone"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .storage
            .get("missing", "rg1", false)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("ResourceNotFound"));
        assert_eq!(format_arm_error(&err), "Resource not found.");
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(storage_path("rg1", "/acct1")))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"name\": "))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .storage
            .get("acct1", "rg1", false)
            .await
            .unwrap_err();
        assert!(matches!(err, ArmError::Decode(_)));
    }

    #[tokio::test]
    async fn test_list_all_for_subscription() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!(
                "/subscriptions/{}/providers/Microsoft.Storage/storageAccounts",
                SUB
            )))
            .and(query_param("api-version", STORAGE_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"name": "a"}, {"name": "b"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let records = client_for(&server)
            .storage
            .list_all_for_subscription()
            .await
            .expect("listing should succeed");
        assert_eq!(records.len(), 2);
    }
}

/// Multi-group aggregation over real HTTP
mod aggregation_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_without_group_tags_every_record() {
        let server = MockServer::start().await;
        mount_groups(&server, &["rg-a", "rg-b", "rg-c"]).await;
        mount_group_listing(&server, "rg-a", &["a1", "a2"]).await;
        mount_group_listing(&server, "rg-b", &[]).await;
        mount_group_listing(&server, "rg-c", &["c1"]).await;

        let mut records = client_for(&server)
            .storage
            .list(None)
            .await
            .expect("aggregation should succeed");
        records.sort_by(|a, b| a.name.cmp(&b.name));

        let tagged: Vec<_> = records
            .iter()
            .map(|r| (r.name.clone(), r.resource_group.clone().unwrap_or_default()))
            .collect();
        assert_eq!(
            tagged,
            vec![
                ("a1".to_string(), "rg-a".to_string()),
                ("a2".to_string(), "rg-a".to_string()),
                ("c1".to_string(), "rg-c".to_string()),
            ]
        );
        // each group once, plus the enumeration
        server.verify().await;
    }

    #[tokio::test]
    async fn test_list_waits_for_slow_group() {
        let server = MockServer::start().await;
        mount_groups(&server, &["fast", "slow"]).await;
        mount_group_listing(&server, "fast", &["f1"]).await;

        Mock::given(method("GET"))
            .and(path(storage_path("slow", "")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"value": [{"name": "s1"}]}))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let records = client_for(&server).storage.list(None).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .any(|r| r.name == "s1" && r.resource_group.as_deref() == Some("slow")));
    }

    #[tokio::test]
    async fn test_failed_group_is_reported() {
        let server = MockServer::start().await;
        mount_groups(&server, &["good", "bad"]).await;
        mount_group_listing(&server, "good", &["g1"]).await;

        Mock::given(method("GET"))
            .and(path(storage_path("bad", "")))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client_for(&server).storage.list(None).await.unwrap_err();
        let ArmError::GroupsFailed { failures, records } = err else {
            panic!("expected GroupsFailed");
        };
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].group, "bad");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].resource_group.as_deref(), Some("good"));
    }

    #[tokio::test]
    async fn test_list_with_group_skips_enumeration() {
        let server = MockServer::start().await;
        mount_group_listing(&server, "rg1", &["x"]).await;

        let records = client_for(&server).storage.list(Some("rg1")).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].resource_group.is_none());

        let received = server.received_requests().await.unwrap_or_default();
        assert_eq!(received.len(), 1);
    }
}

/// Snapshot operations use the compute provider and version
mod snapshot_tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_create_and_get() {
        let server = MockServer::start().await;
        let snap_path = format!(
            "/subscriptions/{}/resourceGroups/rg1/providers/Microsoft.Compute/snapshots/snap1",
            SUB
        );

        Mock::given(method("PUT"))
            .and(path(snap_path.clone()))
            .and(query_param("api-version", "2016-04-30-preview"))
            .and(body_json(json!({
                "name": "snap1",
                "location": "westus",
                "tags": {},
                "properties": {"creationData": {"createOption": "Empty"}, "diskSizeGB": 8}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "snap1"})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(snap_path))
            .and(query_param("api-version", "2016-04-30-preview"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "snap1",
                "location": "westus",
                "properties": {"diskSizeGB": 8}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let properties = json!({"creationData": {"createOption": "Empty"}, "diskSizeGB": 8});
        let params = SnapshotParams::new("snap1", "westus")
            .with_properties(properties.as_object().cloned().unwrap_or_default());

        client.snapshots.create(&params, "rg1").await.expect("create");
        let record = client.snapshots.get("snap1", "rg1").await.expect("get");
        assert_eq!(record.properties["diskSizeGB"], 8);
    }
}
