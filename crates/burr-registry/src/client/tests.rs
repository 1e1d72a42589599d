//! Unit tests for the registry client

use super::*;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer, max_retries: u32) -> RegistryClient {
    RegistryClient::with_config(ClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        retry: RetryConfig {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        },
    })
    .unwrap()
}

fn left_document() -> serde_json::Value {
    serde_json::json!({
        "name": "left",
        "dist-tags": { "latest": "1.2.0" },
        "versions": {
            "1.2.0": {
                "version": "1.2.0",
                "dependencies": { "shared": "^1.0.0" },
                "dist": { "tarball": "https://registry.npmjs.org/left/-/left-1.2.0.tgz" }
            },
            "1.0.0": {
                "version": "1.0.0",
                "dist": { "tarball": "https://registry.npmjs.org/left/-/left-1.0.0.tgz" }
            }
        }
    })
}

#[tokio::test]
async fn test_registry_client_creation() {
    let client = RegistryClient::new().unwrap();
    assert_eq!(client.base_url, "https://registry.npmjs.org");
    assert_eq!(client.retry_config.max_retries, 3);
}

#[tokio::test]
async fn test_base_url_validation() {
    let trailing = RegistryClient::with_config(ClientConfig {
        base_url: "https://npm.example.com/".to_string(),
        ..ClientConfig::default()
    })
    .unwrap();
    assert_eq!(trailing.base_url(), "https://npm.example.com");

    for bad in ["not a url", "ftp://npm.example.com"] {
        let result = RegistryClient::with_config(ClientConfig {
            base_url: bad.to_string(),
            ..ClientConfig::default()
        });
        assert!(matches!(result, Err(BurrError::ConfigValidation { .. })), "{bad}");
    }
}

#[tokio::test]
async fn test_encode_package_name() {
    let client = RegistryClient::new().unwrap();
    assert_eq!(client.encode_package_name("left-pad"), "left-pad");
    assert_eq!(client.encode_package_name("@types/node"), "@types%2fnode");
}

#[tokio::test]
async fn test_retry_config_default() {
    let config = RetryConfig::default();
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.initial_delay, Duration::from_millis(100));
    assert_eq!(config.max_delay, Duration::from_secs(10));
    assert_eq!(config.multiplier, 2.0);
}

#[tokio::test]
async fn test_fetch_document_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/left"))
        .and(header("Accept", INSTALL_ACCEPT))
        .respond_with(ResponseTemplate::new(200).set_body_json(left_document()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, 3);
    let document = client.fetch_document("left").await.unwrap();
    assert_eq!(document.name, "left");
    assert_eq!(document.versions.len(), 2);
}

#[tokio::test]
async fn test_provider_fetch_builds_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/left"))
        .respond_with(ResponseTemplate::new(200).set_body_json(left_document()))
        .mount(&server)
        .await;

    let client = test_client(&server, 0);
    let metadata = MetadataProvider::fetch(&client, "left").await.unwrap();
    let newest = metadata.newest_first().next().unwrap();
    assert_eq!(newest.version.to_string(), "1.2.0");
    assert_eq!(newest.dependencies["shared"].as_str(), "^1.0.0");
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, 3);
    let result = client.fetch_document("missing").await;
    assert!(matches!(result, Err(BurrError::PackageNotFound { ref name }) if name == "missing"));
}

#[tokio::test]
async fn test_malformed_document_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ not json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, 3);
    let result = client.fetch_document("broken").await;
    assert!(matches!(result, Err(BurrError::RegistryParse { .. })));
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server, 2);
    let result = client.fetch_document("flaky").await;
    let error = result.unwrap_err();
    assert!(matches!(error, BurrError::Network { .. }));
    assert!(error.is_recoverable());
}
