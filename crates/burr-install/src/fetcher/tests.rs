//! Unit tests for the HTTP tarball fetcher

use super::*;

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn package_tarball(files: &[(&str, &str)]) -> Vec<u8> {
    let mut data = Vec::new();
    {
        let encoder = GzEncoder::new(&mut data, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, body) in files {
            let mut header = tar::Header::new_gnu();
            header.set_path(format!("package/{}", name)).unwrap();
            header.set_size(body.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append(&header, body.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }
    data
}

fn fetcher() -> HttpTarballFetcher {
    HttpTarballFetcher::new(Duration::from_secs(5), true).unwrap()
}

/// Names left in `dir`, sorted
fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_effective_url() {
    let upgrading = fetcher();
    assert_eq!(
        upgrading.effective_url("http://registry.npmjs.org/left/-/left-1.0.0.tgz"),
        "https://registry.npmjs.org/left/-/left-1.0.0.tgz"
    );
    assert_eq!(
        upgrading.effective_url("https://registry.npmjs.org/x.tgz"),
        "https://registry.npmjs.org/x.tgz"
    );

    let plain = HttpTarballFetcher::new(Duration::from_secs(5), false).unwrap();
    assert_eq!(plain.effective_url("http://localhost/x.tgz"), "http://localhost/x.tgz");
}

#[tokio::test]
async fn test_fetch_and_extract() {
    let server = MockServer::start().await;
    let body = package_tarball(&[("package.json", "{\"name\":\"left\"}"), ("index.js", "module.exports = 1")]);
    Mock::given(method("GET"))
        .and(path("/left/-/left-1.2.0.tgz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(1)
        .mount(&server)
        .await;

    let root = tempdir().unwrap();
    let destination = root.path().join("left");
    let url = format!("{}/left/-/left-1.2.0.tgz", server.uri());

    // mock server speaks plain http
    let plain = HttpTarballFetcher::new(Duration::from_secs(5), false).unwrap();
    plain.fetch_and_extract(&url, &destination).await.unwrap();

    assert_eq!(
        fs::read_to_string(destination.join("index.js")).unwrap(),
        "module.exports = 1"
    );
    assert!(destination.join("package.json").exists());
    assert_eq!(listing(root.path()), vec!["left"]);
}

#[tokio::test]
async fn test_failed_download_leaves_no_temp_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let root = tempdir().unwrap();
    let destination = root.path().join("left");
    let url = format!("{}/left/-/left-9.9.9.tgz", server.uri());

    let plain = HttpTarballFetcher::new(Duration::from_secs(5), false).unwrap();
    let result = plain.fetch_and_extract(&url, &destination).await;

    assert!(matches!(result, Err(BurrError::Network { .. })));
    assert!(listing(root.path()).is_empty());
}

#[tokio::test]
async fn test_corrupt_tarball_leaves_no_temp_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not a tarball".to_vec()))
        .mount(&server)
        .await;

    let root = tempdir().unwrap();
    let destination = root.path().join("left");
    let url = format!("{}/left.tgz", server.uri());

    let plain = HttpTarballFetcher::new(Duration::from_secs(5), false).unwrap();
    let result = plain.fetch_and_extract(&url, &destination).await;

    assert!(matches!(result, Err(BurrError::Io { .. })));
    let leftovers: Vec<String> = listing(root.path())
        .into_iter()
        .filter(|name| name.starts_with(".burr-download-"))
        .collect();
    assert!(leftovers.is_empty());
}
