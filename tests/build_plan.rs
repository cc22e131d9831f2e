//! End-to-end plan assembly against a local canned release feed.
//!
//! A plain TCP listener plays the GitHub API: one canned JSON response
//! for the latest-release query and one binary response for the asset
//! download. No real network access, no mocked HTTP library.

use std::fs;
use std::sync::Arc;

use reqwest::Client;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use quarry_build::{BuildConfig, BuildInvoker, HostDescriptor, Platform};

const TRIPLE: &str = "x86_64-linux-gnu";
const ARCHIVE_BYTES: &[u8] = b"PK\x03\x04 fixture archive payload";

fn linux_x64() -> HostDescriptor {
    HostDescriptor {
        platform: Platform::Linux,
        arch: "x64".to_string(),
    }
}

/// Serve the release feed and asset downloads until the listener drops.
async fn serve_feed(listener: TcpListener, release_json: Arc<String>) {
    loop {
        let Ok((mut socket, _)) = listener.accept().await else {
            break;
        };
        let release_json = Arc::clone(&release_json);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            let (content_type, body): (&str, Vec<u8>) =
                if request.starts_with("GET /releases/latest") {
                    ("application/json", release_json.as_bytes().to_vec())
                } else {
                    ("application/zip", ARCHIVE_BYTES.to_vec())
                };
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = socket.write_all(header.as_bytes()).await;
            let _ = socket.write_all(&body).await;
            let _ = socket.shutdown().await;
        });
    }
}

/// Start the fixture feed; returns the latest-release endpoint URL.
async fn start_feed() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let release_json = Arc::new(format!(
        r#"{{
            "tag_name": "v17.0.6",
            "assets": [
                {{"name": "lldb--aarch64-linux-gnu.zip",
                  "browser_download_url": "http://{addr}/assets/lldb--aarch64-linux-gnu.zip"}},
                {{"name": "lldb--{TRIPLE}.zip",
                  "browser_download_url": "http://{addr}/assets/lldb--{TRIPLE}.zip"}}
            ]
        }}"#
    ));
    tokio::spawn(serve_feed(listener, release_json));
    format!("http://{addr}/releases/latest")
}

#[tokio::test]
async fn linux_x64_plan_with_downloaded_archive() {
    let endpoint = start_feed().await;
    let root = TempDir::new().unwrap();

    let toolchain = root.path().join("cmake").join("toolchain-x86_64-linux-gnu.cmake");
    fs::create_dir_all(toolchain.parent().unwrap()).unwrap();
    fs::write(&toolchain, "set(CMAKE_C_COMPILER gcc)\n").unwrap();

    let invoker = BuildInvoker::new(
        root.path().to_path_buf(),
        BuildConfig::default(),
        linux_x64(),
    )
    .with_endpoint(endpoint);

    let plan = invoker.plan(&Client::new()).await.unwrap();

    // Single-configuration fast generator off Windows
    let configure = plan.configure_args.join(" ");
    assert!(configure.contains("-G Ninja"));
    assert!(!configure.contains("Visual Studio"));

    // Toolchain flag points at the descriptor that exists on disk
    assert!(configure.contains(&format!("-DCMAKE_TOOLCHAIN_FILE={}", toolchain.display())));

    // The archive was streamed into the cache and wired into configure
    let archive = root
        .path()
        .join("downloads/lldb")
        .join(format!("lldb--{TRIPLE}.zip"));
    assert!(configure.contains(&format!("-DLLDB_PACKAGE={}", archive.display())));
    assert_eq!(fs::read(&archive).unwrap(), ARCHIVE_BYTES);

    // Build phase: release config, parallelism, no target restriction
    let build = plan.build_args.join(" ");
    assert!(build.contains("--config Release"));
    assert!(build.contains("--parallel"));
    assert!(!build.contains("--target"));
}

#[tokio::test]
async fn redownload_overwrites_the_cached_archive() {
    let endpoint = start_feed().await;
    let root = TempDir::new().unwrap();

    let invoker = BuildInvoker::new(
        root.path().to_path_buf(),
        BuildConfig::default(),
        linux_x64(),
    )
    .with_endpoint(endpoint);

    let client = Client::new();
    let first = invoker.plan(&client).await.unwrap();
    let second = invoker.plan(&client).await.unwrap();

    // Identical path both runs, one file in the cache, not a duplicate
    let package_flag = |plan: &quarry_build::BuildPlan| {
        plan.configure_args
            .iter()
            .find(|a| a.starts_with("-DLLDB_PACKAGE="))
            .cloned()
            .unwrap()
    };
    assert_eq!(package_flag(&first), package_flag(&second));

    let cache = root.path().join("downloads/lldb");
    let entries: Vec<_> = fs::read_dir(&cache).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        fs::read(cache.join(format!("lldb--{TRIPLE}.zip"))).unwrap(),
        ARCHIVE_BYTES
    );
}

#[tokio::test]
async fn archive_override_skips_the_download_entirely() {
    // Endpoint that refuses connections: the override must make it moot
    let root = TempDir::new().unwrap();
    let config = BuildConfig {
        lldb_archive: Some("/prefetched/lldb.zip".into()),
        ..Default::default()
    };
    let invoker = BuildInvoker::new(root.path().to_path_buf(), config, linux_x64())
        .with_endpoint("http://127.0.0.1:9/releases/latest");

    let plan = invoker.plan(&Client::new()).await.unwrap();
    assert!(
        plan.configure_args
            .contains(&"-DLLDB_PACKAGE=/prefetched/lldb.zip".to_string())
    );
    assert!(!root.path().join("downloads").exists());
}
