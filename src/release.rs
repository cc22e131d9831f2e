//! Prebuilt LLDB archive resolution from the GitHub release feed.
//!
//! Queries the latest-release endpoint, matches an asset by exact name
//! (`lldb--<triple>.zip`, fail-closed: no fuzzy matching and no fallback
//! to older releases), and streams it to the download cache. Every
//! failure in this module is absorbed into an `Unresolved` result — the
//! invoker decides fatality after the override path has been considered.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::resolve::Resolution;

/// Latest-release metadata endpoint for the prebuilt LLDB feed.
pub const RELEASE_ENDPOINT: &str =
    "https://api.github.com/repos/quarry-dev/lldb-prebuilt/releases/latest";

/// User agent sent on every feed and download request.
pub const USER_AGENT: &str = "quarry-build";

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    assets: Vec<ReleaseAsset>,
}

/// One downloadable asset from the release feed.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// Asset filename expected for a target triple.
pub fn expected_asset_name(triple: &str) -> String {
    format!("lldb--{triple}.zip")
}

/// Select the asset whose name matches `expected` exactly.
pub fn select_asset<'a>(assets: &'a [ReleaseAsset], expected: &str) -> Option<&'a ReleaseAsset> {
    assets.iter().find(|asset| asset.name == expected)
}

/// Resolve the prebuilt archive for `triple`, downloading it into
/// `cache_dir`. Never returns an error: transport failures, a missing
/// asset, or a failed write all come back as `Unresolved` with a logged
/// warning.
pub async fn resolve_archive(
    client: &Client,
    endpoint: &str,
    token: Option<&str>,
    cache_dir: &Path,
    triple: &str,
) -> Resolution<PathBuf> {
    match try_resolve(client, endpoint, token, cache_dir, triple).await {
        Ok(resolution) => resolution,
        Err(e) => {
            warn!("LLDB package resolution failed: {e:#}");
            Resolution::Unresolved(format!("{e:#}"))
        }
    }
}

async fn try_resolve(
    client: &Client,
    endpoint: &str,
    token: Option<&str>,
    cache_dir: &Path,
    triple: &str,
) -> anyhow::Result<Resolution<PathBuf>> {
    let mut request = client
        .get(endpoint)
        .header("User-Agent", USER_AGENT)
        .header("Accept", "application/vnd.github.v3+json");
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .await
        .context("failed to query the release feed")?;
    if !response.status().is_success() {
        let reason = format!("release feed returned HTTP {}", response.status());
        warn!("{reason}");
        return Ok(Resolution::Unresolved(reason));
    }

    let release: Release = response
        .json()
        .await
        .context("failed to parse the release feed response")?;
    debug!(
        "release assets: {:?}",
        release.assets.iter().map(|a| &a.name).collect::<Vec<_>>()
    );

    let expected = expected_asset_name(triple);
    let Some(asset) = select_asset(&release.assets, &expected) else {
        let reason = format!("no release asset named '{expected}'");
        warn!("{reason}");
        return Ok(Resolution::Unresolved(reason));
    };

    fs::create_dir_all(cache_dir).context("failed to create the download cache directory")?;
    let dest = cache_dir.join(&asset.name);
    info!("downloading {} -> {}", asset.name, dest.display());
    download(client, &asset.browser_download_url, &dest).await?;

    Ok(Resolution::Resolved(dest))
}

/// Stream the response body to `dest` chunk by chunk; the whole payload
/// is never held in memory.
async fn download(client: &Client, url: &str, dest: &Path) -> anyhow::Result<()> {
    let response = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await
        .context("failed to start the download")?;
    if !response.status().is_success() {
        anyhow::bail!("download failed: HTTP {}", response.status());
    }

    let mut file = File::create(dest).context("failed to create the download file")?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("error reading the download stream")?;
        file.write_all(&chunk)
            .context("error writing to the download file")?;
    }

    Ok(())
}
