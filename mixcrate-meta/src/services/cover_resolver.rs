//! Cover artwork resolution
//!
//! Resolves a candidate's remote cover URL to a local file under the
//! library's covers directory. Strictly best-effort: any failure degrades to
//! `None` and the merge proceeds with the cover field left empty.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(20);
const USER_AGENT: &str = "mixcrate/0.1.0";

/// Resolves cover URLs to local artwork paths
#[async_trait]
pub trait CoverResolver: Send + Sync {
    /// Best-effort resolution; never raises
    async fn resolve(&self, track_id: Uuid, cover_url: &str) -> Option<String>;
}

/// Downloads covers over HTTP into a local directory
///
/// Covers land at `<covers_dir>/<track_id>.<ext>` with the extension taken
/// from the URL (png stays png, everything else is treated as jpg). An
/// already-present file is reused without re-downloading.
pub struct HttpCoverResolver {
    http_client: reqwest::Client,
    covers_dir: PathBuf,
}

impl HttpCoverResolver {
    pub fn new(covers_dir: PathBuf) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;

        Ok(Self {
            http_client,
            covers_dir,
        })
    }

    fn destination(&self, track_id: Uuid, cover_url: &str) -> PathBuf {
        let ext = if cover_url.to_lowercase().ends_with(".png") {
            "png"
        } else {
            "jpg"
        };
        self.covers_dir.join(format!("{}.{}", track_id, ext))
    }

    async fn download(&self, cover_url: &str, dest: &PathBuf) -> anyhow::Result<()> {
        let response = self
            .http_client
            .get(cover_url)
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;

        tokio::fs::create_dir_all(&self.covers_dir).await?;
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl CoverResolver for HttpCoverResolver {
    async fn resolve(&self, track_id: Uuid, cover_url: &str) -> Option<String> {
        if cover_url.trim().is_empty() {
            return None;
        }

        let dest = self.destination(track_id, cover_url);
        if dest.exists() {
            return Some(dest.to_string_lossy().into_owned());
        }

        match self.download(cover_url, &dest).await {
            Ok(()) => {
                tracing::debug!(track_id = %track_id, path = %dest.display(), "Cover downloaded");
                Some(dest.to_string_lossy().into_owned())
            }
            Err(e) => {
                tracing::warn!(
                    track_id = %track_id,
                    url = %cover_url,
                    error = %e,
                    "Cover resolution failed, leaving cover empty"
                );
                None
            }
        }
    }
}

/// Resolver that never produces artwork
///
/// For deployments without a covers directory; merges simply leave the
/// cover field empty.
pub struct NullCoverResolver;

#[async_trait]
impl CoverResolver for NullCoverResolver {
    async fn resolve(&self, _track_id: Uuid, _cover_url: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_extension_from_url() {
        let tmp = tempfile::tempdir().unwrap();
        let resolver = HttpCoverResolver::new(tmp.path().to_path_buf()).unwrap();
        let track_id = Uuid::new_v4();

        let png = resolver.destination(track_id, "https://img.example.com/cover.PNG");
        assert!(png.to_string_lossy().ends_with(&format!("{}.png", track_id)));

        let jpg = resolver.destination(track_id, "https://img.example.com/cover.jpeg");
        assert!(jpg.to_string_lossy().ends_with(&format!("{}.jpg", track_id)));
    }

    #[tokio::test]
    async fn test_existing_file_reused_without_download() {
        let tmp = tempfile::tempdir().unwrap();
        let resolver = HttpCoverResolver::new(tmp.path().to_path_buf()).unwrap();
        let track_id = Uuid::new_v4();

        let dest = tmp.path().join(format!("{}.jpg", track_id));
        std::fs::write(&dest, b"cached").unwrap();

        // URL is unreachable; a download attempt would fail, so success here
        // proves the cached file was reused.
        let resolved = resolver
            .resolve(track_id, "http://127.0.0.1:1/cover.jpg")
            .await;
        assert_eq!(resolved, Some(dest.to_string_lossy().into_owned()));
    }

    #[tokio::test]
    async fn test_unreachable_url_degrades_to_none() {
        let tmp = tempfile::tempdir().unwrap();
        let resolver = HttpCoverResolver::new(tmp.path().to_path_buf()).unwrap();

        let resolved = resolver
            .resolve(Uuid::new_v4(), "http://127.0.0.1:1/cover.jpg")
            .await;
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_empty_url_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let resolver = HttpCoverResolver::new(tmp.path().to_path_buf()).unwrap();
        assert!(resolver.resolve(Uuid::new_v4(), "  ").await.is_none());
    }

    #[tokio::test]
    async fn test_null_resolver() {
        assert!(NullCoverResolver
            .resolve(Uuid::new_v4(), "https://img.example.com/c.jpg")
            .await
            .is_none());
    }
}
