use super::errors::StatusError;
use super::upstream::UpstreamFetch;
use blockpulse_config::IconSettings;
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

type Result<T> = std::result::Result<T, StatusError>;

/// Resolves a server's icon to a local cache file, refreshing it from the
/// upstream icon endpoint when the cached copy is older than the TTL.
///
/// Failures degrade instead of erroring: a stale cached file is served when
/// the refresh fails, and the upstream URL itself is handed out when no
/// cached file exists at all.
pub struct IconResolver {
    cache_dir: PathBuf,
    ttl: Duration,
    endpoint: String,
    fetcher: Arc<dyn UpstreamFetch>,
}

impl IconResolver {
    pub fn new(settings: &IconSettings, fetcher: Arc<dyn UpstreamFetch>) -> Self {
        Self {
            cache_dir: PathBuf::from(&settings.cache_dir),
            ttl: Duration::from_secs(settings.ttl_secs),
            endpoint: settings.endpoint.clone(),
            fetcher,
        }
    }

    /// Creates the cache directory. Called once at startup.
    pub async fn init(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        Ok(())
    }

    /// Returns an icon handle for `address`: the cache file path, or the
    /// upstream URL when nothing could be cached.
    pub async fn resolve(&self, address: &str) -> String {
        let path = self.cache_path(address);
        let upstream_url = format!("{}{}", self.endpoint, address);

        if self.is_fresh(&path).await {
            return path.to_string_lossy().into_owned();
        }

        match self.refresh(&path, &upstream_url).await {
            Ok(()) => path.to_string_lossy().into_owned(),
            Err(err) => {
                tracing::warn!("Icon refresh for {} failed: {}", address, err);
                if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                    // Serve the expired copy rather than nothing.
                    path.to_string_lossy().into_owned()
                } else {
                    upstream_url
                }
            }
        }
    }

    fn cache_path(&self, address: &str) -> PathBuf {
        let digest = Sha1::digest(address.as_bytes());
        self.cache_dir.join(format!("{}.png", hex::encode(digest)))
    }

    async fn is_fresh(&self, path: &Path) -> bool {
        let Ok(metadata) = tokio::fs::metadata(path).await else {
            return false;
        };
        let Ok(modified) = metadata.modified() else {
            return false;
        };
        SystemTime::now()
            .duration_since(modified)
            .map(|age| age < self.ttl)
            .unwrap_or(true)
    }

    /// Downloads the icon and swaps it into place atomically, so concurrent
    /// readers never observe a partially written file.
    async fn refresh(&self, path: &Path, url: &str) -> Result<()> {
        let response = self.fetcher.fetch(url).await?;
        if !response.is_success() {
            return Err(StatusError::Transport(format!(
                "HTTP {} from icon endpoint",
                response.status
            )));
        }
        if response.body.is_empty() {
            return Err(StatusError::Transport(
                "empty body from icon endpoint".to_string(),
            ));
        }

        let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
        tokio::fs::write(&tmp, &response.body).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::UpstreamResponse;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CannedFetch {
        reply: std::result::Result<UpstreamResponse, String>,
        calls: AtomicUsize,
    }

    impl CannedFetch {
        fn ok(body: &'static [u8]) -> Self {
            Self {
                reply: Ok(UpstreamResponse {
                    status: 200,
                    body: Bytes::from_static(body),
                }),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl UpstreamFetch for CannedFetch {
        async fn fetch(&self, _url: &str) -> Result<UpstreamResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(message) => Err(StatusError::Transport(message.clone())),
            }
        }
    }

    fn settings(dir: &TempDir, ttl_secs: u64) -> IconSettings {
        IconSettings {
            cache_dir: dir.path().to_string_lossy().into_owned(),
            ttl_secs,
            endpoint: "https://icons.example/".to_string(),
        }
    }

    #[tokio::test]
    async fn downloads_and_caches_icon() {
        let dir = TempDir::new().unwrap();
        let fetch = Arc::new(CannedFetch::ok(b"\x89PNGdata"));
        let resolver = IconResolver::new(&settings(&dir, 86400), fetch.clone());
        resolver.init().await.unwrap();

        let handle = resolver.resolve("play.example.com").await;

        assert!(handle.ends_with(".png"));
        let written = tokio::fs::read(&handle).await.unwrap();
        assert_eq!(written, b"\x89PNGdata");
        assert_eq!(fetch.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fresh_cache_skips_the_network() {
        let dir = TempDir::new().unwrap();
        let fetch = Arc::new(CannedFetch::ok(b"icon"));
        let resolver = IconResolver::new(&settings(&dir, 86400), fetch.clone());
        resolver.init().await.unwrap();

        let first = resolver.resolve("play.example.com").await;
        let second = resolver.resolve("play.example.com").await;

        assert_eq!(first, second);
        assert_eq!(fetch.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_file_is_served_when_refresh_fails() {
        let dir = TempDir::new().unwrap();
        let failing = Arc::new(CannedFetch::failing("connection refused"));
        // TTL 0 makes any existing file stale immediately.
        let resolver = IconResolver::new(&settings(&dir, 0), failing);
        resolver.init().await.unwrap();

        let path = resolver.cache_path("play.example.com");
        tokio::fs::write(&path, b"old-icon").await.unwrap();

        let handle = resolver.resolve("play.example.com").await;

        assert_eq!(handle, path.to_string_lossy());
        let contents = tokio::fs::read(&path).await.unwrap();
        assert_eq!(contents, b"old-icon");
    }

    #[tokio::test]
    async fn missing_cache_falls_back_to_upstream_url() {
        let dir = TempDir::new().unwrap();
        let failing = Arc::new(CannedFetch::failing("connection refused"));
        let resolver = IconResolver::new(&settings(&dir, 86400), failing);
        resolver.init().await.unwrap();

        let handle = resolver.resolve("play.example.com").await;

        assert_eq!(handle, "https://icons.example/play.example.com");
    }

    #[tokio::test]
    async fn distinct_addresses_use_distinct_files() {
        let dir = TempDir::new().unwrap();
        let fetch = Arc::new(CannedFetch::ok(b"icon"));
        let resolver = IconResolver::new(&settings(&dir, 86400), fetch);
        resolver.init().await.unwrap();

        let first = resolver.resolve("a.example.com").await;
        let second = resolver.resolve("b.example.com").await;

        assert_ne!(first, second);
    }
}
