//! Two-tier (memory + disk) cache for speaker avatar bytes, with bounded
//! concurrent prefetch.
//!
//! One `AvatarCache` is constructed per import run and passed by reference
//! into the prefetcher and the card generator — there is no process-global
//! state. Disk entries are keyed by the SHA-256 of the URL so arbitrary URLs
//! map to safe filenames. Every failure in this module is best-effort: disk
//! I/O errors and download failures are logged and swallowed, never
//! propagated.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use sha2::{Digest, Sha256};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);

pub struct AvatarCache {
    dir: PathBuf,
    memory: Mutex<HashMap<String, Vec<u8>>>,
}

impl AvatarCache {
    /// Creates a cache rooted at `dir` (typically `<media-root>/avatars`).
    /// The directory is created lazily on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            memory: Mutex::new(HashMap::new()),
        }
    }

    fn cache_path(&self, url: &str) -> PathBuf {
        let hash = Sha256::digest(url.as_bytes());
        self.dir.join(format!("{hash:x}.img"))
    }

    /// Looks up `url` in memory, then on disk, hydrating the memory tier on
    /// a disk hit. Returns `None` when the URL has never been cached.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<Vec<u8>> {
        if let Ok(memory) = self.memory.lock() {
            if let Some(data) = memory.get(url) {
                return Some(data.clone());
            }
        }

        let path = self.cache_path(url);
        if !path.exists() {
            return None;
        }
        match std::fs::read(&path) {
            Ok(data) => {
                if let Ok(mut memory) = self.memory.lock() {
                    memory.insert(url.to_owned(), data.clone());
                }
                Some(data)
            }
            Err(err) => {
                tracing::warn!(url, error = %err, "failed to read avatar from disk cache");
                None
            }
        }
    }

    /// Writes `data` to both tiers. A disk failure is logged; the memory
    /// tier is populated regardless.
    pub fn save(&self, url: &str, data: Vec<u8>) {
        let path = self.cache_path(url);
        let write = std::fs::create_dir_all(&self.dir).and_then(|()| std::fs::write(&path, &data));
        if let Err(err) = write {
            tracing::warn!(url, error = %err, "avatar disk cache write failed");
        }
        if let Ok(mut memory) = self.memory.lock() {
            memory.insert(url.to_owned(), data);
        }
    }

    /// Cache-or-download: returns cached bytes, or downloads, caches, and
    /// returns them. `None` on download failure.
    pub async fn fetch(&self, client: &reqwest::Client, url: &str) -> Option<Vec<u8>> {
        if let Some(data) = self.get(url) {
            return Some(data);
        }
        let data = download(client, url).await?;
        self.save(url, data.clone());
        Some(data)
    }

    /// Warms the cache for every URL in `urls` that is not already cached,
    /// downloading at most `concurrency` URLs at a time.
    ///
    /// Strictly best-effort: per-URL failures are logged and skipped, and
    /// the batch always runs to completion. Each URL is written by exactly
    /// one task, so concurrent writes never race on the same entry.
    pub async fn prefetch(
        &self,
        client: &reqwest::Client,
        urls: &HashSet<String>,
        concurrency: usize,
    ) {
        let pending: Vec<&String> = urls.iter().filter(|url| self.get(url).is_none()).collect();
        if pending.is_empty() {
            return;
        }
        tracing::debug!(count = pending.len(), "prefetching avatars");

        stream::iter(pending)
            .map(|url| async move {
                if let Some(data) = download(client, url).await {
                    self.save(url, data);
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect::<()>()
            .await;
    }

    /// Root directory of the disk tier.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Downloads `url`, returning `None` on any HTTP or timeout failure.
async fn download(client: &reqwest::Client, url: &str) -> Option<Vec<u8>> {
    let response = client
        .get(url)
        .timeout(DOWNLOAD_TIMEOUT)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status);
    match response {
        Ok(resp) => match resp.bytes().await {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(err) => {
                tracing::warn!(url, error = %err, "avatar body read failed");
                None
            }
        },
        Err(err) => {
            tracing::warn!(url, error = %err, "avatar download failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_cache(name: &str) -> AvatarCache {
        let dir = std::env::temp_dir().join(format!(
            "talksync-avatars-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        AvatarCache::new(dir)
    }

    #[test]
    fn save_then_get_round_trips() {
        let cache = temp_cache("roundtrip");
        assert!(cache.get("https://img.test/a.png").is_none());

        cache.save("https://img.test/a.png", vec![1, 2, 3]);
        assert_eq!(cache.get("https://img.test/a.png"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn disk_hit_hydrates_a_fresh_memory_tier() {
        let cache = temp_cache("hydrate");
        cache.save("https://img.test/a.png", vec![9, 9]);

        // Second cache over the same directory: memory is cold, disk is warm.
        let fresh = AvatarCache::new(cache.dir().to_path_buf());
        assert_eq!(fresh.get("https://img.test/a.png"), Some(vec![9, 9]));
    }

    #[test]
    fn distinct_urls_use_distinct_paths() {
        let cache = temp_cache("paths");
        let a = cache.cache_path("https://img.test/a.png");
        let b = cache.cache_path("https://img.test/b.png");
        assert_ne!(a, b);
    }

    #[test]
    fn unwritable_disk_still_populates_memory() {
        let cache = AvatarCache::new("/proc/talksync-no-such-dir");
        cache.save("https://img.test/a.png", vec![5]);
        assert_eq!(cache.get("https://img.test/a.png"), Some(vec![5]));
    }

    #[tokio::test]
    async fn prefetch_downloads_only_uncached_urls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/new.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 16]))
            .expect(1)
            .mount(&server)
            .await;

        let cache = temp_cache("prefetch");
        let cached_url = format!("{}/cached.png", server.uri());
        let new_url = format!("{}/new.png", server.uri());
        cache.save(&cached_url, vec![1]);

        let urls: HashSet<String> = [cached_url.clone(), new_url.clone()].into();
        let client = reqwest::Client::new();
        cache.prefetch(&client, &urls, 4).await;

        assert_eq!(cache.get(&cached_url), Some(vec![1]));
        assert_eq!(cache.get(&new_url), Some(vec![7u8; 16]));
    }

    #[tokio::test]
    async fn prefetch_skips_failing_urls_without_aborting() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![3u8; 8]))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken.png"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let cache = temp_cache("prefetch-failures");
        let ok_url = format!("{}/ok.png", server.uri());
        let broken_url = format!("{}/broken.png", server.uri());
        let urls: HashSet<String> = [ok_url.clone(), broken_url.clone()].into();

        let client = reqwest::Client::new();
        cache.prefetch(&client, &urls, 2).await;

        assert_eq!(cache.get(&ok_url), Some(vec![3u8; 8]));
        assert!(cache.get(&broken_url).is_none());
    }

    #[tokio::test]
    async fn fetch_downloads_on_miss_and_caches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![4u8; 4]))
            .expect(1)
            .mount(&server)
            .await;

        let cache = temp_cache("fetch");
        let url = format!("{}/a.png", server.uri());
        let client = reqwest::Client::new();

        assert_eq!(cache.fetch(&client, &url).await, Some(vec![4u8; 4]));
        // Served from cache now — the mock allows exactly one hit.
        assert_eq!(cache.fetch(&client, &url).await, Some(vec![4u8; 4]));
    }
}
