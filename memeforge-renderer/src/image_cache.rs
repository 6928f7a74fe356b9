//! Asynchronous bitmap cache keyed by image content.
//!
//! [`ImageCache::ensure`] starts loading and decoding a key in the
//! background the first time it is seen. Finished decodes come back over a
//! channel and are published by [`ImageCache::drain`], which the owning
//! thread calls before painting. Lookups are synchronous and never block.
//!
//! A key that fails to load stays absent for the rest of the session.
//! Keys marked live with [`ImageCache::set_live`] are never evicted, and an
//! evicted key loads again the next time it is ensured.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use memeforge_core::ImageSizes;
use tokio::sync::mpsc;

use crate::error::{RenderError, RenderResult};
use crate::image::{parse_data_url, Bitmap};
use crate::paint::BitmapLookup;

/// Resolves a content key into encoded image bytes.
#[async_trait]
pub trait SourceLoader: Send + Sync {
    /// Fetch the bytes named by `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    async fn load(&self, key: &str) -> RenderResult<Vec<u8>>;
}

/// Loads `data:` URLs, `http(s)://` URLs and local file paths.
#[derive(Debug, Clone, Default)]
pub struct DefaultLoader {
    client: reqwest::Client,
}

impl DefaultLoader {
    /// Create a loader with a fresh HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn fetch(&self, url: &str) -> RenderResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RenderError::Resource(format!("{url}: {e}")))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RenderError::Resource(format!("{url}: {e}")))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SourceLoader for DefaultLoader {
    async fn load(&self, key: &str) -> RenderResult<Vec<u8>> {
        if key.starts_with("data:") {
            return parse_data_url(key).map(|(_, bytes)| bytes);
        }
        if key.starts_with("http://") || key.starts_with("https://") {
            return self.fetch(key).await;
        }
        let path = key.strip_prefix("file://").unwrap_or(key);
        tokio::fs::read(Path::new(path))
            .await
            .map_err(|e| RenderError::Resource(format!("{path}: {e}")))
    }
}

/// Configuration for the image cache.
#[derive(Debug, Clone, Default)]
pub struct ImageCacheConfig {
    /// Maximum number of decoded bitmaps to keep. Live keys count toward the
    /// cap but are never evicted, so the cache can exceed it. `None` keeps
    /// everything.
    pub max_entries: Option<usize>,
}

/// Load state of one content key.
#[derive(Debug, Clone)]
pub enum EntryState {
    /// Loading or decoding in the background.
    Pending,
    /// Decoded and ready to paint.
    Ready(Bitmap),
    /// Failed to load or decode; never retried.
    Failed,
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Decodes started.
    pub requested: u64,
    /// Bitmaps published.
    pub decoded: u64,
    /// Loads or decodes that failed.
    pub failed: u64,
    /// Bitmaps dropped to honour `max_entries`.
    pub evictions: u64,
}

type Decoded = (String, RenderResult<Bitmap>);

/// Content-keyed bitmap cache with background decoding.
pub struct ImageCache {
    entries: HashMap<String, EntryState>,
    /// Ready keys, least recently ensured first.
    recency: VecDeque<String>,
    /// Keys some layer still paints.
    live: HashSet<String>,
    loader: Arc<dyn SourceLoader>,
    config: ImageCacheConfig,
    tx: mpsc::UnboundedSender<Decoded>,
    rx: mpsc::UnboundedReceiver<Decoded>,
    in_flight: usize,
    stats: CacheStats,
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("entries", &self.entries.len())
            .field("in_flight", &self.in_flight)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCache {
    /// Create an unbounded cache using [`DefaultLoader`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_loader(Arc::new(DefaultLoader::new()), ImageCacheConfig::default())
    }

    /// Create a cache with a custom loader and configuration.
    #[must_use]
    pub fn with_loader(loader: Arc<dyn SourceLoader>, config: ImageCacheConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            entries: HashMap::new(),
            recency: VecDeque::new(),
            live: HashSet::new(),
            loader,
            config,
            tx,
            rx,
            in_flight: 0,
            stats: CacheStats::default(),
        }
    }

    /// Start loading `key` unless it has been seen before.
    ///
    /// Returns `true` if a load was started. Must be called from within a
    /// tokio runtime; outside one the key is marked failed.
    pub fn ensure(&mut self, key: &str) -> bool {
        if self.entries.contains_key(key) {
            self.touch(key);
            return false;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime, cannot load image {}", short_key(key));
            self.entries.insert(key.to_string(), EntryState::Failed);
            self.stats.failed += 1;
            return false;
        };

        self.entries.insert(key.to_string(), EntryState::Pending);
        self.in_flight += 1;
        self.stats.requested += 1;
        tracing::debug!("Loading image {}", short_key(key));

        let loader = Arc::clone(&self.loader);
        let tx = self.tx.clone();
        let key = key.to_string();
        runtime.spawn(async move {
            let result = match loader.load(&key).await {
                Ok(bytes) => tokio::task::spawn_blocking(move || Bitmap::decode(&bytes))
                    .await
                    .unwrap_or_else(|e| Err(RenderError::Decode(format!("decode task failed: {e}")))),
                Err(e) => Err(e),
            };
            // The cache may have been dropped; nothing to do then.
            let _ = tx.send((key, result));
        });
        true
    }

    /// Replace the set of keys layers still paint and make sure each one is
    /// loaded. Returns how many loads were started.
    pub fn set_live<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) -> usize {
        self.live = keys.into_iter().map(str::to_string).collect();
        let live: Vec<String> = self.live.iter().cloned().collect();
        let started = live.iter().filter(|key| self.ensure(key)).count();
        self.evict_if_needed();
        started
    }

    /// Publish every decode that has finished. Returns how many entries
    /// changed state.
    pub fn drain(&mut self) -> usize {
        let mut changed = 0;
        while let Ok(decoded) = self.rx.try_recv() {
            self.publish(decoded);
            changed += 1;
        }
        changed
    }

    /// Wait for every in-flight load to finish and publish the results.
    /// Returns how many entries changed state.
    pub async fn settle(&mut self) -> usize {
        let mut changed = self.drain();
        while self.in_flight > 0 {
            match self.rx.recv().await {
                Some(decoded) => {
                    self.publish(decoded);
                    changed += 1;
                }
                None => break,
            }
        }
        changed
    }

    fn publish(&mut self, (key, result): Decoded) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match result {
            Ok(bitmap) => {
                tracing::debug!(
                    "Decoded image {} ({}x{})",
                    short_key(&key),
                    bitmap.width(),
                    bitmap.height()
                );
                self.stats.decoded += 1;
                self.recency.push_back(key.clone());
                self.entries.insert(key, EntryState::Ready(bitmap));
                self.evict_if_needed();
            }
            Err(e) => {
                tracing::warn!("Image {} unavailable: {e}", short_key(&key));
                self.stats.failed += 1;
                self.entries.insert(key, EntryState::Failed);
            }
        }
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            if let Some(k) = self.recency.remove(pos) {
                self.recency.push_back(k);
            }
        }
    }

    fn evict_if_needed(&mut self) {
        let Some(max) = self.config.max_entries else {
            return;
        };
        let mut excess = self.recency.len().saturating_sub(max);
        let mut i = 0;
        while excess > 0 && i < self.recency.len() {
            if self.live.contains(&self.recency[i]) {
                i += 1;
                continue;
            }
            if let Some(oldest) = self.recency.remove(i) {
                tracing::debug!("Evicting image {}", short_key(&oldest));
                self.entries.remove(&oldest);
                self.stats.evictions += 1;
                excess -= 1;
            }
        }
    }

    /// Load state of `key`, if it has been requested.
    #[must_use]
    pub fn state(&self, key: &str) -> Option<&EntryState> {
        self.entries.get(key)
    }

    /// Number of loads still in flight.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.in_flight
    }

    /// Number of known keys in any state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key has been requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cache statistics.
    #[must_use]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl BitmapLookup for ImageCache {
    fn lookup(&self, key: &str) -> Option<&Bitmap> {
        match self.entries.get(key) {
            Some(EntryState::Ready(bitmap)) => Some(bitmap),
            _ => None,
        }
    }
}

impl ImageSizes for ImageCache {
    fn natural_size(&self, key: &str) -> Option<(f32, f32)> {
        self.lookup(key).map(Bitmap::natural_size)
    }
}

/// Content keys can be whole data URLs; keep log lines short.
fn short_key(key: &str) -> &str {
    const MAX: usize = 48;
    match key.char_indices().nth(MAX) {
        Some((idx, _)) => &key[..idx],
        None => key,
    }
}
