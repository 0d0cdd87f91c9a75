//! Decoded-image cache.
//!
//! Layer sources are data URIs, so decoding one is pure CPU work that repeats
//! on every export. The cache keeps the premultiplied pixmaps around with
//! LRU eviction bounded by bytes, entry count, and age.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tiny_skia::Pixmap;

use crate::error::{RenderError, RenderResult};
use crate::image::ImageData;

/// Entry in the image cache.
#[derive(Debug)]
struct CacheEntry {
    /// Decoded, premultiplied pixels.
    pixmap: Pixmap,
    /// Last access time.
    last_accessed: Instant,
    /// Size in bytes.
    size_bytes: usize,
}

/// Configuration for the image cache.
#[derive(Debug, Clone)]
pub struct ImageCacheConfig {
    /// Maximum cache size in bytes.
    pub max_size_bytes: usize,
    /// Maximum age before eviction (if not accessed).
    pub max_age: Duration,
    /// Maximum number of entries.
    pub max_entries: usize,
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 128 * 1024 * 1024, // 128 MB
            max_age: Duration::from_secs(300), // 5 minutes
            max_entries: 256,
        }
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of evictions.
    pub evictions: u64,
    /// Total bytes decoded into the cache.
    pub bytes_loaded: u64,
}

/// LRU cache of decoded layer and background images.
pub struct ImageCache {
    /// Cached pixmaps by source URI.
    entries: HashMap<String, CacheEntry>,
    /// Cache configuration.
    config: ImageCacheConfig,
    /// Current total size in bytes.
    current_size: usize,
    /// Cache statistics.
    stats: CacheStats,
}

impl ImageCache {
    /// Create a new cache with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ImageCacheConfig::default())
    }

    /// Create a new cache with custom configuration.
    #[must_use]
    pub fn with_config(config: ImageCacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            current_size: 0,
            stats: CacheStats::default(),
        }
    }

    /// Get a pixmap from the cache.
    ///
    /// Returns `None` if the source is not cached.
    pub fn get(&mut self, key: &str) -> Option<&Pixmap> {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_accessed = Instant::now();
            self.stats.hits += 1;
            Some(&entry.pixmap)
        } else {
            self.stats.misses += 1;
            None
        }
    }

    /// Insert a pixmap into the cache.
    ///
    /// May trigger eviction if cache limits are exceeded.
    pub fn insert(&mut self, key: String, pixmap: Pixmap) {
        let size_bytes = pixmap.data().len();

        // Replace any previous entry for this key
        if let Some(old) = self.entries.remove(&key) {
            self.current_size -= old.size_bytes;
        }

        self.evict_if_needed(size_bytes);

        self.current_size += size_bytes;
        self.stats.bytes_loaded += size_bytes as u64;

        self.entries.insert(
            key,
            CacheEntry {
                pixmap,
                last_accessed: Instant::now(),
                size_bytes,
            },
        );
    }

    /// Look up a source URI, decoding and caching it on a miss.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI cannot be decoded into a pixmap.
    pub fn get_or_decode(&mut self, uri: &str) -> RenderResult<&Pixmap> {
        if self.entries.contains_key(uri) {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            let pixmap = ImageData::load_from_data_uri(uri)?.to_pixmap()?;
            self.insert(uri.to_string(), pixmap);
        }

        let entry = self
            .entries
            .get_mut(uri)
            .ok_or_else(|| RenderError::Resource("cache entry missing after insert".to_string()))?;
        entry.last_accessed = Instant::now();
        Ok(&entry.pixmap)
    }

    /// Remove a source from the cache.
    pub fn remove(&mut self, key: &str) -> Option<Pixmap> {
        if let Some(entry) = self.entries.remove(key) {
            self.current_size -= entry.size_bytes;
            Some(entry.pixmap)
        } else {
            None
        }
    }

    /// Check if a source is cached.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Clear all cached pixmaps.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_size = 0;
    }

    /// Get the current number of cached pixmaps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the current cache size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.current_size
    }

    /// Get cache statistics.
    #[must_use]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Evict old entries if needed to make room for a new entry.
    fn evict_if_needed(&mut self, needed_bytes: usize) {
        while self.current_size + needed_bytes > self.config.max_size_bytes
            && !self.entries.is_empty()
        {
            self.evict_lru();
        }

        while self.entries.len() >= self.config.max_entries && !self.entries.is_empty() {
            self.evict_lru();
        }

        self.evict_expired();
    }

    /// Evict the least recently used entry.
    fn evict_lru(&mut self) {
        let oldest_key = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest_key {
            if let Some(entry) = self.entries.remove(&key) {
                self.current_size -= entry.size_bytes;
                self.stats.evictions += 1;
            }
        }
    }

    /// Evict entries that have not been accessed recently.
    fn evict_expired(&mut self) {
        let now = Instant::now();
        let max_age = self.config.max_age;

        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_accessed) > max_age)
            .map(|(key, _)| key.clone())
            .collect();

        for key in expired_keys {
            if let Some(entry) = self.entries.remove(&key) {
                self.current_size -= entry.size_bytes;
                self.stats.evictions += 1;
            }
        }
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}
