//! In-Memory Result Cache Implementation
//!
//! 时间 + 容量双重约束的定位结果缓存

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::application::ports::{CacheEntry, CacheKey, CacheStats, ResultCachePort};

/// 缓存配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 条目数上限，插入达到此值时触发清理
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// 清理后保留的条目数
    #[serde(default = "default_cleanup_threshold")]
    pub cleanup_threshold: usize,
    /// 最大存活时间（毫秒）
    #[serde(default = "default_max_age_ms")]
    pub max_age_ms: u64,
}

fn default_max_entries() -> usize {
    100
}

fn default_cleanup_threshold() -> usize {
    80
}

fn default_max_age_ms() -> u64 {
    300_000 // 5 分钟
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            cleanup_threshold: default_cleanup_threshold(),
            max_age_ms: default_max_age_ms(),
        }
    }
}

impl CacheConfig {
    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.max_age_ms as i64)
    }
}

/// 内存定位结果缓存
pub struct InMemoryResultCache {
    entries: DashMap<CacheKey, CacheEntry>,
    config: CacheConfig,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    expired_count: AtomicU64,
    evicted_count: AtomicU64,
}

impl InMemoryResultCache {
    pub fn new(config: CacheConfig) -> Self {
        tracing::debug!(
            max_entries = config.max_entries,
            cleanup_threshold = config.cleanup_threshold,
            max_age_ms = config.max_age_ms,
            "InMemoryResultCache initialized"
        );
        Self {
            entries: DashMap::new(),
            config,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
            evicted_count: AtomicU64::new(0),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 清理：先移除过期条目，仍超过阈值时按创建时间淘汰最旧条目
    fn cleanup(&self, now: DateTime<Utc>) {
        let max_age = self.config.max_age();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now, max_age));
        let expired = before.saturating_sub(self.entries.len());
        self.expired_count.fetch_add(expired as u64, Ordering::Relaxed);

        let len = self.entries.len();
        if len <= self.config.cleanup_threshold {
            tracing::debug!(expired = expired, remaining = len, "Result cache cleaned");
            return;
        }

        let mut by_age: Vec<(CacheKey, DateTime<Utc>)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.created_at))
            .collect();
        by_age.sort_by_key(|(_, created_at)| *created_at);

        let excess = len - self.config.cleanup_threshold;
        for (key, _) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
        self.evicted_count.fetch_add(excess as u64, Ordering::Relaxed);

        tracing::debug!(
            expired = expired,
            evicted = excess,
            remaining = self.entries.len(),
            "Result cache cleaned"
        );
    }
}

impl Default for InMemoryResultCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ResultCachePort for InMemoryResultCache {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let now = Utc::now();
        let max_age = self.config.max_age();

        let entry = self.entries.get(key).map(|entry| entry.value().clone());
        match entry {
            Some(entry) if entry.is_expired(now, max_age) => {
                self.entries
                    .remove_if(key, |_, stored| stored.is_expired(now, max_age));
                self.expired_count.fetch_add(1, Ordering::Relaxed);
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(page_index = key.page_index, "Result cache entry expired");
                None
            }
            Some(entry) => {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            }
            None => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn put(&self, key: CacheKey, entry: CacheEntry) {
        if self.entries.len() >= self.config.max_entries && !self.entries.contains_key(&key) {
            self.cleanup(Utc::now());
        }
        self.entries.insert(key, entry);
    }

    fn invalidate_all(&self) {
        let count = self.entries.len();
        self.entries.clear();
        tracing::debug!(count = count, "Result cache invalidated");
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.entries.len(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            expired_count: self.expired_count.load(Ordering::Relaxed),
            evicted_count: self.evicted_count.load(Ordering::Relaxed),
        }
    }
}
