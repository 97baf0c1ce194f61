//! Result Cache Port - 定位结果缓存
//!
//! 定义定位结果缓存的抽象接口，具体实现在 infrastructure/memory 层

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DocumentKey, SearchResult};

/// 缓存 key
///
/// 使用 document_key + page_index + md5(片段文本)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub document_key: DocumentKey,
    pub page_index: usize,
    pub content_hash: String,
}

impl CacheKey {
    pub fn new(document_key: DocumentKey, page_index: usize, segment_text: &str) -> Self {
        Self {
            document_key,
            page_index,
            content_hash: content_hash(segment_text),
        }
    }
}

/// 计算片段文本的内容哈希
fn content_hash(segment_text: &str) -> String {
    format!("{:x}", md5::compute(segment_text.as_bytes()))
}

/// 缓存条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub result: SearchResult,
    pub created_at: DateTime<Utc>,
    pub page_index: usize,
}

impl CacheEntry {
    pub fn new(result: SearchResult) -> Self {
        Self::with_timestamp(result, Utc::now())
    }

    pub fn with_timestamp(result: SearchResult, created_at: DateTime<Utc>) -> Self {
        let page_index = result.page_index;
        Self {
            result,
            created_at,
            page_index,
        }
    }

    /// 是否已超过最大存活时间
    pub fn is_expired(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        now - self.created_at > max_age
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub expired_count: u64,
    pub evicted_count: u64,
}

/// Result Cache Port
///
/// - 有最大存活时间，读取过期条目视为未命中
/// - 有条目数上限，插入时淘汰
/// - 活动文档切换时整体失效
pub trait ResultCachePort: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry>;

    fn put(&self, key: CacheKey, entry: CacheEntry);

    /// 清空全部条目
    fn invalidate_all(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stats(&self) -> CacheStats;
}
