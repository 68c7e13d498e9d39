// ==========================================
// 包装单元导入 - 有界查找缓存
// ==========================================
// 职责: 固定容量的 key → value 缓存
// 淘汰: 写入时若已满则整体清空后再写入（非 LRU）
// 不变量: size == map.len()，且 size <= capacity
// 并发: 单写者；调用方通过 &mut 独占访问
// ==========================================

use crate::domain::CacheStats;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// 默认容量（三个引用缓存各自独立使用此容量）
pub const DEFAULT_CACHE_CAPACITY: usize = 500;

#[derive(Debug)]
pub struct LookupCache<K, V> {
    entries: HashMap<K, V>,
    size: usize,
    capacity: usize,
    hits: u64,
    misses: u64,
    clears: u64,
}

impl<K, V> LookupCache<K, V>
where
    K: Eq + Hash,
{
    /// 创建缓存；容量至少为 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity.min(DEFAULT_CACHE_CAPACITY)),
            size: 0,
            capacity,
            hits: 0,
            misses: 0,
            clears: 0,
        }
    }

    /// 查询（记录命中/未命中）
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.entries.get(key) {
            Some(value) => {
                self.hits += 1;
                Some(value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// 写入；已满时先整体清空
    pub fn put(&mut self, key: K, value: V) {
        if self.entries.contains_key(&key) {
            self.entries.insert(key, value);
            return;
        }

        if self.size >= self.capacity {
            tracing::debug!(capacity = self.capacity, "查找缓存已满，整体清空");
            self.clear();
            self.clears += 1;
        }

        self.entries.insert(key, value);
        self.size += 1;
    }

    /// 清空（不计入溢出清空次数）
    pub fn clear(&mut self) {
        self.entries.clear();
        self.size = 0;
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 容量溢出导致的清空次数
    pub fn clears(&self) -> u64 {
        self.clears
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            clears: self.clears,
            size: self.size,
            capacity: self.capacity,
        }
    }
}

impl<K, V> LookupCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// 命中直接返回；未命中调用 loader，成功后写入缓存
    ///
    /// loader 失败时缓存不变
    pub fn get_or_try_insert_with<E, F>(&mut self, key: K, loader: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value.clone());
        }

        let value = loader(&key)?;
        self.put(key, value.clone());
        Ok(value)
    }
}

impl<K, V> Default for LookupCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_put() {
        let mut cache: LookupCache<String, i64> = LookupCache::new(3);
        assert_eq!(cache.get("a"), None);

        cache.put("a".to_string(), 1);
        assert_eq!(cache.get("a"), Some(&1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_overflow_clears_everything_before_insert() {
        let mut cache: LookupCache<u32, u32> = LookupCache::new(2);
        cache.put(1, 10);
        cache.put(2, 20);
        assert_eq!(cache.clears(), 0);

        cache.put(3, 30);

        assert_eq!(cache.clears(), 1);
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains_key(&1));
        assert!(!cache.contains_key(&2));
        assert_eq!(cache.get(&3), Some(&30));
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let capacity = 500;
        let mut cache: LookupCache<usize, usize> = LookupCache::new(capacity);

        for i in 0..(capacity * 3 + 17) {
            cache.put(i, i);
            assert!(cache.len() <= capacity);
            assert_eq!(cache.len(), cache.entries.len());
        }

        assert!(cache.clears() >= 1);
        assert_eq!(cache.clears(), 3);
    }

    #[test]
    fn test_overwrite_existing_key_does_not_grow() {
        let mut cache: LookupCache<&str, bool> = LookupCache::new(1);
        cache.put("a", false);
        cache.put("a", true);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.clears(), 0);
        assert_eq!(cache.get("a"), Some(&true));
    }

    #[test]
    fn test_clear_resets_size() {
        let mut cache: LookupCache<u8, u8> = LookupCache::new(4);
        cache.put(1, 1);
        cache.put(2, 2);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.clears(), 0);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut cache: LookupCache<u8, u8> = LookupCache::new(0);
        cache.put(1, 1);
        cache.put(2, 2);

        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_or_try_insert_with_loads_once() {
        let mut cache: LookupCache<String, i64> = LookupCache::new(8);
        let mut loads = 0;

        for _ in 0..3 {
            let value: Result<i64, String> =
                cache.get_or_try_insert_with("SKU-1".to_string(), |_| {
                    loads += 1;
                    Ok(42)
                });
            assert_eq!(value.unwrap(), 42);
        }

        assert_eq!(loads, 1);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
    }

    #[test]
    fn test_get_or_try_insert_with_error_leaves_cache_unchanged() {
        let mut cache: LookupCache<String, i64> = LookupCache::new(8);
        let result: Result<i64, &str> =
            cache.get_or_try_insert_with("missing".to_string(), |_| Err("not found"));

        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
