// ==========================================
// 施工进度跟踪系统 - 批次重复键集合
// ==========================================
// 作用域: 单个批次的一次校验
// - BatchKeySet:       顺序校验（含顺序分块）
// - SharedBatchKeySet: 同一批次的分块在多个工作线程间共享,互斥访问
// 红线: 不得跨批次复用,不得在并发导入之间共享
// ==========================================

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// KeyRegistry Trait
// ==========================================
pub trait KeyRegistry {
    /// 登记身份键
    ///
    /// # 返回
    /// - true: 首次出现
    /// - false: 本批次已存在
    fn register(&mut self, key: &str) -> bool;

    /// 是否已登记
    fn contains(&self, key: &str) -> bool;

    /// 已登记数量
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchKeySet {
    keys: HashSet<String>,
}

impl BatchKeySet {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyRegistry for BatchKeySet {
    fn register(&mut self, key: &str) -> bool {
        if self.keys.contains(key) {
            return false;
        }
        self.keys.insert(key.to_string())
    }

    fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    fn len(&self) -> usize {
        self.keys.len()
    }
}

/// 跨工作线程共享的重复键集合（克隆共享同一实例）
#[derive(Debug, Clone, Default)]
pub struct SharedBatchKeySet {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl SharedBatchKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    // 锁中毒时集合内容仍一致（单次 insert 不会半途失败）,直接取回
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyRegistry for SharedBatchKeySet {
    fn register(&mut self, key: &str) -> bool {
        let mut keys = self.lock();
        if keys.contains(key) {
            return false;
        }
        keys.insert(key.to_string())
    }

    fn contains(&self, key: &str) -> bool {
        self.lock().contains(key)
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_batch_key_set_register() {
        let mut set = BatchKeySet::new();
        assert!(set.is_empty());
        assert!(set.register("A-1"));
        assert!(!set.register("A-1"));
        assert!(set.register("A-2"));
        assert_eq!(set.len(), 2);
        assert!(set.contains("A-1"));
    }

    #[test]
    fn test_shared_set_clones_share_state() {
        let mut first = SharedBatchKeySet::new();
        let mut second = first.clone();

        assert!(first.register("K"));
        assert!(!second.register("K"));
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_shared_set_concurrent_single_winner() {
        let set = SharedBatchKeySet::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let mut worker = set.clone();
                thread::spawn(move || worker.register("SAME-KEY"))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|registered| *registered)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(set.len(), 1);
    }
}
