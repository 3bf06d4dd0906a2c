//! LRU 淘汰计划
//!
//! 纯计算，不接触存储。持久层按 last_access 升序提供候选，
//! 这里决定删哪些、删到哪里为止。

use super::CacheKey;

/// 淘汰候选（按 last_access 升序给出）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionCandidate {
    pub key: CacheKey,
    pub size_bytes: u64,
    pub last_access: i64,
}

/// 淘汰计划
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionPlan {
    /// 需要释放的字节数，0 表示无需淘汰
    pub need_bytes: u64,
    /// 按删除顺序排列的候选
    pub victims: Vec<EvictionCandidate>,
    /// 计划释放的字节数
    pub freed_bytes: u64,
}

impl EvictionPlan {
    /// 计算淘汰计划
    ///
    /// `usage_bytes + incoming_bytes <= max_bytes` 时不淘汰；否则按给定顺序
    /// 累加删除，直到 `freed >= need` 或候选耗尽。候选耗尽不是错误。
    pub fn compute<I>(usage_bytes: u64, incoming_bytes: u64, max_bytes: u64, candidates: I) -> Self
    where
        I: IntoIterator<Item = EvictionCandidate>,
    {
        let projected = usage_bytes.saturating_add(incoming_bytes);
        if projected <= max_bytes {
            return Self::default();
        }

        let need_bytes = projected - max_bytes;
        let mut plan = Self {
            need_bytes,
            ..Self::default()
        };

        for candidate in candidates {
            if plan.freed_bytes >= need_bytes {
                break;
            }
            plan.freed_bytes += candidate.size_bytes;
            plan.victims.push(candidate);
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.victims.is_empty()
    }

    /// 候选耗尽仍未满足需求
    pub fn is_exhausted(&self) -> bool {
        self.freed_bytes < self.need_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, size: u64, at: i64) -> EvictionCandidate {
        EvictionCandidate {
            key: CacheKey::from_stored(name),
            size_bytes: size,
            last_access: at,
        }
    }

    fn names(plan: &EvictionPlan) -> Vec<&str> {
        plan.victims.iter().map(|c| c.key.as_str()).collect()
    }

    #[test]
    fn test_no_eviction_within_budget() {
        let plan = EvictionPlan::compute(600, 400, 1000, vec![candidate("a", 600, 1)]);
        assert!(plan.is_empty());
        assert_eq!(plan.need_bytes, 0);
    }

    #[test]
    fn test_evicts_oldest_until_need_met() {
        let candidates = vec![
            candidate("a", 400, 1),
            candidate("b", 400, 2),
            candidate("c", 400, 3),
        ];
        let plan = EvictionPlan::compute(1200, 400, 1000, candidates);
        assert_eq!(plan.need_bytes, 600);
        assert_eq!(names(&plan), vec!["a", "b"]);
        assert_eq!(plan.freed_bytes, 800);
        assert!(!plan.is_exhausted());
    }

    #[test]
    fn test_single_victim_when_enough() {
        let candidates = vec![candidate("a", 400, 1), candidate("b", 400, 2)];
        let plan = EvictionPlan::compute(800, 400, 1000, candidates);
        assert_eq!(names(&plan), vec!["a"]);
    }

    #[test]
    fn test_exhausted_candidates_is_best_effort() {
        let plan = EvictionPlan::compute(300, 5000, 1000, vec![candidate("a", 300, 1)]);
        assert_eq!(names(&plan), vec!["a"]);
        assert!(plan.is_exhausted());
    }
}
