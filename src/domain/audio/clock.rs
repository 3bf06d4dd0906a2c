//! 访问时钟
//!
//! 毫秒级 wall-clock，但保证严格递增：同一毫秒内的两次访问也能分出先后，
//! LRU 索引因此不会出现并列。

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug, Default)]
pub struct AccessClock {
    last: AtomicI64,
}

impl AccessClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从已知的最大时间戳继续（重启后保持单调）
    pub fn starting_after(last: i64) -> Self {
        Self {
            last: AtomicI64::new(last),
        }
    }

    /// 下一个时间戳，`max(now_ms, last + 1)`
    pub fn tick(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(current + 1);
            match self
                .last
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn last(&self) -> i64 {
        self.last.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_is_strictly_increasing() {
        let clock = AccessClock::new();
        let mut previous = clock.tick();
        for _ in 0..1000 {
            let next = clock.tick();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn test_starting_after_future_value() {
        let far_future = Utc::now().timestamp_millis() + 1_000_000;
        let clock = AccessClock::starting_after(far_future);
        assert_eq!(clock.tick(), far_future + 1);
        assert_eq!(clock.last(), far_future + 1);
    }
}
