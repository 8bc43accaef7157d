//! 按键限流计数服务 - 业务能力层
//!
//! 固定窗口计数器，显式注入、显式作用域：
//! 不依赖任何进程级单例，测试中各自构造互不干扰
//!
//! 过期条目在每次访问时顺带清扫（TTL 清扫），无后台任务

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

/// 按键限流计数器
///
/// 职责：
/// - 记录每个键在滑动窗口内的请求时刻
/// - 超过上限时拒绝
/// - 访问时清扫过期条目
pub struct RateLimiter {
    /// 窗口内每个键允许的最大请求数
    max_requests: usize,
    /// 窗口时长
    window: Duration,
    /// 键 → 窗口内的请求时刻
    entries: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    /// 创建新的限流计数器
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// 尝试为指定键记一次请求
    ///
    /// # 返回
    /// 窗口内还有余量返回 true 并记录本次请求；否则返回 false
    pub fn try_acquire(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();

        // TTL 清扫：先丢掉该键窗口外的时刻
        let timestamps = entries.entry(key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.max_requests {
            debug!("限流命中: key={}, 窗口内已有 {} 次", key, timestamps.len());
            return false;
        }

        timestamps.push(now);
        true
    }

    /// 当前键在窗口内的计数（顺带清扫）
    pub fn current_count(&self, key: &str) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(key) {
            Some(timestamps) => {
                timestamps.retain(|t| now.duration_since(*t) < self.window);
                timestamps.len()
            }
            None => 0,
        }
    }

    /// 全量清扫：丢掉所有键的过期时刻，移除空键
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, timestamps| {
            timestamps.retain(|t| now.duration_since(*t) < self.window);
            !timestamps.is_empty()
        });
    }
}
