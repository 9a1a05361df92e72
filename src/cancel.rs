//! 取消令牌.
//!
//! 解码泵在每个循环周期检查一次取消标志, 按时间戳等待时通过条件变量
//! 立即被唤醒.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// 可跨线程共享的取消令牌
///
/// 克隆体共享同一标志.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    shared: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    /// 创建未取消的令牌
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消, 唤醒所有等待者
    pub fn cancel(&self) {
        let (_, cvar) = &*self.shared;
        *self.flag() = true;
        cvar.notify_all();
    }

    /// 是否已请求取消
    pub fn is_cancelled(&self) -> bool {
        *self.flag()
    }

    /// 等待到 `deadline` 或被取消
    ///
    /// 返回 true 表示等待期间 (或之前) 已被取消.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let (_, cvar) = &*self.shared;
        let mut cancelled = self.flag();
        loop {
            if *cancelled {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            cancelled = cvar
                .wait_timeout(cancelled, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn flag(&self) -> MutexGuard<'_, bool> {
        self.shared.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_wait_until_deadline() {
        let token = CancelToken::new();
        let start = Instant::now();
        assert!(!token.wait_until(start + Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_cancel_wakes_waiter() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = thread::spawn(move || {
            let start = Instant::now();
            let cancelled = waiter.wait_until(start + Duration::from_secs(10));
            (cancelled, start.elapsed())
        });

        thread::sleep(Duration::from_millis(20));
        token.cancel();
        let (cancelled, waited) = handle.join().unwrap();
        assert!(cancelled);
        assert!(waited < Duration::from_secs(5), "取消后应立即唤醒, waited={waited:?}");
    }

    #[test]
    fn test_already_cancelled_returns_immediately() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.is_cancelled());
        assert!(token.wait_until(Instant::now() + Duration::from_secs(10)));
    }
}
