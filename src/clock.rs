//! 播放时钟.
//!
//! 以解码泵启动时刻为零点, 输出缓冲的显示时间戳换算为墙钟截止时间.

use std::time::{Duration, Instant};

/// 播放时钟
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    start_time: Instant,
}

impl PlaybackClock {
    /// 以当前时刻为零点启动时钟
    pub fn start() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// 零点时刻
    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    /// 自零点起经过的时间 (微秒)
    pub fn elapsed_us(&self) -> i64 {
        i64::try_from(self.start_time.elapsed().as_micros()).unwrap_or(i64::MAX)
    }

    /// 显示时间戳对应的墙钟时刻, 负时间戳视为 0
    pub fn deadline_for(&self, pts_us: i64) -> Instant {
        let offset = Duration::from_micros(u64::try_from(pts_us).unwrap_or(0));
        self.start_time + offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_offsets_from_start() {
        let clock = PlaybackClock::start();
        assert_eq!(
            clock.deadline_for(500_000) - clock.start_time(),
            Duration::from_millis(500)
        );
        assert_eq!(clock.deadline_for(-40_000), clock.start_time());
    }

    #[test]
    fn test_elapsed_monotonic() {
        let clock = PlaybackClock::start();
        let a = clock.elapsed_us();
        std::thread::sleep(Duration::from_millis(5));
        assert!(clock.elapsed_us() >= a + 5_000);
    }
}
