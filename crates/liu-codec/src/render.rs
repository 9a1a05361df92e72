//! 渲染目标.
//!
//! 解码器在 `release(index, render = true)` 时把帧写入渲染目标.
//! 解码泵本身从不直接访问渲染目标.

use std::sync::{Arc, Mutex, PoisonError};

/// 已渲染帧的描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedFrame {
    /// 帧序号 (从 0 开始)
    pub frame_number: u64,
    /// 显示时间戳 (微秒)
    pub pts_us: i64,
    /// 压缩数据大小 (字节)
    pub size: usize,
    /// 是否为关键帧
    pub key_frame: bool,
}

/// 渲染目标 trait
pub trait RenderTarget: Send {
    /// 写入一帧
    fn render(&mut self, frame: RenderedFrame);
}

/// 仅记录日志的渲染目标
#[derive(Debug, Default)]
pub struct LogRenderTarget {
    frames: u64,
}

impl LogRenderTarget {
    /// 创建渲染目标
    pub fn new() -> Self {
        Self::default()
    }

    /// 已渲染帧数
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderTarget for LogRenderTarget {
    fn render(&mut self, frame: RenderedFrame) {
        self.frames += 1;
        log::debug!(
            "渲染帧 #{}: pts={:.3}s, size={}, key={}",
            frame.frame_number,
            frame.pts_us as f64 / 1_000_000.0,
            frame.size,
            frame.key_frame
        );
    }
}

/// 收集帧记录的渲染目标
///
/// 克隆体共享同一记录表, 可在解码器被移入工作线程后继续查询.
#[derive(Debug, Clone, Default)]
pub struct CollectingRenderTarget {
    frames: Arc<Mutex<Vec<RenderedFrame>>>,
}

impl CollectingRenderTarget {
    /// 创建渲染目标
    pub fn new() -> Self {
        Self::default()
    }

    /// 已渲染帧的快照
    pub fn frames(&self) -> Vec<RenderedFrame> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RenderTarget for CollectingRenderTarget {
    fn render(&mut self, frame: RenderedFrame) {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(n: u64) -> RenderedFrame {
        RenderedFrame {
            frame_number: n,
            pts_us: n as i64 * 40_000,
            size: 10,
            key_frame: n == 0,
        }
    }

    #[test]
    fn test_collecting_target_shared_between_clones() {
        let target = CollectingRenderTarget::new();
        let mut writer = target.clone();
        writer.render(frame(0));
        writer.render(frame(1));

        let frames = target.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].pts_us, 40_000);
        assert!(frames[0].key_frame);
    }

    #[test]
    fn test_log_target_counts() {
        let mut target = LogRenderTarget::new();
        target.render(frame(0));
        assert_eq!(target.frames(), 1);
    }
}
