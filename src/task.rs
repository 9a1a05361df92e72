//! 播放任务.
//!
//! 每个播放任务在独立命名线程上运行一个解码泵. 任务被丢弃时
//! (例如渲染表面销毁) 自动取消并等待线程退出.

use std::thread::{self, JoinHandle};

use log::{debug, warn};

use liu_codec::{Decoder, DecoderConfig};
use liu_core::{LiuError, LiuResult};
use liu_format::AccessUnitSource;

use crate::cancel::CancelToken;
use crate::pump::{DecodePump, PumpReport};

/// 后台播放任务
pub struct PlayerTask {
    name: String,
    cancel: CancelToken,
    handle: Option<JoinHandle<LiuResult<PumpReport>>>,
}

impl PlayerTask {
    /// 在名为 `name` 的新线程上运行解码泵
    pub fn spawn<S, D>(
        name: &str,
        mut pump: DecodePump<S, D>,
        config: DecoderConfig,
    ) -> LiuResult<Self>
    where
        S: AccessUnitSource + 'static,
        D: Decoder + 'static,
    {
        let cancel = pump.cancel_token();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || pump.run(&config))?;
        debug!("播放任务 {} 已启动", name);
        Ok(Self {
            name: name.to_string(),
            cancel,
            handle: Some(handle),
        })
    }

    /// 任务名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 请求取消, 不等待
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 取消令牌 (克隆体)
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// 线程是否已退出
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// 等待线程退出并取得运行结果
    pub fn join(mut self) -> LiuResult<PumpReport> {
        let Some(handle) = self.handle.take() else {
            return Err(LiuError::Internal(format!("播放任务 {} 已被回收", self.name)));
        };
        handle
            .join()
            .map_err(|_| LiuError::Internal(format!("播放任务 {} 异常退出", self.name)))?
    }
}

impl Drop for PlayerTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.cancel.cancel();
            match handle.join() {
                Ok(Ok(report)) => debug!("播放任务 {} 已结束: {:?}", self.name, report.outcome),
                Ok(Err(e)) => warn!("播放任务 {} 出错: {}", self.name, e),
                Err(_) => warn!("播放任务 {} 异常退出", self.name),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pump::{PumpConfig, PumpOutcome};
    use liu_codec::decoders::LoopbackDecoder;
    use liu_codec::render::CollectingRenderTarget;
    use liu_codec::{AccessUnit, CodecConfig, CodecId};
    use liu_format::PacketQueueSource;
    use std::time::{Duration, Instant};

    fn decoder_config() -> DecoderConfig {
        let csd = CodecConfig::from_hex("00 00 00 01 67 64 00 15", "00 00 00 01 68 EB E3 CB")
            .unwrap();
        DecoderConfig::new(CodecId::H264, 320, 560, csd)
    }

    /// 每秒一帧的样本队列, 带显式时间戳
    fn slow_source(frames: i64) -> PacketQueueSource {
        (0..frames)
            .map(|i| {
                AccessUnit::from_data(vec![0x00, 0x00, 0x00, 0x01, 0x41, 0x9A])
                    .with_pts_us(i * 1_000_000)
            })
            .collect()
    }

    #[test]
    fn test_spawn_and_join() {
        let target = CollectingRenderTarget::new();
        let pump = DecodePump::new(
            slow_source(3),
            LoopbackDecoder::new(target.clone()),
            PumpConfig::container().with_pacing(false),
        );
        let task = PlayerTask::spawn("liu-test-join", pump, decoder_config()).unwrap();
        assert_eq!(task.name(), "liu-test-join");

        let report = task.join().unwrap();
        assert_eq!(report.outcome, PumpOutcome::Completed);
        assert_eq!(target.frames().len(), 3);
    }

    #[test]
    fn test_cancel_stops_paced_playback() {
        let target = CollectingRenderTarget::new();
        let decoder = LoopbackDecoder::new(target.clone())
            .with_timestamp_mode(liu_codec::decoders::TimestampMode::PassThrough);
        let pump = DecodePump::new(slow_source(30), decoder, PumpConfig::container());
        let task = PlayerTask::spawn("liu-test-cancel", pump, decoder_config()).unwrap();

        std::thread::sleep(Duration::from_millis(100));
        let start = Instant::now();
        task.cancel();
        let report = task.join().unwrap();

        assert_eq!(report.outcome, PumpOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(1), "取消应立即生效");
        assert!(target.frames().len() < 30);
    }

    #[test]
    fn test_drop_cancels_task() {
        let pump = DecodePump::new(
            slow_source(30),
            LoopbackDecoder::new(CollectingRenderTarget::new())
                .with_timestamp_mode(liu_codec::decoders::TimestampMode::PassThrough),
            PumpConfig::container(),
        );
        let task = PlayerTask::spawn("liu-test-drop", pump, decoder_config()).unwrap();
        let token = task.cancel_token();

        let start = Instant::now();
        drop(task);
        assert!(token.is_cancelled());
        assert!(start.elapsed() < Duration::from_secs(1), "丢弃任务应立即取消并回收线程");
    }
}
