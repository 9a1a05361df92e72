//! 解码泵.
//!
//! 在单个工作线程上交替执行输入与输出两条轨道:
//!
//! - 输入轨道 (直到输入结束): 借出输入槽, 从数据源取下一个访问单元并填充提交.
//!   数据源耗尽时提交一个带 `END_OF_STREAM` 的空缓冲, 之后只取输出.
//! - 输出轨道 (每个周期): 取一个输出, 就绪帧等到播放时钟到达其时间戳后
//!   释放并渲染. 取到带 `END_OF_STREAM` 的输出即结束.
//!
//! 无论正常结束、被取消还是出错, 解码器都恰好执行一次 `stop` 与 `close`.

use std::time::Duration;

use log::{debug, info, warn};

use liu_codec::nal;
use liu_codec::{BufferFlags, Decoder, DecoderConfig, OutputBuffer, OutputStatus};
use liu_core::LiuResult;
use liu_format::AccessUnitSource;

use crate::cancel::CancelToken;
use crate::clock::PlaybackClock;

/// 配置单元 (SPS/PPS) 的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigUnitPolicy {
    /// 以 `CODEC_CONFIG` 标志提交
    #[default]
    Submit,
    /// 只识别不提交, 输入槽原样归还
    InspectOnly,
}

/// 解码泵参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpConfig {
    /// 借出输入槽的等待上限
    pub input_timeout: Duration,
    /// 取输出的等待上限
    pub output_timeout: Duration,
    /// 配置单元处理方式
    pub config_units: ConfigUnitPolicy,
    /// 是否按时间戳控制输出节奏
    pub pacing: bool,
}

impl PumpConfig {
    /// 裸流预设: 输入 10ms, 输出 100ms
    pub fn elementary_stream() -> Self {
        Self {
            input_timeout: Duration::from_millis(10),
            output_timeout: Duration::from_millis(100),
            config_units: ConfigUnitPolicy::Submit,
            pacing: true,
        }
    }

    /// 容器样本预设: 输入 10ms, 输出 10ms
    pub fn container() -> Self {
        Self {
            output_timeout: Duration::from_millis(10),
            ..Self::elementary_stream()
        }
    }

    /// 设置配置单元处理方式
    pub fn with_config_units(mut self, policy: ConfigUnitPolicy) -> Self {
        self.config_units = policy;
        self
    }

    /// 开启或关闭节奏控制
    pub fn with_pacing(mut self, pacing: bool) -> Self {
        self.pacing = pacing;
        self
    }
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self::elementary_stream()
    }
}

/// 解码泵结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// 取到流结束输出
    Completed,
    /// 被取消
    Cancelled,
}

/// 解码泵运行统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// 提交的负载单元数
    pub units_submitted: u64,
    /// 识别到的配置单元数
    pub config_units: u64,
    /// 提交的字节数 (含配置单元)
    pub bytes_submitted: u64,
    /// 已渲染帧数
    pub frames_rendered: u64,
    /// 因取消而未渲染的帧数
    pub frames_dropped: u64,
    /// 输出格式变化次数
    pub format_changes: u64,
    /// 运行时长
    pub elapsed: Duration,
}

/// 解码泵运行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpReport {
    /// 结束方式
    pub outcome: PumpOutcome,
    /// 统计
    pub stats: PumpStats,
}

/// 解码泵
pub struct DecodePump<S, D> {
    source: S,
    decoder: D,
    config: PumpConfig,
    cancel: CancelToken,
}

impl<S: AccessUnitSource, D: Decoder> DecodePump<S, D> {
    /// 创建解码泵
    pub fn new(source: S, decoder: D, config: PumpConfig) -> Self {
        Self {
            source,
            decoder,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// 使用外部取消令牌
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// 取消令牌 (克隆体)
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// 解码器
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// 拆分为数据源与解码器
    pub fn into_parts(self) -> (S, D) {
        (self.source, self.decoder)
    }

    /// 配置并启动解码器, 运行到流结束或被取消
    pub fn run(&mut self, decoder_config: &DecoderConfig) -> LiuResult<PumpReport> {
        let Self {
            source,
            decoder,
            config,
            cancel,
        } = self;

        info!(
            "解码泵启动: 源={}, 解码器={}, {} {}x{}",
            source.name(),
            decoder.name(),
            decoder_config.codec.mime_type(),
            decoder_config.width,
            decoder_config.height
        );

        let mut session = Session {
            decoder,
            started: false,
        };
        session.decoder.configure(decoder_config)?;
        session.decoder.start()?;
        session.started = true;

        let mut track = Tracks {
            source,
            config: *config,
            cancel,
            clock: PlaybackClock::start(),
            end_of_input: false,
            stats: PumpStats::default(),
        };
        let outcome = track.drive(&mut *session.decoder)?;

        track.stats.elapsed = track.clock.start_time().elapsed();
        info!(
            "解码泵结束: {:?}, 提交 {} 个单元 ({} 字节), 渲染 {} 帧, 耗时 {:.3}s",
            outcome,
            track.stats.units_submitted,
            track.stats.bytes_submitted,
            track.stats.frames_rendered,
            track.stats.elapsed.as_secs_f64()
        );
        Ok(PumpReport {
            outcome,
            stats: track.stats,
        })
    }
}

/// 解码器会话, 离开作用域时停止并关闭解码器
struct Session<'a, D: Decoder> {
    decoder: &'a mut D,
    started: bool,
}

impl<D: Decoder> Drop for Session<'_, D> {
    fn drop(&mut self) {
        if self.started {
            if let Err(e) = self.decoder.stop() {
                warn!("停止解码器 {} 失败: {}", self.decoder.name(), e);
            }
        }
        self.decoder.close();
        debug!("解码器 {} 已关闭", self.decoder.name());
    }
}

/// 一次运行的输入/输出轨道状态
struct Tracks<'a, S> {
    source: &'a mut S,
    config: PumpConfig,
    cancel: &'a CancelToken,
    clock: PlaybackClock,
    end_of_input: bool,
    stats: PumpStats,
}

impl<S: AccessUnitSource> Tracks<'_, S> {
    fn drive<D: Decoder>(&mut self, decoder: &mut D) -> LiuResult<PumpOutcome> {
        loop {
            if self.cancel.is_cancelled() {
                info!("解码泵被取消");
                return Ok(PumpOutcome::Cancelled);
            }

            if !self.end_of_input {
                self.feed_input(decoder)?;
            }

            match decoder.drain_output(self.config.output_timeout)? {
                OutputStatus::BuffersChanged => debug!("输出缓冲区已变化"),
                OutputStatus::FormatChanged(format) => {
                    self.stats.format_changes += 1;
                    info!("输出格式: {}", format);
                }
                OutputStatus::TryAgain => {}
                OutputStatus::Ready(buffer) => {
                    if let Some(outcome) = self.present(decoder, buffer)? {
                        return Ok(outcome);
                    }
                }
            }
        }
    }

    fn feed_input<D: Decoder>(&mut self, decoder: &mut D) -> LiuResult<()> {
        let Some(mut slot) = decoder.request_input_slot(self.config.input_timeout)? else {
            return Ok(());
        };

        let Some(unit) = self.source.next_access_unit()? else {
            decoder.submit(slot, 0, 0, BufferFlags::END_OF_STREAM)?;
            self.end_of_input = true;
            debug!("输入结束, 已提交流结束标志");
            return Ok(());
        };

        let len = slot.fill(&unit.data)?;
        let unit_type = nal::unit_type(&unit.data);
        if unit_type.is_some_and(|t| t.is_codec_config()) {
            self.stats.config_units += 1;
            match self.config.config_units {
                ConfigUnitPolicy::InspectOnly => {
                    debug!("跳过配置单元 {:?}, {} 字节", unit_type, len);
                    decoder.return_input_slot(slot)?;
                }
                ConfigUnitPolicy::Submit => {
                    decoder.submit(slot, len, 0, BufferFlags::CODEC_CONFIG)?;
                    self.stats.bytes_submitted += len as u64;
                }
            }
            return Ok(());
        }

        decoder.submit(slot, len, unit.pts_us.unwrap_or(0), BufferFlags::empty())?;
        self.stats.units_submitted += 1;
        self.stats.bytes_submitted += len as u64;
        Ok(())
    }

    /// 等待到显示时间后释放输出, 返回 Some 表示本次运行结束
    fn present<D: Decoder>(
        &mut self,
        decoder: &mut D,
        buffer: OutputBuffer,
    ) -> LiuResult<Option<PumpOutcome>> {
        let cancelled = self.config.pacing
            && self
                .cancel
                .wait_until(self.clock.deadline_for(buffer.pts_us));

        if cancelled {
            decoder.release(buffer.index, false)?;
            if buffer.size > 0 {
                self.stats.frames_dropped += 1;
            }
            info!("解码泵在等待显示时被取消");
            return Ok(Some(PumpOutcome::Cancelled));
        }

        decoder.release(buffer.index, true)?;
        if buffer.size > 0 {
            self.stats.frames_rendered += 1;
        }

        if buffer.is_end_of_stream() {
            debug!("收到输出流结束标志");
            return Ok(Some(PumpOutcome::Completed));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liu_codec::decoders::LoopbackDecoder;
    use liu_codec::render::CollectingRenderTarget;
    use liu_codec::{CodecConfig, CodecId};
    use liu_format::{AnnexBSource, ByteSource};

    const SPS: [u8; 8] = [0x00, 0x00, 0x00, 0x01, 0x67, 0x64, 0x00, 0x15];
    const PPS: [u8; 8] = [0x00, 0x00, 0x00, 0x01, 0x68, 0xEB, 0xE3, 0xCB];

    fn stream(frames: usize) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&SPS);
        data.extend_from_slice(&PPS);
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x01, 0x65, 0x88, 0x84]);
        for _ in 1..frames {
            data.extend_from_slice(&[0x00, 0x00, 0x00, 0x01, 0x41, 0x9A, 0x02]);
        }
        data
    }

    fn decoder_config() -> DecoderConfig {
        DecoderConfig::new(
            CodecId::H264,
            320,
            560,
            CodecConfig::new(SPS.to_vec(), PPS.to_vec()).unwrap(),
        )
    }

    #[test]
    fn test_presets() {
        let es = PumpConfig::elementary_stream();
        assert_eq!(es.input_timeout, Duration::from_millis(10));
        assert_eq!(es.output_timeout, Duration::from_millis(100));
        assert_eq!(es.config_units, ConfigUnitPolicy::Submit);

        let mp4 = PumpConfig::container();
        assert_eq!(mp4.output_timeout, Duration::from_millis(10));
        assert!(mp4.pacing);
    }

    #[test]
    fn test_loopback_end_to_end_unpaced() {
        let target = CollectingRenderTarget::new();
        let source = AnnexBSource::new(ByteSource::from_bytes(stream(5)));
        let decoder = LoopbackDecoder::new(target.clone());
        let mut pump = DecodePump::new(
            source,
            decoder,
            PumpConfig::elementary_stream().with_pacing(false),
        );

        let report = pump.run(&decoder_config()).unwrap();
        assert_eq!(report.outcome, PumpOutcome::Completed);
        assert_eq!(report.stats.units_submitted, 5);
        assert_eq!(report.stats.config_units, 2);
        assert_eq!(report.stats.frames_rendered, 5);
        assert_eq!(report.stats.format_changes, 1);
        assert_eq!(pump.decoder().config_units(), 2, "配置单元应以 CODEC_CONFIG 提交");

        let pts: Vec<i64> = target.frames().iter().map(|f| f.pts_us).collect();
        assert_eq!(pts, vec![0, 40_000, 80_000, 120_000, 160_000]);
    }

    #[test]
    fn test_inspect_only_skips_config_units() {
        let source = AnnexBSource::new(ByteSource::from_bytes(stream(2)));
        let decoder = LoopbackDecoder::new(CollectingRenderTarget::new());
        let config = PumpConfig::elementary_stream()
            .with_pacing(false)
            .with_config_units(ConfigUnitPolicy::InspectOnly);
        let mut pump = DecodePump::new(source, decoder, config);

        let report = pump.run(&decoder_config()).unwrap();
        assert_eq!(report.stats.config_units, 2);
        assert_eq!(report.stats.bytes_submitted, 14, "只有两个负载单元被提交");
        assert_eq!(pump.decoder().config_units(), 0);
    }

    #[test]
    fn test_cancel_before_run() {
        let source = AnnexBSource::new(ByteSource::from_bytes(stream(3)));
        let decoder = LoopbackDecoder::new(CollectingRenderTarget::new());
        let mut pump = DecodePump::new(source, decoder, PumpConfig::default());
        pump.cancel_token().cancel();

        let report = pump.run(&decoder_config()).unwrap();
        assert_eq!(report.outcome, PumpOutcome::Cancelled);
        assert_eq!(report.stats.units_submitted, 0);
    }

    #[test]
    fn test_configure_failure_surfaces() {
        let source = AnnexBSource::new(ByteSource::from_bytes(stream(1)));
        let decoder = LoopbackDecoder::new(CollectingRenderTarget::new());
        let mut pump = DecodePump::new(source, decoder, PumpConfig::default());
        let mut config = decoder_config();
        config.width = 0;

        let err = pump.run(&config).expect_err("宽度为 0 应配置失败");
        assert!(matches!(err, liu_core::LiuError::CodecConfig(_)));
    }
}
