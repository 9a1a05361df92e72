//! 播放配置.
//!
//! 可从 JSON 文件载入, 命令行参数覆盖文件中的同名项. 缺省值与
//! 常见竖屏 H.264 裸流一致: 320x560, 25fps.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use liu::{ConfigUnitPolicy, PumpConfig};
use liu_codec::{CodecConfig, CodecId, DecoderConfig};
use liu_core::Rational;
use liu_format::{ByteSource, annexb};

/// 播放配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayConfig {
    /// 输入的 Annex B 文件
    pub input: Option<PathBuf>,
    /// 编解码器 MIME 类型
    pub codec: String,
    /// 宽度 (像素)
    pub width: u32,
    /// 高度 (像素)
    pub height: u32,
    /// 帧率 (fps)
    pub frame_rate: u32,
    /// csd-0 十六进制串, 缺省时从码流探测
    pub sps: Option<String>,
    /// csd-1 十六进制串, 缺省时从码流探测
    pub pps: Option<String>,
    /// 配置单元只识别不提交
    pub inspect_config_only: bool,
    /// 按时间戳控制节奏
    pub pacing: bool,
    /// 借出输入槽的等待上限 (毫秒)
    pub input_timeout_ms: u64,
    /// 取输出的等待上限 (毫秒)
    pub output_timeout_ms: u64,
    /// 日志目录
    pub log_dir: PathBuf,
}

impl Default for PlayConfig {
    fn default() -> Self {
        let preset = PumpConfig::elementary_stream();
        Self {
            input: None,
            codec: CodecId::H264.mime_type().to_string(),
            width: 320,
            height: 560,
            frame_rate: 25,
            sps: None,
            pps: None,
            inspect_config_only: false,
            pacing: true,
            input_timeout_ms: preset.input_timeout.as_millis() as u64,
            output_timeout_ms: preset.output_timeout.as_millis() as u64,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl PlayConfig {
    /// 从 JSON 文件载入, 文件中缺省的字段取默认值
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))
    }

    /// 解码泵参数
    pub fn pump_config(&self) -> PumpConfig {
        let policy = if self.inspect_config_only {
            ConfigUnitPolicy::InspectOnly
        } else {
            ConfigUnitPolicy::Submit
        };
        PumpConfig {
            input_timeout: Duration::from_millis(self.input_timeout_ms),
            output_timeout: Duration::from_millis(self.output_timeout_ms),
            config_units: policy,
            pacing: self.pacing,
        }
    }

    /// 解码器配置
    ///
    /// SPS/PPS 优先取配置中的十六进制串, 两者都缺省时从码流中探测.
    pub fn decoder_config(&self, stream: &ByteSource) -> Result<DecoderConfig> {
        let codec = CodecId::from_mime_type(&self.codec)
            .with_context(|| format!("未知的编解码器类型: {}", self.codec))?;
        let frame_rate = i32::try_from(self.frame_rate)
            .ok()
            .filter(|&fps| fps > 0)
            .with_context(|| format!("帧率非法: {}", self.frame_rate))?;

        let csd = match (&self.sps, &self.pps) {
            (Some(sps), Some(pps)) => CodecConfig::from_hex(sps, pps)?,
            (None, None) => annexb::probe_codec_config(stream)
                .context("码流中没有 SPS/PPS, 请通过 --sps/--pps 指定")?,
            _ => bail!("--sps 与 --pps 必须同时指定"),
        };

        Ok(DecoderConfig::new(codec, self.width, self.height, csd)
            .with_frame_rate(Rational::from(frame_rate)))
    }
}
