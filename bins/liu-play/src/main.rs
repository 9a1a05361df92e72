//! # liu-play
//!
//! H.264 Annex B 裸流播放工具.
//!
//! 支持:
//! - 按时间戳节奏把裸流送入参考解码器并记录渲染帧
//! - 从码流探测 SPS/PPS, 或通过 `--sps/--pps` 指定十六进制配置数据
//! - `--probe` 仅列出 NAL 单元 (类型、偏移、长度)
//! - `--duration` 到时取消播放

mod config;
mod logging;

use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use liu::{DecodePump, PlayerTask, PumpOutcome};
use liu_codec::decoders::LoopbackDecoder;
use liu_codec::nal;
use liu_codec::render::LogRenderTarget;
use liu_format::AnnexBSource;

use crate::config::PlayConfig;

/// 检查播放是否结束的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// liu H.264 裸流播放工具
#[derive(Parser, Debug)]
#[command(name = "liu-play", version, about = "H.264 Annex B 裸流播放工具")]
struct Args {
    /// 输入的 Annex B 文件
    input: Option<PathBuf>,

    /// JSON 配置文件, 命令行参数覆盖其中的同名项
    #[arg(long)]
    config: Option<PathBuf>,

    /// 宽度 (像素)
    #[arg(long)]
    width: Option<u32>,

    /// 高度 (像素)
    #[arg(long)]
    height: Option<u32>,

    /// 帧率 (fps)
    #[arg(long)]
    fps: Option<u32>,

    /// csd-0 十六进制串 (含起始码)
    #[arg(long)]
    sps: Option<String>,

    /// csd-1 十六进制串 (含起始码)
    #[arg(long)]
    pps: Option<String>,

    /// 配置单元只识别不提交
    #[arg(long)]
    inspect_config_only: bool,

    /// 不按时间戳控制节奏, 尽快解码
    #[arg(long)]
    no_pacing: bool,

    /// 播放时长上限 (秒), 到时取消
    #[arg(long)]
    duration: Option<f64>,

    /// 仅列出 NAL 单元, 不解码
    #[arg(long)]
    probe: bool,

    /// 日志级别 (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// 命令行参数覆盖配置
    fn apply(&self, config: &mut PlayConfig) {
        if let Some(input) = &self.input {
            config.input = Some(input.clone());
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(fps) = self.fps {
            config.frame_rate = fps;
        }
        if let Some(sps) = &self.sps {
            config.sps = Some(sps.clone());
        }
        if let Some(pps) = &self.pps {
            config.pps = Some(pps.clone());
        }
        if self.inspect_config_only {
            config.inspect_config_only = true;
        }
        if self.no_pacing {
            config.pacing = false;
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("错误: {e:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => PlayConfig::load(path)?,
        None => PlayConfig::default(),
    };
    args.apply(&mut config);
    logging::init("liu-play", &config.log_dir, args.verbose)?;

    let input = config.input.clone().context("缺少输入文件")?;
    let source = AnnexBSource::open(&input)
        .with_context(|| format!("打开输入失败: {}", input.display()))?;
    info!("liu-play: 打开 {} ({} 字节)", input.display(), source.byte_source().size());

    if args.probe {
        return probe(source);
    }

    let decoder_config = config.decoder_config(source.byte_source())?;
    let pump = DecodePump::new(
        source,
        LoopbackDecoder::new(LogRenderTarget::new()),
        config.pump_config(),
    );
    let task = PlayerTask::spawn("liu-player", pump, decoder_config)?;

    if let Some(secs) = args.duration {
        let limit = Duration::try_from_secs_f64(secs)
            .with_context(|| format!("--duration 非法: {secs}"))?;
        let start = Instant::now();
        while !task.is_finished() {
            if start.elapsed() >= limit {
                info!("已达到播放时长上限 {:.1}s, 取消播放", secs);
                task.cancel();
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    let report = task.join()?;
    let stats = &report.stats;
    println!(
        "{}: 提交 {} 个单元 / {} 个配置单元 ({} 字节), 渲染 {} 帧, 丢弃 {} 帧, 耗时 {:.3}s",
        match report.outcome {
            PumpOutcome::Completed => "播放完成",
            PumpOutcome::Cancelled => "播放取消",
        },
        stats.units_submitted,
        stats.config_units,
        stats.bytes_submitted,
        stats.frames_rendered,
        stats.frames_dropped,
        stats.elapsed.as_secs_f64()
    );
    Ok(())
}

/// 列出所有 NAL 单元
fn probe(mut source: AnnexBSource) -> Result<()> {
    println!("{:>6}  {:>10}  {:>8}  type", "#", "offset", "length");
    let mut counts = std::collections::BTreeMap::<String, u64>::new();
    while let Some(range) = source.next_range() {
        let data = source.byte_source().extract_range(range)?;
        let unit_type = nal::unit_type(&data)
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6}  {:>10}  {:>8}  {}",
            source.units_read() - 1,
            range.offset,
            range.length,
            unit_type
        );
        *counts.entry(unit_type).or_default() += 1;
    }

    if counts.is_empty() {
        warn!("未找到任何 NAL 单元");
    }
    let summary = counts
        .iter()
        .map(|(t, n)| format!("{t}={n}"))
        .collect::<Vec<_>>()
        .join(", ");
    println!("共 {} 个单元: {}", source.units_read(), summary);
    Ok(())
}
