//! 日志初始化模块.
//!
//! 双输出 (统一级别):
//! - console: 彩色
//! - file: 无色, 按天滚动
//!
//! 级别体系 (优先级: LIU_LOG 环境变量 > 命令行 > 默认):
//! - 默认:   info  (解码泵启动/结束, 输出格式)
//! - `-v`:   debug (输入结束、配置单元、渲染帧)
//! - `-vv`:  trace (仅 liu 项目 crate, 含逐个 NAL 单元)
//! - `-vvv`: trace (全局)
//!
//! 日志文件输出到 {log_dir}/{prefix}.{date}.log

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, Timelike};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, FormatEvent, FormatFields, format::Writer},
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// 覆盖命令行级别的环境变量
const LOG_ENV: &str = "LIU_LOG";

/// 本项目 crate 的 target 前缀
const LIU_CRATE_TARGETS: &[&str] = &["liu", "liu_core", "liu_codec", "liu_format", "liu_play"];

fn build_filter(verbosity: u8) -> EnvFilter {
    match verbosity {
        0 => EnvFilter::new("info"),
        1 => EnvFilter::new("debug"),
        2 => {
            let mut directives = LIU_CRATE_TARGETS
                .iter()
                .map(|t| format!("{t}=trace"))
                .collect::<Vec<_>>();
            directives.push("info".to_string());
            EnvFilter::new(directives.join(","))
        }
        _ => EnvFilter::new("trace"),
    }
}

fn filter_for(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| build_filter(verbosity))
}

/// 初始化日志系统
///
/// - `file_prefix`: 日志文件前缀 (如 "liu-play")
/// - `log_dir`: 日志目录, 不存在时创建
/// - `verbosity`: 0=info, 1=debug, 2=trace(liu), 3+=trace(all)
pub fn init(file_prefix: &str, log_dir: &Path, verbosity: u8) -> Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("创建日志目录失败: {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix(file_prefix)
        .filename_suffix("log")
        .build(log_dir)
        .context("创建日志文件失败")?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    LOG_GUARD.set(guard).ok();

    let console_layer = fmt::Layer::default()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .event_format(ConsoleFormatter)
        .with_filter(filter_for(verbosity));

    let file_layer = fmt::Layer::default()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(FileFormatter)
        .with_filter(filter_for(verbosity));

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("日志系统已初始化")?;
    Ok(())
}

/// 时间戳 + 级别 + 线程名前缀, 播放线程与主线程的日志可据此区分
fn write_prefix(writer: &mut Writer<'_>, level: &tracing::Level, color: Option<&str>) -> std::fmt::Result {
    let now = Local::now();
    write!(
        writer,
        "[{:02}-{:02} {:02}:{:02}:{:02}.{:03}] ",
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        now.timestamp_subsec_millis(),
    )?;
    match color {
        Some(color) => write!(writer, "{color}{level:5}\x1b[0m")?,
        None => write!(writer, "{level:5}")?,
    }
    let current = std::thread::current();
    write!(writer, " [{}] > ", current.name().unwrap_or("-"))
}

/// Console 格式: 按级别着色
struct ConsoleFormatter;

impl<S, N> FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let level = event.metadata().level();
        let color = match *level {
            tracing::Level::ERROR => "\x1b[31m",
            tracing::Level::WARN => "\x1b[33m",
            tracing::Level::INFO => "\x1b[32m",
            _ => "\x1b[34m",
        };
        write_prefix(&mut writer, level, Some(color))?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// File 格式: 无色
struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        write_prefix(&mut writer, event.metadata().level(), None)?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_filter_targets_project_crates() {
        let filter = build_filter(2).to_string();
        assert!(filter.contains("liu_format=trace"));
        assert!(filter.contains("info"));
    }
}
