//! # Liu (流)
//!
//! H.264 Annex B 裸流分帧与按时间戳控制节奏的解码泵.
//!
//! 数据流向: 字节源 → NAL 单元扫描 → 解码泵 → 解码器 → 渲染目标.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use liu::codec::decoders::LoopbackDecoder;
//! use liu::codec::render::LogRenderTarget;
//! use liu::codec::{CodecId, DecoderConfig};
//! use liu::format::{annexb, AnnexBSource};
//! use liu::{DecodePump, PumpConfig};
//!
//! # fn main() -> liu::core::LiuResult<()> {
//! let source = AnnexBSource::open("video.h264")?;
//! let csd = annexb::probe_codec_config(source.byte_source()).expect("码流中没有 SPS/PPS");
//! let config = DecoderConfig::new(CodecId::H264, 320, 560, csd);
//!
//! let decoder = LoopbackDecoder::new(LogRenderTarget::new());
//! let mut pump = DecodePump::new(source, decoder, PumpConfig::elementary_stream());
//! let report = pump.run(&config)?;
//! println!("渲染 {} 帧", report.stats.frames_rendered);
//! # Ok(())
//! # }
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `liu-core` | 错误类型与有理数 |
//! | `liu-codec` | 解码器接口、NAL 解析、参考解码器 |
//! | `liu-format` | 字节源、Annex B 扫描、访问单元数据源 |

pub mod cancel;
pub mod clock;
pub mod pump;
pub mod task;

/// 核心类型与工具
pub use liu_core as core;

/// 解码器框架
pub use liu_codec as codec;

/// 输入与分帧
pub use liu_format as format;

pub use cancel::CancelToken;
pub use clock::PlaybackClock;
pub use pump::{ConfigUnitPolicy, DecodePump, PumpConfig, PumpOutcome, PumpReport, PumpStats};
pub use task::PlayerTask;

/// 获取 Liu 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
