//! # liu-codec
//!
//! liu 码流处理框架的解码器侧抽象.
//!
//! - [`Decoder`]: 基于输入槽/输出缓冲的有状态解码器接口 (对标 Android `MediaCodec`)
//! - [`RenderTarget`]: 解码器释放帧时写入的渲染目标
//! - [`nal`]: H.264 NAL 头部解析与类型识别
//! - [`CodecConfig`]: 解码器启动所需的 SPS/PPS 配置数据
//!
//! ## 使用示例
//!
//! ```rust
//! use liu_codec::decoders::LoopbackDecoder;
//! use liu_codec::render::CollectingRenderTarget;
//! use liu_codec::{CodecConfig, CodecId, Decoder, DecoderConfig};
//!
//! let config = CodecConfig::from_hex("00 00 00 01 67 64 00 15", "00 00 00 01 68 EB E3 CB").unwrap();
//! let mut decoder = LoopbackDecoder::new(CollectingRenderTarget::new());
//! decoder
//!     .configure(&DecoderConfig::new(CodecId::H264, 320, 240, config))
//!     .unwrap();
//! decoder.start().unwrap();
//! ```

pub mod codec_config;
pub mod codec_id;
pub mod decoder;
pub mod decoders;
pub mod nal;
pub mod packet;
pub mod render;

// 重导出常用类型
pub use codec_config::CodecConfig;
pub use codec_id::CodecId;
pub use decoder::{
    BufferFlags, Decoder, DecoderConfig, InputSlot, OutputBuffer, OutputFormat, OutputStatus,
};
pub use nal::{NalUnit, NalUnitType};
pub use packet::AccessUnit;
pub use render::{RenderTarget, RenderedFrame};
