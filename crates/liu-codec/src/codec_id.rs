//! 编解码器标识符.

use std::fmt;

/// 编解码器标识符
///
/// 唯一标识一种视频编码算法, 与容器格式无关.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    /// H.264 / AVC / MPEG-4 Part 10
    H264,
    /// H.265 / HEVC / MPEG-H Part 2
    H265,
}

impl CodecId {
    /// 获取 MIME 类型 (与 `MediaCodec` 的 createDecoderByType 参数一致)
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::H264 => "video/avc",
            Self::H265 => "video/hevc",
        }
    }

    /// 从 MIME 类型解析
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime {
            "video/avc" => Some(Self::H264),
            "video/hevc" => Some(Self::H265),
            _ => None,
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::H264 => "H.264",
            Self::H265 => "H.265",
        };
        write!(f, "{name}")
    }
}
