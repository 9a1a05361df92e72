//! 统一错误类型定义.
//!
//! 所有 liu crate 共用的错误类型, 支持跨模块传播.

use thiserror::Error;

/// liu 框架统一错误类型
#[derive(Debug, Error)]
pub enum LiuError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 无效数据 (损坏的码流等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// 解码器运行期错误
    #[error("编解码器错误: {0}")]
    Codec(String),

    /// 解码器无法按给定配置创建或配置
    #[error("编解码器配置失败: {0}")]
    CodecConfig(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

/// liu 框架统一 Result 类型
pub type LiuResult<T> = Result<T, LiuError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_convert() {
        fn open_missing() -> LiuResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "raw.h264"))?;
            Ok(())
        }

        let err = open_missing().expect_err("应返回 I/O 错误");
        assert!(matches!(err, LiuError::Io(_)));
        assert!(format!("{err}").contains("raw.h264"));
    }

    #[test]
    fn test_codec_config_message() {
        let err = LiuError::CodecConfig("不支持的编解码器: H.265".into());
        assert_eq!(format!("{err}"), "编解码器配置失败: 不支持的编解码器: H.265");
    }
}
