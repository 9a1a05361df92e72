//! 解码器启动配置数据 (SPS/PPS).
//!
//! 对应 `MediaFormat` 中的 `csd-0` / `csd-1`. 两段数据都保留 Annex B 起始码.

use bytes::Bytes;
use liu_core::{LiuError, LiuResult};

use crate::nal::{self, NalUnitType};

/// 编解码器配置数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// csd-0: 序列参数集 (含起始码)
    pub sps: Bytes,
    /// csd-1: 图像参数集 (含起始码)
    pub pps: Bytes,
}

impl CodecConfig {
    /// 从两段 SPS/PPS 数据创建, 校验其 NAL 类型
    pub fn new(sps: impl Into<Bytes>, pps: impl Into<Bytes>) -> LiuResult<Self> {
        let sps = sps.into();
        let pps = pps.into();
        expect_type(&sps, NalUnitType::Sps, "csd-0")?;
        expect_type(&pps, NalUnitType::Pps, "csd-1")?;
        Ok(Self { sps, pps })
    }

    /// 从十六进制字符串解析, 字节之间可用空白分隔
    ///
    /// 例如 `"00 00 00 01 68 EB E3 CB 22 C0"`.
    pub fn from_hex(sps_hex: &str, pps_hex: &str) -> LiuResult<Self> {
        Self::new(parse_hex(sps_hex)?, parse_hex(pps_hex)?)
    }
}

fn expect_type(data: &[u8], expected: NalUnitType, name: &str) -> LiuResult<()> {
    match nal::unit_type(data) {
        Some(t) if t == expected => Ok(()),
        Some(t) => Err(LiuError::CodecConfig(format!(
            "{name} 应为 {expected}, 实际为 {t}"
        ))),
        None => Err(LiuError::CodecConfig(format!("{name} 数据为空"))),
    }
}

/// 解析空白分隔 (或连续) 的十六进制字节串
pub fn parse_hex(text: &str) -> LiuResult<Vec<u8>> {
    let digits: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return Err(LiuError::InvalidArgument(format!(
            "十六进制串长度为奇数: {text}"
        )));
    }

    digits
        .chunks_exact(2)
        .map(|pair| {
            let hi = hex_value(pair[0]);
            let lo = hex_value(pair[1]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
                _ => Err(LiuError::InvalidArgument(format!(
                    "非法十六进制字符: {}{}",
                    pair[0] as char, pair[1] as char
                ))),
            }
        })
        .collect()
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
