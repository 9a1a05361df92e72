//! H.264 NAL (Network Abstraction Layer) 单元头部解析.
//!
//! # Annex B 起始码
//!
//! 本框架处理的码流以 4 字节起始码 `00 00 00 01` 分隔 NAL 单元,
//! 扫描器输出的单元含起始码; 头部字节紧随起始码之后.
//!
//! # NAL 头部 (1 字节)
//! ```text
//! ┌─────────────────────────────────────┐
//! │ forbidden(1) | ref_idc(2) | type(5) │
//! └─────────────────────────────────────┘
//! ```

use liu_core::{LiuError, LiuResult};

/// 4 字节起始码
pub const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// 3 字节起始码
const SHORT_START_CODE: [u8; 3] = [0x00, 0x00, 0x01];

/// NAL 单元类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum NalUnitType {
    /// 非 IDR 图像切片 (P/B slice)
    Slice,
    /// 数据分区 A (DPA)
    SliceDpa,
    /// 数据分区 B (DPB)
    SliceDpb,
    /// 数据分区 C (DPC)
    SliceDpc,
    /// IDR 图像切片 (关键帧)
    SliceIdr,
    /// 增补增强信息 (SEI)
    Sei,
    /// 序列参数集 (SPS)
    Sps,
    /// 图像参数集 (PPS)
    Pps,
    /// 访问单元分隔符 (AUD)
    Aud,
    /// 序列结束
    EndOfSequence,
    /// 流结束
    EndOfStream,
    /// 填充数据
    FillerData,
    /// SPS 扩展
    SpsExtension,
    /// 未知类型
    Unknown(u8),
}

impl NalUnitType {
    /// 从 NAL 类型编号创建
    pub fn from_type_id(type_id: u8) -> Self {
        match type_id {
            1 => Self::Slice,
            2 => Self::SliceDpa,
            3 => Self::SliceDpb,
            4 => Self::SliceDpc,
            5 => Self::SliceIdr,
            6 => Self::Sei,
            7 => Self::Sps,
            8 => Self::Pps,
            9 => Self::Aud,
            10 => Self::EndOfSequence,
            11 => Self::EndOfStream,
            12 => Self::FillerData,
            13 => Self::SpsExtension,
            _ => Self::Unknown(type_id),
        }
    }

    /// 从头部字节的低 5 位创建
    pub fn from_header_byte(header: u8) -> Self {
        Self::from_type_id(header & 0x1F)
    }

    /// 获取类型编号
    pub fn type_id(&self) -> u8 {
        match self {
            Self::Slice => 1,
            Self::SliceDpa => 2,
            Self::SliceDpb => 3,
            Self::SliceDpc => 4,
            Self::SliceIdr => 5,
            Self::Sei => 6,
            Self::Sps => 7,
            Self::Pps => 8,
            Self::Aud => 9,
            Self::EndOfSequence => 10,
            Self::EndOfStream => 11,
            Self::FillerData => 12,
            Self::SpsExtension => 13,
            Self::Unknown(id) => *id,
        }
    }

    /// 是否为 VCL (Video Coding Layer) NAL
    pub fn is_vcl(&self) -> bool {
        matches!(
            self,
            Self::Slice | Self::SliceDpa | Self::SliceDpb | Self::SliceDpc | Self::SliceIdr
        )
    }

    /// 是否为关键帧 (IDR)
    pub fn is_idr(&self) -> bool {
        matches!(self, Self::SliceIdr)
    }

    /// 是否为编解码器配置数据 (SPS/PPS)
    pub fn is_codec_config(&self) -> bool {
        matches!(self, Self::Sps | Self::Pps)
    }
}

impl std::fmt::Display for NalUnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slice => write!(f, "Slice"),
            Self::SliceDpa => write!(f, "SliceDPA"),
            Self::SliceDpb => write!(f, "SliceDPB"),
            Self::SliceDpc => write!(f, "SliceDPC"),
            Self::SliceIdr => write!(f, "IDR"),
            Self::Sei => write!(f, "SEI"),
            Self::Sps => write!(f, "SPS"),
            Self::Pps => write!(f, "PPS"),
            Self::Aud => write!(f, "AUD"),
            Self::EndOfSequence => write!(f, "EndOfSeq"),
            Self::EndOfStream => write!(f, "EndOfStream"),
            Self::FillerData => write!(f, "Filler"),
            Self::SpsExtension => write!(f, "SPSExt"),
            Self::Unknown(id) => write!(f, "Unknown({id})"),
        }
    }
}

/// 解析后的 NAL 单元头部视图
///
/// 仅借用数据, 不拷贝负载.
#[derive(Debug, Clone, Copy)]
pub struct NalUnit<'a> {
    /// NAL 单元类型
    pub nal_type: NalUnitType,
    /// nal_ref_idc (参考重要性, 0-3)
    pub ref_idc: u8,
    /// NAL 数据 (不含起始码, 含头部字节)
    pub data: &'a [u8],
}

impl<'a> NalUnit<'a> {
    /// 从 NAL 数据解析, 数据可带或不带起始码
    pub fn parse(data: &'a [u8]) -> LiuResult<Self> {
        let data = strip_start_code(data);
        let Some(&header) = data.first() else {
            return Err(LiuError::InvalidData("H.264: NAL 单元数据为空".into()));
        };

        let forbidden = (header >> 7) & 1;
        if forbidden != 0 {
            return Err(LiuError::InvalidData(format!(
                "H.264: forbidden_zero_bit 非法, value={}",
                forbidden
            )));
        }

        Ok(Self {
            nal_type: NalUnitType::from_header_byte(header),
            ref_idc: (header >> 5) & 0x03,
            data,
        })
    }

    /// 头部之后的负载字节
    pub fn payload(&self) -> &'a [u8] {
        &self.data[1..]
    }

    /// 是否为一幅新图像的首个切片
    ///
    /// 切片头第一个语法元素 first_mb_in_slice 为 ue(v),
    /// 其值为 0 当且仅当编码的首位为 1.
    pub fn starts_picture(&self) -> bool {
        self.nal_type.is_vcl() && self.payload().first().is_some_and(|b| b & 0x80 != 0)
    }
}

/// 去除开头的 3 或 4 字节起始码
pub fn strip_start_code(data: &[u8]) -> &[u8] {
    if let Some(rest) = data.strip_prefix(&START_CODE) {
        rest
    } else if let Some(rest) = data.strip_prefix(&SHORT_START_CODE) {
        rest
    } else {
        data
    }
}

/// 获取单元的 NAL 类型 (跳过起始码后的第一个字节), 数据为空时返回 None
pub fn unit_type(data: &[u8]) -> Option<NalUnitType> {
    strip_start_code(data)
        .first()
        .map(|&header| NalUnitType::from_header_byte(header))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nal_type_create() {
        assert_eq!(NalUnitType::from_type_id(7), NalUnitType::Sps);
        assert_eq!(NalUnitType::from_type_id(8), NalUnitType::Pps);
        assert_eq!(NalUnitType::from_type_id(5), NalUnitType::SliceIdr);
        assert_eq!(NalUnitType::from_type_id(1), NalUnitType::Slice);
        assert_eq!(NalUnitType::from_type_id(9), NalUnitType::Aud);
        assert_eq!(NalUnitType::from_type_id(24), NalUnitType::Unknown(24));
    }

    #[test]
    fn test_nal_type_property() {
        assert!(NalUnitType::SliceIdr.is_vcl());
        assert!(NalUnitType::SliceIdr.is_idr());
        assert!(!NalUnitType::Slice.is_idr());
        assert!(!NalUnitType::Sps.is_vcl());
        assert!(NalUnitType::Sps.is_codec_config());
        assert!(NalUnitType::Pps.is_codec_config());
        assert!(!NalUnitType::Sei.is_codec_config());
        assert!(!NalUnitType::SliceIdr.is_codec_config());
    }

    #[test]
    fn test_nal_type_type_id() {
        for id in 0..=31 {
            let nt = NalUnitType::from_type_id(id);
            assert_eq!(nt.type_id(), id);
        }
    }

    #[test]
    fn test_header_byte_low_bits() {
        // 0x67 = 0b0_11_00111, 0x68 = 0b0_11_01000
        assert_eq!(NalUnitType::from_header_byte(0x67), NalUnitType::Sps);
        assert_eq!(NalUnitType::from_header_byte(0x68), NalUnitType::Pps);
        assert_eq!(NalUnitType::from_header_byte(0x65), NalUnitType::SliceIdr);
        assert_eq!(NalUnitType::from_header_byte(0x41), NalUnitType::Slice);
    }

    #[test]
    fn test_nal_unit_parse_with_start_code() {
        let data = [0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0x00, 0x1E];
        let nalu = NalUnit::parse(&data).unwrap();
        assert_eq!(nalu.nal_type, NalUnitType::Sps);
        assert_eq!(nalu.ref_idc, 3);
        assert_eq!(nalu.data, &data[4..]);
        assert_eq!(nalu.payload(), &[0x42, 0x00, 0x1E]);
    }

    #[test]
    fn test_nal_unit_parse_without_start_code() {
        let data = [0x68, 0xCE, 0x38, 0x80];
        let nalu = NalUnit::parse(&data).unwrap();
        assert_eq!(nalu.nal_type, NalUnitType::Pps);
    }

    #[test]
    fn test_nal_unit_empty_data_error() {
        assert!(NalUnit::parse(&[]).is_err());
        assert!(NalUnit::parse(&START_CODE).is_err());
    }

    #[test]
    fn test_nal_unit_reject_forbidden_zero_bit_set() {
        let err = NalUnit::parse(&[0xE7]).expect_err("forbidden_zero_bit=1 应返回错误");
        let msg = format!("{err}");
        assert!(
            msg.contains("forbidden_zero_bit"),
            "错误信息应包含 forbidden_zero_bit, actual={}",
            msg
        );
    }

    #[test]
    fn test_strip_start_code_variants() {
        assert_eq!(strip_start_code(&[0, 0, 0, 1, 0x65]), &[0x65]);
        assert_eq!(strip_start_code(&[0, 0, 1, 0x41]), &[0x41]);
        assert_eq!(strip_start_code(&[0x09, 0xF0]), &[0x09, 0xF0]);
    }

    #[test]
    fn test_unit_type_skips_start_code() {
        // 单元首字节是起始码的 0x00, 类型须从起始码之后的头部字节取得
        assert_eq!(
            unit_type(&[0, 0, 0, 1, 0x67, 0x64]),
            Some(NalUnitType::Sps)
        );
        assert_eq!(unit_type(&[0, 0, 0, 1]), None);
    }

    #[test]
    fn test_starts_picture_first_mb_zero() {
        // first_mb_in_slice = 0 → ue(v) 编码为单个 1 位
        let first = NalUnit::parse(&[0x65, 0x88, 0x80]).unwrap();
        assert!(first.starts_picture());

        // first_mb_in_slice = 1 → 编码 010
        let second = NalUnit::parse(&[0x65, 0x40, 0x80]).unwrap();
        assert!(!second.starts_picture());

        let sps = NalUnit::parse(&[0x67, 0x80]).unwrap();
        assert!(!sps.starts_picture(), "非 VCL 单元不构成图像");
    }
}
