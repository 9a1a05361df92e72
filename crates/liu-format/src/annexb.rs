//! Annex B 码流 NAL 单元边界扫描.
//!
//! # 码流结构
//! ```text
//! [00 00 00 01][NAL 头部][负载...][00 00 00 01][NAL 头部][负载...]...
//! ```
//!
//! Annex B 没有长度前缀, 单元边界只能通过逐字节滑动 4 字节窗口查找起始码.
//! 每次调用 [`next_unit`] 返回一个单元的区间, 区间含前导起始码,
//! 不含下一个单元的起始码. 第一个起始码之前的字节不会被输出.

use liu_codec::nal::{self, NalUnitType, START_CODE};
use liu_codec::CodecConfig;
use log::{debug, trace};

use crate::io::{ByteRange, ByteSource};

/// 最少需要的字节数: 起始码加一个头部字节
const MIN_UNIT_SIZE: u64 = 5;

/// 从游标处查找下一个 NAL 单元
///
/// 返回 None 表示数据不足 (流结束).
///
/// 游标行为:
/// - 遇到下一个单元的起始码时, 游标停在该起始码处
/// - 到达末尾时游标停在 `size()`
pub fn next_unit(source: &mut ByteSource) -> Option<ByteRange> {
    if source.remaining() < MIN_UNIT_SIZE {
        return None;
    }

    let size = source.size();
    let mut start: Option<u64> = None;
    let mut window = [0u8; 4];

    while source.remaining() > 0 {
        if source.remaining() < START_CODE.len() as u64 {
            // 不足一个窗口, 剩余部分全部归入当前单元
            source.set_position(size);
            return start.map(|s| ByteRange::new(s, size - s));
        }

        let before = source.position();
        source.read(&mut window);
        if window == START_CODE {
            match start {
                None => start = Some(before),
                Some(s) => {
                    source.set_position(before);
                    trace!("annexb: 单元 [{}, +{})", s, before - s);
                    return Some(ByteRange::new(s, before - s));
                }
            }
        } else {
            // 步长 1 字节, 窗口重叠
            source.set_position(before + 1);
        }
    }

    start.map(|s| ByteRange::new(s, source.position() - s))
}

/// 从游标处起逐个返回单元区间的迭代器
pub fn units(source: &mut ByteSource) -> impl Iterator<Item = ByteRange> + '_ {
    std::iter::from_fn(move || next_unit(source))
}

/// 在码流中查找第一个 SPS 与第一个 PPS, 组成解码器配置数据
///
/// 扫描在字节源的副本上进行, 不影响调用方的游标.
pub fn probe_codec_config(source: &ByteSource) -> Option<CodecConfig> {
    let mut probe = source.clone();
    probe.set_position(0);

    let mut sps = None;
    let mut pps = None;
    while let Some(range) = next_unit(&mut probe) {
        let Ok(data) = probe.extract_range(range) else {
            continue;
        };
        match nal::unit_type(&data) {
            Some(NalUnitType::Sps) if sps.is_none() => sps = Some(data),
            Some(NalUnitType::Pps) if pps.is_none() => pps = Some(data),
            _ => {}
        }
        if sps.is_some() && pps.is_some() {
            break;
        }
    }

    let config = CodecConfig::new(sps?, pps?).ok()?;
    debug!(
        "annexb: 探测到配置数据 csd-0={} 字节, csd-1={} 字节",
        config.sps.len(),
        config.pps.len()
    );
    Some(config)
}
