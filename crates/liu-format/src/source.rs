//! 访问单元数据源.
//!
//! 解码泵通过 [`AccessUnitSource`] 逐个拉取访问单元, 不关心数据来自
//! Annex B 裸流还是容器解封装后的样本队列.

use std::collections::VecDeque;
use std::path::Path;

use liu_codec::AccessUnit;
use liu_core::LiuResult;
use log::debug;

use crate::annexb;
use crate::io::{ByteRange, ByteSource};

/// 访问单元数据源 trait
///
/// 使用流程:
/// 1. 循环调用 `next_access_unit()` 取得下一个访问单元
/// 2. 返回 `Ok(None)` 表示数据源已耗尽, 此后不应再调用
pub trait AccessUnitSource: Send {
    /// 数据源名称
    fn name(&self) -> &str;

    /// 读取下一个访问单元
    ///
    /// # 返回
    /// - `Ok(Some(unit))`: 成功读取
    /// - `Ok(None)`: 数据源已耗尽
    /// - `Err(_)`: 读取失败
    fn next_access_unit(&mut self) -> LiuResult<Option<AccessUnit>>;
}

impl<S: AccessUnitSource + ?Sized> AccessUnitSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn next_access_unit(&mut self) -> LiuResult<Option<AccessUnit>> {
        (**self).next_access_unit()
    }
}

/// Annex B 裸流数据源
///
/// 每个 NAL 单元 (含起始码) 作为一个访问单元, 不带时间戳.
pub struct AnnexBSource {
    source: ByteSource,
    units_read: u64,
}

impl AnnexBSource {
    /// 从字节源创建
    pub fn new(source: ByteSource) -> Self {
        Self {
            source,
            units_read: 0,
        }
    }

    /// 打开 Annex B 文件
    pub fn open(path: impl AsRef<Path>) -> LiuResult<Self> {
        Ok(Self::new(ByteSource::open(path)?))
    }

    /// 扫描下一个单元的区间, 不提取数据
    pub fn next_range(&mut self) -> Option<ByteRange> {
        let range = annexb::next_unit(&mut self.source)?;
        self.units_read += 1;
        Some(range)
    }

    /// 底层字节源
    pub fn byte_source(&self) -> &ByteSource {
        &self.source
    }

    /// 已读取的单元数
    pub fn units_read(&self) -> u64 {
        self.units_read
    }
}

impl AccessUnitSource for AnnexBSource {
    fn name(&self) -> &str {
        "annexb"
    }

    fn next_access_unit(&mut self) -> LiuResult<Option<AccessUnit>> {
        let Some(range) = self.next_range() else {
            debug!(
                "annexb: 数据源耗尽, 共 {} 个单元, 游标={}/{}",
                self.units_read,
                self.source.position(),
                self.source.size()
            );
            return Ok(None);
        };
        let data = self.source.extract_range(range)?;
        Ok(Some(AccessUnit::from_data(data).with_pos(range.offset)))
    }
}

/// 预先解封装的样本队列数据源
///
/// 每个样本携带显式时间戳, 按入队顺序送出.
#[derive(Default)]
pub struct PacketQueueSource {
    queue: VecDeque<AccessUnit>,
}

impl PacketQueueSource {
    /// 创建空队列
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个样本
    pub fn push(&mut self, unit: AccessUnit) {
        self.queue.push_back(unit);
    }

    /// 剩余样本数
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// 是否已空
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl FromIterator<AccessUnit> for PacketQueueSource {
    fn from_iter<I: IntoIterator<Item = AccessUnit>>(iter: I) -> Self {
        Self {
            queue: iter.into_iter().collect(),
        }
    }
}

impl AccessUnitSource for PacketQueueSource {
    fn name(&self) -> &str {
        "packet-queue"
    }

    fn next_access_unit(&mut self) -> LiuResult<Option<AccessUnit>> {
        Ok(self.queue.pop_front())
    }
}
