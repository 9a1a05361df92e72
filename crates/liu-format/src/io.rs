//! 字节源.
//!
//! 码流一次性载入内存, 通过游标顺序读取. 游标只由读取推进,
//! 扫描器通过 `set_position` 回退. 提取区间时返回零拷贝的 `Bytes` 切片.

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use liu_core::{LiuError, LiuResult};
use log::debug;

/// 字节区间
///
/// 指向字节源中的一段数据, 不持有数据本身.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    /// 起始偏移
    pub offset: u64,
    /// 长度 (字节)
    pub length: u64,
}

impl ByteRange {
    /// 创建区间
    pub const fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// 结束偏移 (不含)
    pub const fn end(&self) -> u64 {
        self.offset + self.length
    }

    /// 是否为空区间
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, +{})", self.offset, self.length)
    }
}

/// 可定位的内存字节源
#[derive(Debug, Clone)]
pub struct ByteSource {
    data: Bytes,
    pos: u64,
}

impl ByteSource {
    /// 从内存数据创建, 游标位于 0
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    /// 将整个文件读入内存
    pub fn open(path: impl AsRef<Path>) -> LiuResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        debug!("已载入 {}: {} 字节", path.display(), data.len());
        Ok(Self::from_bytes(data))
    }

    /// 总大小 (字节)
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// 当前游标位置
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// 设置游标位置, 允许越过末尾 (此后读取返回 0)
    pub fn set_position(&mut self, pos: u64) {
        self.pos = pos;
    }

    /// 游标之后剩余的字节数
    pub fn remaining(&self) -> u64 {
        self.size().saturating_sub(self.pos)
    }

    /// 从游标处读取最多 `buf.len()` 字节, 返回实际读取数并推进游标
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let start = self.pos.min(self.size()) as usize;
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos += n as u64;
        n
    }

    /// 提取区间内的数据 (零拷贝), 不移动游标
    pub fn extract_range(&self, range: ByteRange) -> LiuResult<Bytes> {
        if range.end() > self.size() {
            return Err(LiuError::InvalidArgument(format!(
                "区间 {} 超出字节源大小 {}",
                range,
                self.size()
            )));
        }
        Ok(self
            .data
            .slice(range.offset as usize..range.end() as usize))
    }

    /// 通过固定大小的暂存缓冲分块读取区间, 每块交给 `sink`
    ///
    /// 读取结束后游标停在区间末尾.
    pub fn read_range_chunked(
        &mut self,
        range: ByteRange,
        scratch: &mut [u8],
        mut sink: impl FnMut(&[u8]),
    ) -> LiuResult<()> {
        if scratch.is_empty() {
            return Err(LiuError::InvalidArgument("暂存缓冲不能为空".into()));
        }
        if range.end() > self.size() {
            return Err(LiuError::InvalidArgument(format!(
                "区间 {} 超出字节源大小 {}",
                range,
                self.size()
            )));
        }

        self.set_position(range.offset);
        let mut left = range.length;
        while left > 0 {
            let want = scratch.len().min(left as usize);
            let n = self.read(&mut scratch[..want]);
            sink(&scratch[..n]);
            left -= n as u64;
        }
        Ok(())
    }
}
