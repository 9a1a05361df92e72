//! 访问单元 (Access Unit).
//!
//! 对标 FFmpeg 的 `AVPacket`, 表示一次送入解码器的压缩数据.

use bytes::Bytes;

/// 访问单元
///
/// 一次 submit 调用送入解码器的数据. Annex B 码流中通常对应一个 NAL 单元 (含起始码),
/// 来自容器解封装时则对应一个样本并携带显式时间戳.
#[derive(Debug, Clone)]
pub struct AccessUnit {
    /// 压缩数据
    pub data: Bytes,
    /// 显示时间戳 (微秒), None 表示码流未给出
    pub pts_us: Option<i64>,
    /// 在源数据中的字节偏移量 (-1 表示未知)
    pub pos: i64,
}

impl AccessUnit {
    /// 从数据创建访问单元 (无时间戳, 偏移未知)
    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pts_us: None,
            pos: -1,
        }
    }

    /// 附加显式时间戳
    pub fn with_pts_us(mut self, pts_us: i64) -> Self {
        self.pts_us = Some(pts_us);
        self
    }

    /// 附加源偏移量
    pub fn with_pos(mut self, pos: u64) -> Self {
        self.pos = i64::try_from(pos).unwrap_or(-1);
        self
    }

    /// 数据大小 (字节)
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
