//! 解码器 trait 定义.
//!
//! 所有解码器实现 (硬件解码器封装、进程内参考实现) 都实现 `Decoder` trait.

use std::fmt;
use std::time::Duration;

use bitflags::bitflags;
use liu_core::{LiuError, LiuResult, Rational};

use crate::codec_config::CodecConfig;
use crate::codec_id::CodecId;

bitflags! {
    /// 缓冲区标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BufferFlags: u32 {
        /// 关键帧
        const KEY_FRAME      = 1 << 0;
        /// 编解码器配置数据 (SPS/PPS), 不产生输出帧
        const CODEC_CONFIG   = 1 << 1;
        /// 流结束
        const END_OF_STREAM  = 1 << 2;
    }
}

/// 解码器配置
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// 编解码器标识
    pub codec: CodecId,
    /// 宽度 (像素)
    pub width: u32,
    /// 高度 (像素)
    pub height: u32,
    /// csd-0 / csd-1
    pub codec_config: CodecConfig,
    /// 帧率提示
    pub frame_rate: Rational,
}

impl DecoderConfig {
    /// 默认帧率提示
    pub const DEFAULT_FRAME_RATE: Rational = Rational::new(25, 1);

    /// 创建配置, 帧率取默认值 25fps
    pub fn new(codec: CodecId, width: u32, height: u32, codec_config: CodecConfig) -> Self {
        Self {
            codec,
            width,
            height,
            codec_config,
            frame_rate: Self::DEFAULT_FRAME_RATE,
        }
    }

    /// 设置帧率提示
    pub fn with_frame_rate(mut self, frame_rate: Rational) -> Self {
        self.frame_rate = frame_rate;
        self
    }
}

/// 解码器输入槽
///
/// 由 [`Decoder::request_input_slot`] 借出, 填充数据后通过
/// [`Decoder::submit`] 交还, 或通过 [`Decoder::return_input_slot`] 原样归还.
#[derive(Debug)]
pub struct InputSlot {
    index: usize,
    data: Vec<u8>,
    capacity: usize,
}

impl InputSlot {
    /// 创建空输入槽
    pub fn new(index: usize, capacity: usize) -> Self {
        Self {
            index,
            data: Vec::new(),
            capacity,
        }
    }

    /// 槽位编号
    pub fn index(&self) -> usize {
        self.index
    }

    /// 槽位容量 (字节)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 清空后整体写入数据, 返回写入字节数
    pub fn fill(&mut self, data: &[u8]) -> LiuResult<usize> {
        if data.len() > self.capacity {
            return Err(LiuError::InvalidArgument(format!(
                "输入槽容量不足: slot={}, capacity={}, need={}",
                self.index,
                self.capacity,
                data.len()
            )));
        }
        self.data.clear();
        self.data.extend_from_slice(data);
        Ok(data.len())
    }

    /// 已写入的数据
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// 消耗自身, 返回 (槽位编号, 数据)
    pub fn into_parts(self) -> (usize, Vec<u8>) {
        (self.index, self.data)
    }
}

/// 输出格式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFormat {
    /// 编解码器标识
    pub codec: CodecId,
    /// 宽度 (像素)
    pub width: u32,
    /// 高度 (像素)
    pub height: u32,
    /// 帧率
    pub frame_rate: Rational,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}x{} @ {}fps",
            self.codec, self.width, self.height, self.frame_rate
        )
    }
}

/// 已解码的输出缓冲区
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputBuffer {
    /// 输出缓冲区编号, 用于 release
    pub index: usize,
    /// 显示时间戳 (微秒, 相对流起点)
    pub pts_us: i64,
    /// 有效数据大小, 流结束缓冲为 0
    pub size: usize,
    /// 缓冲区标志
    pub flags: BufferFlags,
}

impl OutputBuffer {
    /// 是否携带流结束标志
    pub fn is_end_of_stream(&self) -> bool {
        self.flags.contains(BufferFlags::END_OF_STREAM)
    }
}

/// 取输出的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputStatus {
    /// 输出缓冲区集合已变化, 需刷新缓存的缓冲区表
    BuffersChanged,
    /// 输出格式已变化
    FormatChanged(OutputFormat),
    /// 等待超时, 暂无输出
    TryAgain,
    /// 一帧已就绪
    Ready(OutputBuffer),
}

/// 解码器 trait
///
/// 定义了有状态解码器的统一接口, 模型与 Android `MediaCodec` 的同步模式一致.
///
/// 解码流程:
/// 1. `configure()` 配置编解码器, `start()` 启动
/// 2. 循环: `request_input_slot()` 借出输入槽, 填充后 `submit()`;
///    `drain_output()` 取输出, 就绪帧通过 `release()` 交给渲染目标
/// 3. 送入带 `END_OF_STREAM` 的空缓冲, 继续取输出直到输出缓冲携带 `END_OF_STREAM`
/// 4. `stop()` 停止, `close()` 释放资源
///
/// 所有带超时的调用都必须在超时内返回.
pub trait Decoder: Send {
    /// 获取解码器名称
    fn name(&self) -> &str;

    /// 使用配置初始化解码器
    fn configure(&mut self, config: &DecoderConfig) -> LiuResult<()>;

    /// 启动解码器
    fn start(&mut self) -> LiuResult<()>;

    /// 借出一个空闲输入槽, 超时返回 `Ok(None)`
    fn request_input_slot(&mut self, timeout: Duration) -> LiuResult<Option<InputSlot>>;

    /// 提交输入槽中前 `len` 字节
    ///
    /// # 参数
    /// - `pts_us`: 显示时间戳 (微秒)
    /// - `flags`: `CODEC_CONFIG` 表示配置数据, `END_OF_STREAM` 表示流结束 (此时 `len` 为 0)
    fn submit(
        &mut self,
        slot: InputSlot,
        len: usize,
        pts_us: i64,
        flags: BufferFlags,
    ) -> LiuResult<()>;

    /// 归还未使用的输入槽
    fn return_input_slot(&mut self, slot: InputSlot) -> LiuResult<()>;

    /// 取一个输出, 超时返回 `OutputStatus::TryAgain`
    fn drain_output(&mut self, timeout: Duration) -> LiuResult<OutputStatus>;

    /// 释放输出缓冲区, `render` 为 true 时写入渲染目标
    fn release(&mut self, index: usize, render: bool) -> LiuResult<()>;

    /// 停止解码
    fn stop(&mut self) -> LiuResult<()>;

    /// 释放解码器资源
    fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_fill_replaces_content() {
        let mut slot = InputSlot::new(3, 8);
        assert_eq!(slot.fill(&[1, 2, 3, 4, 5]).unwrap(), 5);
        assert_eq!(slot.fill(&[9, 9]).unwrap(), 2);
        assert_eq!(slot.data(), &[9, 9]);
        assert_eq!(slot.into_parts(), (3, vec![9, 9]));
    }

    #[test]
    fn test_slot_fill_over_capacity() {
        let mut slot = InputSlot::new(0, 4);
        let err = slot.fill(&[0; 5]).expect_err("超出容量应报错");
        assert!(format!("{err}").contains("容量不足"));
    }

    #[test]
    fn test_output_buffer_eos_flag() {
        let buf = OutputBuffer {
            index: 1,
            pts_us: 0,
            size: 0,
            flags: BufferFlags::END_OF_STREAM,
        };
        assert!(buf.is_end_of_stream());

        let frame = OutputBuffer {
            flags: BufferFlags::KEY_FRAME,
            size: 100,
            ..buf
        };
        assert!(!frame.is_end_of_stream());
    }

    #[test]
    fn test_output_format_display() {
        let fmt = OutputFormat {
            codec: CodecId::H264,
            width: 320,
            height: 560,
            frame_rate: Rational::new(25, 1),
        };
        assert_eq!(format!("{fmt}"), "H.264 320x560 @ 25/1fps");
    }
}
