//! 回环参考解码器.
//!
//! 不做实际解压缩, 仅按 `MediaCodec` 同步模式的协议模拟解码器行为:
//! - 固定数量的输入槽, 输出队列满时不再借出
//! - 启动后首次取输出返回 `BuffersChanged`, 首帧前返回 `FormatChanged`
//! - 每个新图像的首个切片产生一帧输出, 时间戳按帧率推算或透传输入时间戳
//! - 输入流结束标志在所有帧之后以空输出缓冲返回
//!
//! 解码在 submit 时同步完成, 等待期间不会出现新的槽位或输出,
//! 因此超时参数只作为上限, 本实现从不阻塞.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use log::{debug, trace, warn};
use liu_core::{LiuError, LiuResult};

use crate::codec_id::CodecId;
use crate::decoder::{
    BufferFlags, Decoder, DecoderConfig, InputSlot, OutputBuffer, OutputFormat, OutputStatus,
};
use crate::nal::NalUnit;
use crate::render::{RenderTarget, RenderedFrame};

/// 默认输入槽数量
const DEFAULT_SLOT_COUNT: usize = 4;

/// 默认输入槽容量 (1 MB)
const DEFAULT_SLOT_CAPACITY: usize = 1024 * 1024;

/// 输出时间戳来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampMode {
    /// 按帧率由帧序号推算 (Annex B 码流无时间戳)
    FrameRate,
    /// 透传输入时间戳 (来自容器的样本)
    PassThrough,
}

/// 解码器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Uninitialized,
    Configured,
    Running,
    Stopped,
    Closed,
}

/// 待取出的输出
#[derive(Debug)]
enum Pending {
    Frame {
        frame_number: u64,
        pts_us: i64,
        size: usize,
        key_frame: bool,
    },
    EndOfStream,
}

/// 回环参考解码器
pub struct LoopbackDecoder<R: RenderTarget> {
    render: R,
    state: State,
    config: Option<DecoderConfig>,
    timestamp_mode: TimestampMode,
    slot_count: usize,
    slot_capacity: usize,
    free_slots: VecDeque<usize>,
    lent_slots: Vec<bool>,
    pending: VecDeque<Pending>,
    in_flight: HashMap<usize, (OutputBuffer, u64)>,
    next_output_index: usize,
    frames_decoded: u64,
    last_pts_us: i64,
    config_units: u64,
    buffers_announced: bool,
    format_announced: bool,
    input_ended: bool,
}

impl<R: RenderTarget> LoopbackDecoder<R> {
    /// 创建解码器, 输出时间戳按帧率推算
    pub fn new(render: R) -> Self {
        Self {
            render,
            state: State::Uninitialized,
            config: None,
            timestamp_mode: TimestampMode::FrameRate,
            slot_count: DEFAULT_SLOT_COUNT,
            slot_capacity: DEFAULT_SLOT_CAPACITY,
            free_slots: VecDeque::new(),
            lent_slots: Vec::new(),
            pending: VecDeque::new(),
            in_flight: HashMap::new(),
            next_output_index: 0,
            frames_decoded: 0,
            last_pts_us: 0,
            config_units: 0,
            buffers_announced: false,
            format_announced: false,
            input_ended: false,
        }
    }

    /// 设置输入槽数量与单槽容量
    pub fn with_slots(mut self, count: usize, capacity: usize) -> Self {
        self.slot_count = count.max(1);
        self.slot_capacity = capacity;
        self
    }

    /// 设置输出时间戳来源
    pub fn with_timestamp_mode(mut self, mode: TimestampMode) -> Self {
        self.timestamp_mode = mode;
        self
    }

    /// 渲染目标
    pub fn render_target(&self) -> &R {
        &self.render
    }

    /// 已收到的配置单元 (CODEC_CONFIG) 数量
    pub fn config_units(&self) -> u64 {
        self.config_units
    }

    /// 已产生的帧数
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    fn require_running(&self, op: &str) -> LiuResult<()> {
        if self.state != State::Running {
            return Err(LiuError::Codec(format!(
                "loopback: {op} 需要解码器处于运行状态, 当前={:?}",
                self.state
            )));
        }
        Ok(())
    }

    fn output_format(&self) -> Option<OutputFormat> {
        self.config.as_ref().map(|c| OutputFormat {
            codec: c.codec,
            width: c.width,
            height: c.height,
            frame_rate: c.frame_rate,
        })
    }

    /// 解码一个负载单元, 新图像入队, 同一图像的后续切片累加大小
    fn decode_unit(&mut self, data: &[u8], pts_us: i64) {
        let nalu = match NalUnit::parse(data) {
            Ok(n) => n,
            Err(e) => {
                warn!("loopback: 丢弃无法解析的单元: {}", e);
                return;
            }
        };

        if !nalu.nal_type.is_vcl() {
            trace!("loopback: 非 VCL 单元 {}, 无输出", nalu.nal_type);
            return;
        }

        if !nalu.starts_picture() {
            if let Some(Pending::Frame { size, .. }) = self.pending.back_mut() {
                *size += data.len();
            }
            return;
        }

        let frame_number = self.frames_decoded;
        self.frames_decoded += 1;
        let pts_us = match self.timestamp_mode {
            TimestampMode::PassThrough => pts_us,
            TimestampMode::FrameRate => self
                .config
                .as_ref()
                .map(|c| c.frame_rate.invert().ticks_to_micros(frame_number as i64))
                .unwrap_or(0),
        };
        self.last_pts_us = pts_us;
        self.pending.push_back(Pending::Frame {
            frame_number,
            pts_us,
            size: data.len(),
            key_frame: nalu.nal_type.is_idr(),
        });
    }

    fn hand_out(&mut self, buffer: OutputBuffer, frame_number: u64) -> OutputStatus {
        self.in_flight.insert(buffer.index, (buffer, frame_number));
        self.next_output_index += 1;
        OutputStatus::Ready(buffer)
    }
}

impl<R: RenderTarget> Decoder for LoopbackDecoder<R> {
    fn name(&self) -> &str {
        "loopback"
    }

    fn configure(&mut self, config: &DecoderConfig) -> LiuResult<()> {
        if !matches!(self.state, State::Uninitialized | State::Stopped) {
            return Err(LiuError::CodecConfig(format!(
                "loopback: 当前状态 {:?} 不能配置",
                self.state
            )));
        }
        if config.codec != CodecId::H264 {
            return Err(LiuError::CodecConfig(format!(
                "loopback: 不支持的编解码器: {} ({})",
                config.codec,
                config.codec.mime_type()
            )));
        }
        if config.width == 0 || config.height == 0 {
            return Err(LiuError::CodecConfig("宽度和高度不能为 0".into()));
        }
        if !config.frame_rate.is_positive() {
            return Err(LiuError::CodecConfig(format!(
                "帧率非法: {}",
                config.frame_rate
            )));
        }

        debug!(
            "配置 loopback 解码器: {} {}x{}, 帧率={}, csd-0={} 字节, csd-1={} 字节",
            config.codec.mime_type(),
            config.width,
            config.height,
            config.frame_rate,
            config.codec_config.sps.len(),
            config.codec_config.pps.len(),
        );
        self.config = Some(config.clone());
        self.state = State::Configured;
        Ok(())
    }

    fn start(&mut self) -> LiuResult<()> {
        if self.state != State::Configured {
            return Err(LiuError::Codec(format!(
                "loopback: 未配置, 不能启动, 当前={:?}",
                self.state
            )));
        }
        self.free_slots = (0..self.slot_count).collect();
        self.lent_slots = vec![false; self.slot_count];
        self.pending.clear();
        self.in_flight.clear();
        self.next_output_index = 0;
        self.frames_decoded = 0;
        self.last_pts_us = 0;
        self.buffers_announced = false;
        self.format_announced = false;
        self.input_ended = false;
        self.state = State::Running;
        Ok(())
    }

    fn request_input_slot(&mut self, _timeout: Duration) -> LiuResult<Option<InputSlot>> {
        self.require_running("request_input_slot")?;
        if self.input_ended || self.pending.len() >= self.slot_count {
            return Ok(None);
        }
        let Some(index) = self.free_slots.pop_front() else {
            return Ok(None);
        };
        self.lent_slots[index] = true;
        Ok(Some(InputSlot::new(index, self.slot_capacity)))
    }

    fn submit(
        &mut self,
        slot: InputSlot,
        len: usize,
        pts_us: i64,
        flags: BufferFlags,
    ) -> LiuResult<()> {
        self.require_running("submit")?;
        let (index, data) = slot.into_parts();
        if !self.lent_slots.get(index).copied().unwrap_or(false) {
            return Err(LiuError::InvalidArgument(format!(
                "loopback: 输入槽 {index} 未被借出"
            )));
        }
        if len > data.len() {
            return Err(LiuError::InvalidArgument(format!(
                "loopback: 提交长度 {len} 超过已写入数据 {}",
                data.len()
            )));
        }
        self.lent_slots[index] = false;
        self.free_slots.push_back(index);

        if self.input_ended {
            return Err(LiuError::Codec("loopback: 流结束后不能继续提交".into()));
        }

        if flags.contains(BufferFlags::END_OF_STREAM) {
            debug!("loopback: 收到输入流结束标志");
            self.input_ended = true;
            self.pending.push_back(Pending::EndOfStream);
        } else if flags.contains(BufferFlags::CODEC_CONFIG) {
            self.config_units += 1;
            trace!("loopback: 收到配置单元, {} 字节", len);
        } else {
            self.decode_unit(&data[..len], pts_us);
        }
        Ok(())
    }

    fn return_input_slot(&mut self, slot: InputSlot) -> LiuResult<()> {
        self.require_running("return_input_slot")?;
        let index = slot.index();
        if !self.lent_slots.get(index).copied().unwrap_or(false) {
            return Err(LiuError::InvalidArgument(format!(
                "loopback: 输入槽 {index} 未被借出"
            )));
        }
        self.lent_slots[index] = false;
        self.free_slots.push_back(index);
        Ok(())
    }

    fn drain_output(&mut self, _timeout: Duration) -> LiuResult<OutputStatus> {
        self.require_running("drain_output")?;

        if !self.buffers_announced {
            self.buffers_announced = true;
            return Ok(OutputStatus::BuffersChanged);
        }

        let front_is_frame = match self.pending.front() {
            None => return Ok(OutputStatus::TryAgain),
            Some(pending) => matches!(pending, Pending::Frame { .. }),
        };
        if front_is_frame && !self.format_announced {
            self.format_announced = true;
            return match self.output_format() {
                Some(format) => Ok(OutputStatus::FormatChanged(format)),
                None => Err(LiuError::Internal("loopback: 运行中缺少配置".into())),
            };
        }

        let index = self.next_output_index;
        match self.pending.pop_front() {
            Some(Pending::Frame {
                frame_number,
                pts_us,
                size,
                key_frame,
            }) => {
                let flags = if key_frame {
                    BufferFlags::KEY_FRAME
                } else {
                    BufferFlags::empty()
                };
                let buffer = OutputBuffer {
                    index,
                    pts_us,
                    size,
                    flags,
                };
                Ok(self.hand_out(buffer, frame_number))
            }
            Some(Pending::EndOfStream) => {
                let buffer = OutputBuffer {
                    index,
                    pts_us: self.last_pts_us,
                    size: 0,
                    flags: BufferFlags::END_OF_STREAM,
                };
                Ok(self.hand_out(buffer, self.frames_decoded))
            }
            None => Ok(OutputStatus::TryAgain),
        }
    }

    fn release(&mut self, index: usize, render: bool) -> LiuResult<()> {
        self.require_running("release")?;
        let Some((buffer, frame_number)) = self.in_flight.remove(&index) else {
            return Err(LiuError::InvalidArgument(format!(
                "loopback: 未知输出缓冲区 {index}"
            )));
        };
        if render && buffer.size > 0 {
            self.render.render(RenderedFrame {
                frame_number,
                pts_us: buffer.pts_us,
                size: buffer.size,
                key_frame: buffer.flags.contains(BufferFlags::KEY_FRAME),
            });
        }
        Ok(())
    }

    fn stop(&mut self) -> LiuResult<()> {
        if self.state == State::Closed {
            return Err(LiuError::Codec("loopback: 已关闭, 不能停止".into()));
        }
        if !self.in_flight.is_empty() {
            debug!("loopback: 停止时丢弃 {} 个未释放的输出", self.in_flight.len());
        }
        self.pending.clear();
        self.in_flight.clear();
        self.free_slots.clear();
        self.lent_slots.clear();
        if self.state != State::Uninitialized {
            self.state = State::Stopped;
        }
        Ok(())
    }

    fn close(&mut self) {
        self.pending.clear();
        self.in_flight.clear();
        self.config = None;
        self.state = State::Closed;
    }
}
