//! # liu-format
//!
//! liu 码流处理框架的输入侧.
//!
//! - [`ByteSource`]: 完整载入内存的可定位字节源
//! - [`annexb`]: Annex B 码流的 NAL 单元边界扫描
//! - [`AccessUnitSource`]: 向解码泵逐个提供访问单元的数据源

pub mod annexb;
pub mod io;
pub mod source;

pub use io::{ByteRange, ByteSource};
pub use source::{AccessUnitSource, AnnexBSource, PacketQueueSource};
