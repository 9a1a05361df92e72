//! 解码器实现.
//!
//! 硬件解码器封装由平台层提供, 这里只包含进程内的参考实现.

pub mod loopback;

pub use loopback::{LoopbackDecoder, TimestampMode};
