//! # liu-core
//!
//! liu 码流处理框架核心库, 提供统一错误类型与时间基等基础类型.
//!
//! 其余 crate (`liu-codec`, `liu-format`) 与顶层的解码泵都依赖此 crate.

pub mod error;
pub mod rational;

// 重导出常用类型
pub use error::{LiuError, LiuResult};
pub use rational::Rational;
