//! 有理数类型, 用于帧率与时间基.
//!
//! 帧率 25/1 的倒数即每帧时长的时间基 1/25 秒.

use std::fmt;

/// 有理数, 由分子和分母组成
///
/// 例如: 帧率 30000/1001 表示 29.97fps, 时间基 1/1_000_000 表示微秒.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    /// 分子
    pub num: i32,
    /// 分母
    pub den: i32,
}

impl Rational {
    /// 创建新的有理数
    ///
    /// # 参数
    /// - `num`: 分子
    /// - `den`: 分母 (不应为 0)
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// 未定义 (分母为 0)
    pub const UNDEFINED: Self = Self { num: 0, den: 0 };

    /// 常用时间基: 微秒 (1/1_000_000)
    pub const MICRO: Self = Self {
        num: 1,
        den: 1_000_000,
    };

    /// 判断是否有效 (分母不为 0)
    pub const fn is_valid(&self) -> bool {
        self.den != 0
    }

    /// 判断是否可作为帧率 (分子分母均为正)
    pub const fn is_positive(&self) -> bool {
        self.num > 0 && self.den > 0
    }

    /// 转换为 f64 浮点数
    ///
    /// 如果分母为 0, 返回 `f64::NAN`.
    pub fn to_f64(self) -> f64 {
        if self.den == 0 {
            return f64::NAN;
        }
        f64::from(self.num) / f64::from(self.den)
    }

    /// 求倒数
    pub const fn invert(self) -> Self {
        Self {
            num: self.den,
            den: self.num,
        }
    }

    /// 将以本时间基为单位的刻度数换算为微秒
    ///
    /// 使用 i128 交叉乘法避免溢出; 无效时间基返回 0.
    pub fn ticks_to_micros(self, ticks: i64) -> i64 {
        if self.den == 0 {
            return 0;
        }
        let us = i128::from(ticks) * i128::from(self.num) * 1_000_000 / i128::from(self.den);
        us.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl From<(i32, i32)> for Rational {
    fn from((num, den): (i32, i32)) -> Self {
        Self { num, den }
    }
}

impl From<i32> for Rational {
    fn from(num: i32) -> Self {
        Self { num, den: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rational_to_float() {
        let r = Rational::new(1, 4);
        assert!((r.to_f64() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rational_invalid_value() {
        let r = Rational::UNDEFINED;
        assert!(!r.is_valid());
        assert!(!r.is_positive());
        assert!(r.to_f64().is_nan());
        assert_eq!(r.ticks_to_micros(10), 0);
    }

    #[test]
    fn test_rational_display() {
        let r = Rational::new(30000, 1001);
        assert_eq!(format!("{r}"), "30000/1001");
    }

    #[test]
    fn test_frame_duration_from_rate() {
        // 25fps: 每帧 40ms
        let tb = Rational::from(25).invert();
        assert_eq!(tb.ticks_to_micros(1), 40_000);
        assert_eq!(tb.ticks_to_micros(25), 1_000_000);

        // 29.97fps: 第 30000 帧恰好在 1001 秒处
        let ntsc = Rational::new(30000, 1001).invert();
        assert_eq!(ntsc.ticks_to_micros(30000), 1_001_000_000);
    }

    #[test]
    fn test_micro_time_base_identity() {
        assert_eq!(Rational::MICRO.ticks_to_micros(123_456), 123_456);
    }
}
