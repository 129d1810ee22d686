//! # Easing 模块
//!
//! 缓动函数库，用于补间的时间插值。
//!
//! 名称解析忽略大小写与分隔符：`ease-in-out`、`easeInOut`、`ease_in_out` 等价。

use std::f64::consts::PI;

/// 缓动函数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EasingFunction {
    /// 线性（匀速）
    Linear,
    /// 缓入（先慢后快）
    EaseIn,
    /// 缓出（先快后慢）
    EaseOut,
    /// 缓入缓出（两头慢中间快）
    #[default]
    EaseInOut,
    /// 二次缓入
    EaseInQuad,
    /// 二次缓出
    EaseOutQuad,
    /// 二次缓入缓出
    EaseInOutQuad,
    /// 正弦缓入
    EaseInSine,
    /// 正弦缓出
    EaseOutSine,
    /// 正弦缓入缓出
    EaseInOutSine,
    /// 弹性缓出
    EaseOutElastic,
    /// 弹跳缓出
    EaseOutBounce,
}

impl EasingFunction {
    /// 按名称解析，未知名称返回 `None`
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | '.' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        let easing = match key.as_str() {
            "linear" | "none" => Self::Linear,
            "easein" | "easeincubic" => Self::EaseIn,
            "easeout" | "easeoutcubic" => Self::EaseOut,
            "ease" | "easeinout" | "easeinoutcubic" => Self::EaseInOut,
            "easeinquad" => Self::EaseInQuad,
            "easeoutquad" => Self::EaseOutQuad,
            "easeinoutquad" => Self::EaseInOutQuad,
            "easeinsine" => Self::EaseInSine,
            "easeoutsine" => Self::EaseOutSine,
            "easeinoutsine" => Self::EaseInOutSine,
            "easeoutelastic" | "elastic" => Self::EaseOutElastic,
            "easeoutbounce" | "bounce" => Self::EaseOutBounce,
            _ => return None,
        };
        Some(easing)
    }

    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度 (0.0 - 1.0)
    ///
    /// # 返回
    /// - 缓动后的进度值（弹性曲线可能短暂越过 1.0）
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::EaseIn => t * t * t,
            Self::EaseOut => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::EaseInQuad => t * t,
            Self::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            Self::EaseOutSine => (t * PI / 2.0).sin(),
            Self::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Self::EaseOutElastic => ease_out_elastic(t),
            Self::EaseOutBounce => ease_out_bounce(t),
        }
    }
}

/// 弹性缓出
fn ease_out_elastic(t: f64) -> f64 {
    if t == 0.0 || t == 1.0 {
        return t;
    }
    let c4 = (2.0 * PI) / 3.0;
    2.0_f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
}

/// 弹跳缓出
fn ease_out_bounce(t: f64) -> f64 {
    let n1 = 7.5625;
    let d1 = 2.75;

    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_ignores_case_and_separators() {
        assert_eq!(
            EasingFunction::from_name("ease-in-out"),
            Some(EasingFunction::EaseInOut)
        );
        assert_eq!(
            EasingFunction::from_name("easeInOut"),
            Some(EasingFunction::EaseInOut)
        );
        assert_eq!(
            EasingFunction::from_name("EASE_OUT_QUAD"),
            Some(EasingFunction::EaseOutQuad)
        );
        assert_eq!(EasingFunction::from_name("wobble"), None);
    }

    #[test]
    fn test_endpoints() {
        for easing in [
            EasingFunction::Linear,
            EasingFunction::EaseInOut,
            EasingFunction::EaseOutSine,
            EasingFunction::EaseOutElastic,
        ] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_ease_in_out_midpoint() {
        let mid = EasingFunction::EaseInOut.apply(0.5);
        assert!((mid - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_clamp() {
        let easing = EasingFunction::Linear;
        assert_eq!(easing.apply(-0.5), 0.0);
        assert_eq!(easing.apply(1.5), 1.0);
    }

    #[test]
    fn test_ease_out_bounce() {
        let easing = EasingFunction::EaseOutBounce;
        assert_eq!(easing.apply(0.0), 0.0);
        assert!((easing.apply(1.0) - 1.0).abs() < 0.001);
    }
}
