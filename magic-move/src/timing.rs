//! # Timing 模块
//!
//! 把元素上的延迟/时长指令换算为秒。
//!
//! ## 指令格式
//!
//! | 写法 | 含义 |
//! |------|------|
//! | `0.25` | 总时长的系数 |
//! | `50%` | 总时长的百分比 |
//! | `300ms` | 绝对毫秒 |
//! | `0.5s` | 绝对秒 |
//! | `target` | 取匹配对象的同名属性 |
//!
//! 相对写法的时长按**延迟之后剩余的窗口**计算：
//! `duration = factor × (total − delay)`。

use crate::element::attributes;
use crate::property::parse_numeric;

/// 默认延迟：无延迟
pub const DEFAULT_DELAY: TimingSpec = TimingSpec::Factor(0.0);

/// 默认时长：占满剩余窗口
pub const DEFAULT_DURATION: TimingSpec = TimingSpec::Factor(1.0);

/// 时间指令
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimingSpec {
    /// 总时长的系数
    Factor(f64),
    /// 总时长的百分比
    Percent(f64),
    /// 绝对秒
    Seconds(f64),
    /// 绝对毫秒
    Millis(f64),
    /// 继承匹配对象的值
    Target,
}

impl TimingSpec {
    /// 解析时间指令，无法识别时返回 `None`
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case(attributes::INHERIT_MARKER) {
            return Some(Self::Target);
        }

        let (value, unit) = parse_numeric(text)?;
        match unit.to_ascii_lowercase().as_str() {
            "" => Some(Self::Factor(value)),
            "%" => Some(Self::Percent(value)),
            "ms" => Some(Self::Millis(value)),
            "s" => Some(Self::Seconds(value)),
            _ => None,
        }
    }

    /// 是否为相对总时长的写法
    pub fn is_relative(&self) -> bool {
        matches!(self, Self::Factor(_) | Self::Percent(_))
    }

    /// 在窗口长度内换算为秒
    ///
    /// `Target` 无法单独换算，按 0 处理；调用方应先用 [`inherit`](Self::inherit) 解析。
    pub fn seconds_within(&self, window: f64) -> f64 {
        match *self {
            Self::Factor(f) => f * window,
            Self::Percent(p) => p / 100.0 * window,
            Self::Seconds(s) => s,
            Self::Millis(ms) => ms / 1000.0,
            Self::Target => 0.0,
        }
    }

    /// 解析 `Target`：取匹配对象的值，对方没有（或同样是 `Target`）时取默认值
    pub fn inherit(self, partner: Option<TimingSpec>, default: TimingSpec) -> TimingSpec {
        match self {
            Self::Target => match partner {
                Some(Self::Target) | None => default,
                Some(spec) => spec,
            },
            spec => spec,
        }
    }
}

/// 换算结果（秒）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTiming {
    /// 延迟
    pub delay: f64,
    /// 时长
    pub duration: f64,
}

/// 换算延迟与时长
///
/// 不做额外的裁剪；延迟与时长之和是否落在总时长之内由调用方保证。
pub fn resolve_timing(delay: TimingSpec, duration: TimingSpec, total: f64) -> ResolvedTiming {
    let delay = delay.seconds_within(total);
    let duration = if duration.is_relative() {
        duration.seconds_within(total - delay)
    } else {
        duration.seconds_within(total)
    };
    ResolvedTiming { delay, duration }
}

/// 从可选的属性文本解析指令，缺失或无法识别时使用默认值
pub fn spec_or(text: Option<&str>, default: TimingSpec) -> TimingSpec {
    text.and_then(TimingSpec::parse).unwrap_or(default)
}
