//! # Value 模块
//!
//! 属性值的解析与插值。
//!
//! | 形式 | 示例 | 插值方式 |
//! |------|------|----------|
//! | 数值 | `50px`、`0.5`、`30` | 单位相同时线性插值 |
//! | 函数列表 | `translate(10px, 0px) scale(2)` | 函数名与参数个数一致时逐参数插值 |
//! | 其他 | `red`、`auto`、`none` | 不插值，完成时切换 |
//!
//! 相对值 `+=370` / `-=15` 以起始数值为基准解析。

use std::fmt;

use magic_move::property::{format_number, parse_numeric};

/// 带单位的数值
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

impl Quantity {
    /// 完整解析 `50px`、`-1.5`、`30deg`；单位只能由字母或 `%` 组成
    fn parse(text: &str) -> Option<Self> {
        let (value, unit) = parse_numeric(text)?;
        if !unit.chars().all(|c| c.is_ascii_alphabetic() || c == '%') {
            return None;
        }
        Some(Self {
            value,
            unit: unit.to_string(),
        })
    }

    /// 与另一个数值的公共单位；无单位的 0 可以与任何单位搭配
    fn common_unit<'a>(&'a self, other: &'a Self) -> Option<&'a str> {
        if self.unit == other.unit {
            Some(&self.unit)
        } else if self.unit.is_empty() && self.value == 0.0 {
            Some(&other.unit)
        } else if other.unit.is_empty() && other.value == 0.0 {
            Some(&self.unit)
        } else {
            None
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", format_number(self.value), self.unit)
    }
}

/// 函数调用，如 `translate(10px, 20px)`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionValue {
    pub name: String,
    pub args: Vec<Quantity>,
}

/// 解析后的属性值
#[derive(Debug, Clone, PartialEq)]
pub enum AnimatedValue {
    /// 数值
    Number(Quantity),
    /// 函数列表
    Functions(Vec<FunctionValue>),
    /// 不可插值的文本
    Discrete(String),
}

impl AnimatedValue {
    /// 解析属性值
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Some(quantity) = Quantity::parse(text) {
            return Self::Number(quantity);
        }
        match parse_functions(text) {
            Some(functions) if !functions.is_empty() => Self::Functions(functions),
            _ => Self::Discrete(text.to_string()),
        }
    }

    /// 解析终点值，`+=` / `-=` 相对 `start` 计算
    ///
    /// 相对值的基准不是数值时返回 `None`。
    pub fn parse_end(start: &AnimatedValue, text: &str) -> Option<Self> {
        let text = text.trim();
        let (sign, rest) = if let Some(rest) = text.strip_prefix("+=") {
            (1.0, rest)
        } else if let Some(rest) = text.strip_prefix("-=") {
            (-1.0, rest)
        } else {
            return Some(Self::parse(text));
        };

        let delta = Quantity::parse(rest)?;
        let Self::Number(base) = start else {
            return None;
        };
        let unit = base.common_unit(&delta)?.to_string();
        Some(Self::Number(Quantity {
            value: base.value + sign * delta.value,
            unit,
        }))
    }

    /// 两个值之间能否连续插值
    pub fn is_interpolable_with(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.common_unit(b).is_some(),
            (Self::Functions(a), Self::Functions(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| {
                        x.name == y.name
                            && x.args.len() == y.args.len()
                            && x.args.iter().zip(&y.args).all(|(p, q)| p.common_unit(q).is_some())
                    })
            }
            _ => false,
        }
    }

    /// 在 `self` 与 `end` 之间取 `t` 处的值
    ///
    /// 无法插值时 `t < 1` 保持起点，`t >= 1` 切换到终点。
    pub fn sample(&self, end: &Self, t: f64) -> Self {
        if !self.is_interpolable_with(end) {
            return if t >= 1.0 { end.clone() } else { self.clone() };
        }
        match (self, end) {
            (Self::Number(a), Self::Number(b)) => Self::Number(lerp_quantity(a, b, t)),
            (Self::Functions(a), Self::Functions(b)) => Self::Functions(
                a.iter()
                    .zip(b)
                    .map(|(x, y)| FunctionValue {
                        name: x.name.clone(),
                        args: x
                            .args
                            .iter()
                            .zip(&y.args)
                            .map(|(p, q)| lerp_quantity(p, q, t))
                            .collect(),
                    })
                    .collect(),
            ),
            _ => end.clone(),
        }
    }
}

impl fmt::Display for AnimatedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(quantity) => write!(f, "{}", quantity),
            Self::Functions(functions) => {
                for (i, function) in functions.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}(", function.name)?;
                    for (j, arg) in function.args.iter().enumerate() {
                        if j > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            Self::Discrete(text) => write!(f, "{}", text),
        }
    }
}

fn lerp_quantity(a: &Quantity, b: &Quantity, t: f64) -> Quantity {
    let unit = a.common_unit(b).unwrap_or(&b.unit).to_string();
    Quantity {
        value: a.value + (b.value - a.value) * t,
        unit,
    }
}

/// 解析 `name(args) name(args)`，参数必须全部是数值；不满足时返回 `None`
fn parse_functions(text: &str) -> Option<Vec<FunctionValue>> {
    let mut out = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        let open = rest.find('(')?;
        let close = open + rest[open..].find(')')?;
        let name = rest[..open].trim();
        let body = &rest[open + 1..close];
        if name.is_empty()
            || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            || body.contains('(')
        {
            return None;
        }
        let args = body
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(Quantity::parse)
            .collect::<Option<Vec<_>>>()?;
        out.push(FunctionValue {
            name: name.to_string(),
            args,
        });
        rest = rest[close + 1..].trim_start();
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert!(matches!(AnimatedValue::parse("50px"), AnimatedValue::Number(_)));
        assert!(matches!(
            AnimatedValue::parse("translate(10px, 5px) scale(2)"),
            AnimatedValue::Functions(f) if f.len() == 2
        ));
        assert_eq!(
            AnimatedValue::parse("none"),
            AnimatedValue::Discrete("none".to_string())
        );
        assert_eq!(
            AnimatedValue::parse("url(a.png)"),
            AnimatedValue::Discrete("url(a.png)".to_string())
        );
    }

    #[test]
    fn test_number_lerp() {
        let a = AnimatedValue::parse("50px");
        let b = AnimatedValue::parse("200px");
        assert_eq!(a.sample(&b, 0.5).to_string(), "125px");
        assert_eq!(a.sample(&b, 1.0).to_string(), "200px");
    }

    #[test]
    fn test_unitless_zero_adopts_unit() {
        let a = AnimatedValue::parse("0");
        let b = AnimatedValue::parse("40px");
        assert_eq!(a.sample(&b, 0.25).to_string(), "10px");
    }

    #[test]
    fn test_relative_end() {
        let start = AnimatedValue::parse("10");
        let end = AnimatedValue::parse_end(&start, "+=370").unwrap();
        assert_eq!(end.to_string(), "380");
        assert_eq!(start.sample(&end, 0.5).to_string(), "195");

        let back = AnimatedValue::parse_end(&start, "-=15").unwrap();
        assert_eq!(back.to_string(), "-5");

        let discrete = AnimatedValue::parse("auto");
        assert_eq!(AnimatedValue::parse_end(&discrete, "+=5"), None);
    }

    #[test]
    fn test_function_lerp() {
        let a = AnimatedValue::parse("translate(0px, 10px)");
        let b = AnimatedValue::parse("translate(100px, 10px)");
        assert_eq!(a.sample(&b, 0.5).to_string(), "translate(50px, 10px)");
    }

    #[test]
    fn test_mismatched_values_snap_at_end() {
        let a = AnimatedValue::parse("none");
        let b = AnimatedValue::parse("scale(2)");
        assert_eq!(a.sample(&b, 0.99).to_string(), "none");
        assert_eq!(a.sample(&b, 1.0).to_string(), "scale(2)");

        let px = AnimatedValue::parse("10px");
        let pct = AnimatedValue::parse("50%");
        assert!(!px.is_interpolable_with(&pct));
    }
}
