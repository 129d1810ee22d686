//! # Property 模块
//!
//! 属性集合与属性值的解析辅助。
//!
//! 属性值保持字符串形式（`"50px"`、`"auto"`、`"rotate(10deg) scale(2)"`），
//! 具体插值由补间服务负责；核心只在需要时提取数值部分。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::transform::ROTATION_CHANNELS;

/// 规范化属性名：旋转通道大小写不敏感地映射到规范名，其余转为小写
fn canonical_name(key: &str) -> String {
    let key = key.trim();
    ROTATION_CHANNELS
        .iter()
        .find(|channel| channel.eq_ignore_ascii_case(key))
        .map(|channel| channel.to_string())
        .unwrap_or_else(|| key.to_lowercase())
}

/// 属性集合
///
/// 属性名到属性值的有序映射。有序保证了日志与快照输出稳定。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyMap(BTreeMap<String, String>);

impl PropertyMap {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析内联动画语法 `key:value; key:value`
    ///
    /// 格式错误的片段（缺少冒号、键或值为空）被静默跳过。
    /// 键统一转为小写，旋转通道名保留规范写法（`rotateZ`）。
    pub fn parse_inline(text: &str) -> Self {
        let mut map = Self::new();
        for token in text.split(';') {
            let Some((key, value)) = token.split_once(':') else {
                continue;
            };
            let key = canonical_name(key);
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                continue;
            }
            map.insert(key, value);
        }
        map
    }

    /// 插入属性
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    /// 读取属性
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// 移除属性
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    /// 是否包含属性
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// 属性数量
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 遍历属性
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 所有属性名
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// 只保留给定名称的属性
    pub fn retain_names(&mut self, names: &[&str]) {
        self.0.retain(|k, _| names.contains(&k.as_str()));
    }

    /// 按条件保留属性
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.0.retain(|k, v| keep(k, v));
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl std::fmt::Display for PropertyMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}:{}", key, value)?;
            first = false;
        }
        Ok(())
    }
}

/// 属性值关键字
pub mod keywords {
    pub const AUTO: &str = "auto";
    pub const INHERIT: &str = "inherit";
    pub const NONE: &str = "none";
}

/// 提取数值前缀与单位后缀
///
/// `"50px"` → `(50.0, "px")`，`"-1.5"` → `(-1.5, "")`，`"auto"` → `None`。
pub fn parse_numeric(value: &str) -> Option<(f64, &str)> {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|&(i, c)| {
            let numeric = c.is_ascii_digit()
                || c == '.'
                || (matches!(c, '-' | '+') && (i == 0 || value[..i].ends_with('e')))
                || (c == 'e' && i > 0 && looks_like_exponent(value, i));
            !numeric
        })
        .map(|(i, _)| i)
        .unwrap_or(value.len());

    let number = value[..end].parse::<f64>().ok()?;
    Some((number, value[end..].trim()))
}

/// `e` 后跟数字或符号时视为科学计数法
fn looks_like_exponent(value: &str, index: usize) -> bool {
    value[index + 1..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '+')
}

/// 格式化数值（去除多余的小数位）
pub fn format_number(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 {
        // 避免输出 "-0"
        return "0".to_string();
    }
    format!("{}", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inline() {
        let map = PropertyMap::parse_inline("opacity: 0; Left:100px;");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("opacity"), Some("0"));
        assert_eq!(map.get("left"), Some("100px"));
    }

    #[test]
    fn test_parse_inline_keeps_rotation_channel_case() {
        let map = PropertyMap::parse_inline("rotateZ: 90; ROTATEX: 10; Rotate: 5");
        assert_eq!(map.get("rotateZ"), Some("90"));
        assert_eq!(map.get("rotateX"), Some("10"));
        assert_eq!(map.get("rotate"), Some("5"));
        assert!(!map.contains("rotatez"));
    }

    #[test]
    fn test_parse_inline_skips_malformed_tokens() {
        let map = PropertyMap::parse_inline("opacity; :5; top:; width: 10px; garbage");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("width"), Some("10px"));
    }

    #[test]
    fn test_parse_inline_keeps_colons_in_value() {
        let map = PropertyMap::parse_inline("background-image: url(http://x/y.png)");
        assert_eq!(map.get("background-image"), Some("url(http://x/y.png)"));
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric("50px"), Some((50.0, "px")));
        assert_eq!(parse_numeric("-1.5"), Some((-1.5, "")));
        assert_eq!(parse_numeric(" 10deg "), Some((10.0, "deg")));
        assert_eq!(parse_numeric("+=370"), None);
        assert_eq!(parse_numeric("auto"), None);
        assert_eq!(parse_numeric("1e3ms"), Some((1000.0, "ms")));
        assert_eq!(parse_numeric("2em"), Some((2.0, "em")));
        assert_eq!(parse_numeric("5e-1"), Some((0.5, "")));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(200.0), "200");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1.0 / 3.0), "0.3333");
    }

    #[test]
    fn test_display() {
        let map: PropertyMap = [("top", "1px"), ("left", "2px")].into_iter().collect();
        insta::assert_snapshot!(map.to_string(), @"left:2px; top:1px");
    }
}
