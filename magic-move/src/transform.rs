//! # Transform 模块
//!
//! 拆分复合 transform 字符串中的旋转通道。
//!
//! 旋转函数（`rotate` / `rotateX` / `rotateY` / `rotateZ`）被提取为独立的角度通道，
//! 其余函数（平移、缩放等）保留在剩余字符串中交给补间服务原生插值。
//!
//! 旋转按字面角度差补间，不折算最短路径：10° → 380° 走 `+=370`。

use std::collections::BTreeMap;

use crate::property::{PropertyMap, format_number, keywords, parse_numeric};

/// 旋转通道名（按输出顺序）
pub const ROTATION_CHANNELS: [&str; 4] = ["rotate", "rotateX", "rotateY", "rotateZ"];

/// 拆分结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecomposedTransform {
    /// 旋转通道 → 角度（度）
    pub rotations: BTreeMap<String, f64>,
    /// 去掉旋转函数后的剩余 transform；为空时为 `none`
    pub residual: String,
}

/// 把 CSS 函数名映射到规范的旋转通道名
fn rotation_channel(name: &str) -> Option<&'static str> {
    ROTATION_CHANNELS
        .iter()
        .copied()
        .find(|channel| channel.eq_ignore_ascii_case(name))
}

/// 角度换算为度
fn angle_in_degrees(text: &str) -> Option<f64> {
    let (value, unit) = parse_numeric(text)?;
    match unit.to_ascii_lowercase().as_str() {
        "" | "deg" => Some(value),
        "rad" => Some(value.to_degrees()),
        "turn" => Some(value * 360.0),
        "grad" => Some(value * 0.9),
        _ => None,
    }
}

/// 切分出 `name(args)` 形式的函数调用
///
/// 括号不配对时剩余部分整体作为一个片段。
fn split_functions(text: &str) -> Vec<(&str, &str, &str)> {
    let mut out = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        let Some(open) = rest.find('(') else {
            out.push((rest, "", rest));
            break;
        };

        let mut depth = 0usize;
        let mut close = None;
        for (i, c) in rest[open..].char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(open + i);
                        break;
                    }
                }
                _ => {}
            }
        }

        let Some(close) = close else {
            out.push((rest, "", rest));
            break;
        };

        let whole = &rest[..=close];
        out.push((rest[..open].trim(), &rest[open + 1..close], whole));
        rest = rest[close + 1..].trim_start();
    }

    out
}

/// 拆分 transform 字符串
pub fn decompose(transform: &str) -> DecomposedTransform {
    let mut rotations: BTreeMap<String, f64> = BTreeMap::new();
    let mut residual = Vec::new();

    let text = transform.trim();
    if !text.is_empty() && !text.eq_ignore_ascii_case(keywords::NONE) {
        for (name, args, whole) in split_functions(text) {
            let angle = rotation_channel(name).and_then(|channel| {
                angle_in_degrees(args).map(|degrees| (channel, degrees))
            });
            match angle {
                Some((channel, degrees)) => {
                    *rotations.entry(channel.to_string()).or_insert(0.0) += degrees;
                }
                None => residual.push(whole),
            }
        }
    }

    let residual = if residual.is_empty() {
        keywords::NONE.to_string()
    } else {
        residual.join(" ")
    };

    DecomposedTransform {
        rotations,
        residual,
    }
}

/// 由剩余 transform 与旋转通道重新组合 transform 字符串
pub fn compose<'a>(
    residual: &str,
    rotations: impl IntoIterator<Item = (&'a str, f64)>,
) -> String {
    let mut parts = Vec::new();
    let residual = residual.trim();
    if !residual.is_empty() && !residual.eq_ignore_ascii_case(keywords::NONE) {
        parts.push(residual.to_string());
    }

    let rotations: BTreeMap<&str, f64> = rotations.into_iter().collect();
    for channel in ROTATION_CHANNELS {
        if let Some(degrees) = rotations.get(channel) {
            parts.push(format!("{}({}deg)", channel, format_number(*degrees)));
        }
    }

    if parts.is_empty() {
        keywords::NONE.to_string()
    } else {
        parts.join(" ")
    }
}

/// 把两侧 `transform` 拆成剩余字符串与旋转通道
///
/// 每个在任一侧出现的旋转通道：起点写入起始角度，终点写入 `+=delta`；
/// 角度差为 0 的通道不单独补间，角度留在两侧的剩余 transform 中。
/// 两侧都没有 `transform` 时不做处理。
pub fn rotation_channels(from: &mut PropertyMap, to: &mut PropertyMap) {
    if !from.contains("transform") && !to.contains("transform") {
        return;
    }

    let source = decompose(from.get("transform").unwrap_or(keywords::NONE));
    let target = decompose(to.get("transform").unwrap_or(keywords::NONE));

    let mut unchanged = Vec::new();
    for channel in ROTATION_CHANNELS {
        let start = source.rotations.get(channel).copied();
        let end = target.rotations.get(channel).copied();
        if start.is_none() && end.is_none() {
            continue;
        }

        let start = start.unwrap_or(0.0);
        let delta = end.unwrap_or(0.0) - start;
        if delta == 0.0 {
            from.remove(channel);
            to.remove(channel);
            if start != 0.0 {
                unchanged.push((channel, start));
            }
            continue;
        }

        from.insert(channel, format_number(start));
        let step = if delta < 0.0 {
            format!("-={}", format_number(-delta))
        } else {
            format!("+={}", format_number(delta))
        };
        to.insert(channel, step);
    }

    // 写入 transform 会清空旋转通道，未变化的角度必须随剩余字符串一起写回
    from.insert(
        "transform",
        compose(&source.residual, unchanged.iter().copied()),
    );
    to.insert("transform", compose(&target.residual, unchanged));
}

/// 两侧都为 `auto` 的宽高从两侧移除
pub fn elide_auto_dimensions(from: &mut PropertyMap, to: &mut PropertyMap) {
    for name in ["width", "height"] {
        let both_auto = [from.get(name), to.get(name)]
            .iter()
            .all(|v| v.is_some_and(|v| v.trim().eq_ignore_ascii_case(keywords::AUTO)));
        if both_auto {
            from.remove(name);
            to.remove(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> PropertyMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_decompose_extracts_rotations() {
        let d = decompose("translateX(10px) rotate(45deg) scale(2) rotateY(0.5turn)");
        assert_eq!(d.rotations.get("rotate"), Some(&45.0));
        assert_eq!(d.rotations.get("rotateY"), Some(&180.0));
        assert_eq!(d.residual, "translateX(10px) scale(2)");
    }

    #[test]
    fn test_decompose_units_and_case() {
        let d = decompose("ROTATEZ(100grad) rotateX(3.141592653589793rad)");
        assert!((d.rotations["rotateZ"] - 90.0).abs() < 1e-9);
        assert!((d.rotations["rotateX"] - 180.0).abs() < 1e-9);
        assert_eq!(d.residual, "none");
    }

    #[test]
    fn test_decompose_none_and_empty() {
        assert_eq!(decompose("none").residual, "none");
        assert!(decompose("").rotations.is_empty());
    }

    #[test]
    fn test_decompose_keeps_rotate3d_and_nested_parens() {
        let d = decompose("rotate3d(1, 1, 0, 45deg) translate(calc(10px + 5%), 0)");
        assert!(d.rotations.is_empty());
        assert_eq!(d.residual, "rotate3d(1, 1, 0, 45deg) translate(calc(10px + 5%), 0)");
    }

    #[test]
    fn test_compose() {
        let s = compose("scale(2)", [("rotateZ", 30.0), ("rotate", 10.0)]);
        assert_eq!(s, "scale(2) rotate(10deg) rotateZ(30deg)");
        assert_eq!(compose("none", []), "none");
    }

    #[test]
    fn test_rotation_uses_literal_delta() {
        let mut from = map(&[("transform", "rotate(10deg)")]);
        let mut to = map(&[("transform", "rotate(380deg)")]);
        rotation_channels(&mut from, &mut to);

        assert_eq!(from.get("rotate"), Some("10"));
        assert_eq!(to.get("rotate"), Some("+=370"));
        assert_eq!(from.get("transform"), Some("none"));
        assert_eq!(to.get("transform"), Some("none"));
    }

    #[test]
    fn test_rotation_negative_delta_and_missing_side() {
        let mut from = map(&[("transform", "rotateX(90deg) scale(1)")]);
        let mut to = map(&[("transform", "scale(2)")]);
        rotation_channels(&mut from, &mut to);

        assert_eq!(from.get("rotateX"), Some("90"));
        assert_eq!(to.get("rotateX"), Some("-=90"));
        assert_eq!(from.get("transform"), Some("scale(1)"));
        assert_eq!(to.get("transform"), Some("scale(2)"));
    }

    #[test]
    fn test_unchanged_rotation_stays_in_residual() {
        let mut from = map(&[("transform", "rotate(20deg)")]);
        let mut to = map(&[("transform", "rotate(20deg) translateY(4px)")]);
        rotation_channels(&mut from, &mut to);

        assert!(!from.contains("rotate"));
        assert!(!to.contains("rotate"));
        assert_eq!(from.get("transform"), Some("rotate(20deg)"));
        assert_eq!(to.get("transform"), Some("translateY(4px) rotate(20deg)"));
    }

    #[test]
    fn test_unchanged_channel_stays_beside_animated_channel() {
        let mut from = map(&[("transform", "rotateX(30deg) rotate(10deg)")]);
        let mut to = map(&[("transform", "rotateX(30deg) rotate(40deg)")]);
        rotation_channels(&mut from, &mut to);

        assert_eq!(from.get("rotate"), Some("10"));
        assert_eq!(to.get("rotate"), Some("+=30"));
        assert!(!to.contains("rotateX"));
        assert_eq!(from.get("transform"), Some("rotateX(30deg)"));
        assert_eq!(to.get("transform"), Some("rotateX(30deg)"));
    }

    #[test]
    fn test_elide_auto_dimensions() {
        let mut from = map(&[("width", "auto"), ("height", "auto"), ("left", "0px")]);
        let mut to = map(&[("width", "AUTO"), ("height", "40px"), ("left", "5px")]);
        elide_auto_dimensions(&mut from, &mut to);

        assert!(!from.contains("width") && !to.contains("width"));
        assert_eq!(from.get("height"), Some("auto"));
        assert_eq!(to.get("height"), Some("40px"));
    }
}
