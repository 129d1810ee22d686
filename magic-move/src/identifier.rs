//! # Identifier 模块
//!
//! 从元素提取匹配标识符。
//!
//! 标识符来自两处：
//! - 以 `magic` 开头的类名标记（`magicCard` → `card`）
//! - `data-magic-ids` 属性（逗号分隔，可带或不带前缀）
//!
//! 结果统一小写、去前缀、去重。每次调用都重新读取元素状态，不做缓存。

use std::collections::BTreeSet;

use crate::element::{ElementId, attributes};
use crate::host::SceneHost;

/// 元素的标识符集合
pub type IdentifierSet = BTreeSet<String>;

/// 提取元素的标识符集合
pub fn identifiers_of<H: SceneHost + ?Sized>(host: &H, element: ElementId) -> IdentifierSet {
    let markers = host.class_markers(element);
    let attribute = host.attribute(element, attributes::IDS);
    collect_identifiers(&markers, attribute.as_deref())
}

/// 从类名标记与属性值收集标识符
pub fn collect_identifiers(markers: &[String], attribute: Option<&str>) -> IdentifierSet {
    let prefix = attributes::MARKER_PREFIX;
    let mut ids = IdentifierSet::new();

    for marker in markers {
        if marker.len() > prefix.len() && marker.starts_with(prefix) {
            ids.insert(marker[prefix.len()..].to_lowercase());
        }
    }

    if let Some(value) = attribute {
        for token in value.split(',') {
            let token = token.trim().to_lowercase();
            let token = match token.strip_prefix(prefix) {
                Some(rest) if !rest.is_empty() => rest.to_string(),
                _ => token,
            };
            if !token.is_empty() {
                ids.insert(token);
            }
        }
    }

    ids
}

/// 两个标识符集合是否相交
pub fn intersects(a: &IdentifierSet, b: &IdentifierSet) -> bool {
    // 集合通常只有一两个元素，直接遍历较小的一边
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().any(|id| large.contains(id))
}

/// 元素是否参与过渡
///
/// 有标识符，或带有进出场动画指令的元素都视为可参与过渡。
pub fn is_transition_eligible<H: SceneHost + ?Sized>(host: &H, element: ElementId) -> bool {
    !identifiers_of(host, element).is_empty()
        || [attributes::ANIMATION, attributes::ENTER, attributes::EXIT]
            .iter()
            .any(|name| {
                host.attribute(element, name)
                    .is_some_and(|v| !v.trim().is_empty())
            })
}

/// 根元素之下所有可参与过渡的元素（文档顺序）
pub fn eligible_descendants<H: SceneHost + ?Sized>(host: &H, root: ElementId) -> Vec<ElementId> {
    host.descendants(root)
        .into_iter()
        .filter(|&e| is_transition_eligible(host, e))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_marker_and_attribute_dedup() {
        let ids = collect_identifiers(&markers(&["magicFoo"]), Some("FOO, bar"));
        let expected: IdentifierSet = ["foo", "bar"].iter().map(|s| s.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_prefix_only_marker_is_ignored() {
        let ids = collect_identifiers(&markers(&["magic", "card", "magicCard"]), None);
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("card"));
    }

    #[test]
    fn test_attribute_prefix_stripped() {
        let ids = collect_identifiers(&[], Some(" magicHero ,, Title "));
        assert!(ids.contains("hero"));
        assert!(ids.contains("title"));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_empty() {
        assert!(collect_identifiers(&markers(&["button"]), None).is_empty());
        assert!(collect_identifiers(&[], Some("  ")).is_empty());
    }

    #[test]
    fn test_intersects() {
        let a: IdentifierSet = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let b: IdentifierSet = ["b", "c"].iter().map(|s| s.to_string()).collect();
        let c: IdentifierSet = ["c"].iter().map(|s| s.to_string()).collect();
        let d: IdentifierSet = ["a"].iter().map(|s| s.to_string()).collect();
        assert!(intersects(&a, &b));
        assert!(intersects(&b, &a));
        assert!(!intersects(&d, &c));
    }

    #[test]
    fn test_eligible_descendants() {
        use crate::test_support::MockHost;

        let mut host = MockHost::new();
        let root = host.add_scene("A");
        let plain = host.add_element(root, &["title"]);
        let card = host.add_element(plain, &["magicCard"]);
        let badge = host.add_element(root, &[]);
        host.set_attr(badge, attributes::ENTER, "opacity:0");
        let blank = host.add_element(root, &[]);
        host.set_attr(blank, attributes::EXIT, "  ");

        assert_eq!(eligible_descendants(&host, root), vec![card, badge]);
    }
}
