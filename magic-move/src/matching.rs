//! # Matching 模块
//!
//! 按标识符把源场景与目标场景的元素配对。
//!
//! ## 冲突策略
//!
//! 一个元素可能与对侧多个元素共享标识符。按源元素的文档顺序遍历、
//! 每个源元素再按目标元素的文档顺序遍历，**后出现的候选对胜出**；
//! 被挤掉的候选对记入 `abandoned`，调用方在创建胜出对的补间之前
//! 终止两侧元素上已有的补间。

use std::collections::HashMap;

use crate::element::{ElementId, attributes};
use crate::host::SceneHost;
use crate::identifier::{IdentifierSet, identifiers_of, intersects};

/// 配对结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// 配对（源元素, 目标元素），按配对建立顺序
    pub pairs: Vec<(ElementId, ElementId)>,
    /// 被后来者挤掉的候选对
    pub abandoned: Vec<(ElementId, ElementId)>,
    /// 没有配对的源元素
    pub source_only: Vec<ElementId>,
    /// 没有配对的目标元素
    pub target_only: Vec<ElementId>,
}

impl MatchResult {
    /// 目标元素的配对源元素
    pub fn source_of(&self, target: ElementId) -> Option<ElementId> {
        self.pairs.iter().find(|(_, t)| *t == target).map(|(s, _)| *s)
    }

    /// 源元素的配对目标元素
    pub fn target_of(&self, source: ElementId) -> Option<ElementId> {
        self.pairs.iter().find(|(s, _)| *s == source).map(|(_, t)| *t)
    }
}

/// 配对两侧元素
pub fn match_elements<H: SceneHost + ?Sized>(
    host: &H,
    source: &[ElementId],
    target: &[ElementId],
) -> MatchResult {
    let source_ids: Vec<(ElementId, IdentifierSet)> =
        source.iter().map(|&e| (e, identifiers_of(host, e))).collect();
    let target_ids: Vec<(ElementId, IdentifierSet)> =
        target.iter().map(|&e| (e, identifiers_of(host, e))).collect();
    match_identifier_sets(&source_ids, &target_ids)
}

/// 按预先提取的标识符集合配对
pub fn match_identifier_sets(
    source: &[(ElementId, IdentifierSet)],
    target: &[(ElementId, IdentifierSet)],
) -> MatchResult {
    let mut pairs: Vec<(ElementId, ElementId)> = Vec::new();
    let mut abandoned = Vec::new();
    // 元素 → 所在配对的下标
    let mut by_source: HashMap<ElementId, usize> = HashMap::new();
    let mut by_target: HashMap<ElementId, usize> = HashMap::new();
    let mut live: Vec<bool> = Vec::new();

    for (s, s_ids) in source {
        if s_ids.is_empty() {
            continue;
        }
        for (t, t_ids) in target {
            if !intersects(s_ids, t_ids) {
                continue;
            }

            for index in [by_source.get(s).copied(), by_target.get(t).copied()]
                .into_iter()
                .flatten()
            {
                if live[index] {
                    live[index] = false;
                    abandoned.push(pairs[index]);
                }
            }

            let index = pairs.len();
            pairs.push((*s, *t));
            live.push(true);
            by_source.insert(*s, index);
            by_target.insert(*t, index);
        }
    }

    let pairs: Vec<(ElementId, ElementId)> = pairs
        .into_iter()
        .zip(live)
        .filter_map(|(pair, alive)| alive.then_some(pair))
        .collect();

    let source_only = source
        .iter()
        .map(|(e, _)| *e)
        .filter(|e| !pairs.iter().any(|(s, _)| s == e))
        .collect();
    let target_only = target
        .iter()
        .map(|(e, _)| *e)
        .filter(|e| !pairs.iter().any(|(_, t)| t == e))
        .collect();

    MatchResult {
        pairs,
        abandoned,
        source_only,
        target_only,
    }
}

/// 未配对元素的进出方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedSide {
    /// 只在目标场景出现：进场
    Enter,
    /// 只在源场景出现：离场
    Exit,
}

impl UnmatchedSide {
    /// 该方向专用的指令属性
    pub fn attribute(&self) -> &'static str {
        match self {
            Self::Enter => attributes::ENTER,
            Self::Exit => attributes::EXIT,
        }
    }
}

/// 读取未配对元素的动画指令
///
/// 优先读取方向专用属性，其次读取通用的 `data-magic-animation`。空白值视为缺失。
pub fn unmatched_directive<H: SceneHost + ?Sized>(
    host: &H,
    element: ElementId,
    side: UnmatchedSide,
) -> Option<String> {
    [side.attribute(), attributes::ANIMATION]
        .into_iter()
        .filter_map(|name| host.attribute(element, name))
        .find(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> IdentifierSet {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn el(n: u64) -> ElementId {
        ElementId::new(n)
    }

    #[test]
    fn test_intersecting_sets_pair() {
        let result = match_identifier_sets(
            &[(el(1), ids(&["a", "b"]))],
            &[(el(2), ids(&["b", "c"]))],
        );
        assert_eq!(result.pairs, vec![(el(1), el(2))]);
        assert!(result.source_only.is_empty());
        assert!(result.target_only.is_empty());
    }

    #[test]
    fn test_disjoint_sets_do_not_pair() {
        let result = match_identifier_sets(&[(el(1), ids(&["a"]))], &[(el(2), ids(&["c"]))]);
        assert!(result.pairs.is_empty());
        assert_eq!(result.source_only, vec![el(1)]);
        assert_eq!(result.target_only, vec![el(2)]);
    }

    #[test]
    fn test_last_source_wins() {
        let s1 = el(1);
        let s2 = el(2);
        let t = el(3);
        let result = match_identifier_sets(
            &[(s1, ids(&["card"])), (s2, ids(&["card", "x"]))],
            &[(t, ids(&["card"]))],
        );
        assert_eq!(result.pairs, vec![(s2, t)]);
        assert_eq!(result.abandoned, vec![(s1, t)]);
        assert_eq!(result.source_only, vec![s1]);
    }

    #[test]
    fn test_last_target_wins_for_one_source() {
        let s = el(1);
        let result = match_identifier_sets(
            &[(s, ids(&["a", "b"]))],
            &[(el(2), ids(&["a"])), (el(3), ids(&["b"]))],
        );
        assert_eq!(result.pairs, vec![(s, el(3))]);
        assert_eq!(result.abandoned, vec![(s, el(2))]);
        assert_eq!(result.target_only, vec![el(2)]);
        assert_eq!(result.target_of(s), Some(el(3)));
        assert_eq!(result.source_of(el(3)), Some(s));
    }

    #[test]
    fn test_elements_without_identifiers_are_unmatched() {
        let result = match_identifier_sets(
            &[(el(1), IdentifierSet::new())],
            &[(el(2), IdentifierSet::new())],
        );
        assert!(result.pairs.is_empty());
        assert_eq!(result.source_only, vec![el(1)]);
        assert_eq!(result.target_only, vec![el(2)]);
    }

    #[test]
    fn test_match_elements_reads_host() {
        use crate::test_support::MockHost;

        let mut host = MockHost::new();
        let a = host.add_scene("A");
        let b = host.add_scene("B");
        let card_a = host.add_element(a, &["magicCard"]);
        let card_b = host.add_element(b, &[]);
        host.set_attr(card_b, crate::element::attributes::IDS, "magicCARD");

        let result = match_elements(&host, &[card_a], &[card_b]);
        assert_eq!(result.pairs, vec![(card_a, card_b)]);
    }

    #[test]
    fn test_unmatched_directive_prefers_side_attribute() {
        use crate::test_support::MockHost;

        let mut host = MockHost::new();
        let root = host.add_scene("A");
        let e = host.add_element(root, &[]);
        assert_eq!(unmatched_directive(&host, e, UnmatchedSide::Enter), None);

        host.set_attr(e, attributes::ANIMATION, "fade");
        host.set_attr(e, attributes::ENTER, " ");
        assert_eq!(
            unmatched_directive(&host, e, UnmatchedSide::Enter).as_deref(),
            Some("fade")
        );

        host.set_attr(e, attributes::EXIT, "left: -50px");
        assert_eq!(
            unmatched_directive(&host, e, UnmatchedSide::Exit).as_deref(),
            Some("left: -50px")
        );
    }
}
