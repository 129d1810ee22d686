//! # Z-Order 模块
//!
//! 过渡期间的叠放顺序调整。
//!
//! 解析出的 z-index 只在过渡期间生效，所在子时间轴完成时移除。

use crate::element::{ElementId, attributes};
use crate::host::SceneHost;

/// z-index 样式名
pub const Z_INDEX: &str = "z-index";

/// 叠放指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZDirective {
    /// 置于所有兄弟元素之上
    Front,
    /// 置于所有兄弟元素之下
    Back,
    /// 绝对 z-index
    Value(i64),
    /// 继承匹配对象的指令
    Target,
}

impl ZDirective {
    /// 解析叠放指令
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("front") {
            Some(Self::Front)
        } else if text.eq_ignore_ascii_case("back") {
            Some(Self::Back)
        } else if text.eq_ignore_ascii_case(attributes::INHERIT_MARKER) {
            Some(Self::Target)
        } else {
            text.parse::<i64>().ok().map(Self::Value)
        }
    }

    /// 解析 `Target`：取匹配对象的指令；对方没有或同样是 `Target` 时不调整
    pub fn inherit(self, partner: Option<ZDirective>) -> Option<ZDirective> {
        match self {
            Self::Target => partner.filter(|d| *d != Self::Target),
            directive => Some(directive),
        }
    }
}

/// 读取元素的叠放指令
pub fn directive_of<H: SceneHost + ?Sized>(host: &H, element: ElementId) -> Option<ZDirective> {
    host.attribute(element, attributes::ORDER)
        .as_deref()
        .and_then(ZDirective::parse)
}

/// 实际承载 z-index 的元素
///
/// 父元素是宿主的布局包装容器时调整父元素，使整个定位单元一起移动。
pub fn stacking_element<H: SceneHost + ?Sized>(host: &H, element: ElementId) -> ElementId {
    match host.parent(element) {
        Some(parent) if host.is_wrapper_container(parent) => parent,
        _ => element,
    }
}

/// 元素当前的 z-index（未设置或非数值按 0 处理）
fn z_index_of<H: SceneHost + ?Sized>(host: &H, element: ElementId) -> i64 {
    host.style_property(element, Z_INDEX)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(0)
}

/// 计算 z-index
///
/// `element` 应为 [`stacking_element`] 的结果。`Target` 无法单独解析，返回 `None`。
pub fn resolve_z_index<H: SceneHost + ?Sized>(
    host: &H,
    element: ElementId,
    directive: ZDirective,
) -> Option<i64> {
    let siblings = || {
        host.parent(element)
            .map(|parent| host.children(parent))
            .unwrap_or_default()
            .into_iter()
            .filter(move |s| *s != element)
            .map(move |s| z_index_of(host, s))
    };

    match directive {
        ZDirective::Value(value) => Some(value),
        ZDirective::Front => Some(siblings().max().unwrap_or(0) + 1),
        ZDirective::Back => Some(siblings().min().unwrap_or(0) - 1),
        ZDirective::Target => None,
    }
}
