//! # Element 模块
//!
//! 场景图中元素与场景的引用类型。
//!
//! 核心不持有元素本身，只持有宿主分配的句柄（[`ElementId`]）。
//! 所有缓存都以句柄为键，场景销毁时由宿主通知回收。

use serde::{Deserialize, Serialize};

/// 元素句柄
///
/// 由宿主在元素首次出现时分配，在元素生命周期内保持稳定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl ElementId {
    /// 创建新的元素句柄
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 场景布局信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInfo {
    /// 布局名称
    pub name: String,
    /// 布局宽度
    pub width: f64,
    /// 布局高度
    pub height: f64,
    /// 布局序号
    pub index: usize,
}

/// 已解析的场景引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneRef {
    /// 场景名称
    pub name: String,
    /// 选用的布局序号
    pub layout_index: usize,
    /// 场景根元素
    pub root: ElementId,
}

/// 场景在过渡中的角色
///
/// 由渲染层直接消费，决定场景的可见性与叠放方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SceneRole {
    /// 正在离开的场景
    Outgoing,
    /// 正在进入的场景
    Incoming,
    /// 未参与过渡
    #[default]
    Settled,
}

/// 宿主场景激活方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneActivation {
    /// 立即切换
    Instant,
    /// 交叉淡化切换
    Crossfade {
        /// 淡化时长（秒）
        duration: f64,
    },
}

/// 元素属性名与约定前缀
///
/// 这是核心读取的所有元素属性名的**唯一来源**。
pub mod attributes {
    /// 类名标记前缀（如 `magicCard`）
    pub const MARKER_PREFIX: &str = "magic";
    /// 逗号分隔的多标识符属性
    pub const IDS: &str = "data-magic-ids";
    /// 延迟（系数、百分比、绝对时间或 `target`）
    pub const DELAY: &str = "data-magic-delay";
    /// 时长（系数、百分比、绝对时间或 `target`）
    pub const DURATION: &str = "data-magic-duration";
    /// 缓动覆盖
    pub const EASE: &str = "data-magic-ease";
    /// 叠放指令（`front` / `back` / 数值 / `target`）
    pub const ORDER: &str = "data-magic-order";
    /// 进出场通用动画指令
    pub const ANIMATION: &str = "data-magic-animation";
    /// 进场动画指令
    pub const ENTER: &str = "data-magic-enter";
    /// 离场动画指令
    pub const EXIT: &str = "data-magic-exit";
    /// 继承匹配对象属性值的标记
    pub const INHERIT_MARKER: &str = "target";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_id() {
        let a = ElementId::new(3);
        let b = ElementId::new(3);
        assert_eq!(a, b);
        assert_eq!(a.value(), 3);
        assert_eq!(a.to_string(), "#3");
    }

    #[test]
    fn test_scene_role_default() {
        assert_eq!(SceneRole::default(), SceneRole::Settled);
    }
}
