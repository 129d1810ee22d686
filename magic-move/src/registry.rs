//! # Registry 模块
//!
//! 具名动画注册表。
//!
//! 名称大小写不敏感；同名注册后者覆盖前者。

use std::collections::HashMap;

use tracing::debug;

use crate::property::PropertyMap;

/// 待注册的动画
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationSpec {
    /// 已解析的属性集合
    Map(PropertyMap),
    /// 内联语法 `key:value; key:value`
    Inline(String),
}

impl AnimationSpec {
    /// 转换为属性集合
    pub fn into_map(self) -> PropertyMap {
        match self {
            Self::Map(map) => map,
            Self::Inline(text) => PropertyMap::parse_inline(&text),
        }
    }
}

impl From<PropertyMap> for AnimationSpec {
    fn from(map: PropertyMap) -> Self {
        Self::Map(map)
    }
}

impl From<&str> for AnimationSpec {
    fn from(text: &str) -> Self {
        Self::Inline(text.to_string())
    }
}

impl From<String> for AnimationSpec {
    fn from(text: String) -> Self {
        Self::Inline(text)
    }
}

/// 具名动画注册表
#[derive(Debug, Clone, Default)]
pub struct AnimationRegistry {
    entries: HashMap<String, PropertyMap>,
}

impl AnimationRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册动画
    pub fn register(&mut self, name: &str, spec: impl Into<AnimationSpec>) {
        let map = spec.into().into_map();
        debug!(name = %name, properties = %map, "注册动画");
        self.entries.insert(name.trim().to_lowercase(), map);
    }

    /// 查找动画
    pub fn lookup(&self, name: &str) -> Option<&PropertyMap> {
        self.entries.get(&name.trim().to_lowercase())
    }

    /// 已注册数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 解析元素上的动画指令
    ///
    /// 含冒号的指令按内联语法解析，否则按名称查找注册表。
    /// 空指令或未注册的名称返回 `None`。
    pub fn resolve_directive(&self, directive: &str) -> Option<PropertyMap> {
        let directive = directive.trim();
        if directive.is_empty() {
            return None;
        }
        if directive.contains(':') {
            return Some(PropertyMap::parse_inline(directive));
        }
        self.lookup(directive).cloned()
    }
}
