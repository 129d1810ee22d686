//! # Document 模块
//!
//! 内存中的场景文档，实现 [`SceneHost`]。
//!
//! ## 文档格式（JSON）
//!
//! ```text
//! {
//!   "current": "Intro",
//!   "layout": "phone",
//!   "animations": { "fadeAway": "opacity: 0" },
//!   "scenes": [
//!     { "name": "Intro", "root": { "classes": ["magicCard"], "style": { "left": "50px" } } },
//!     { "name": "Detail", "layouts": [ { "name": "phone", "width": 390, "height": 844, "root": { ... } } ] }
//!   ]
//! }
//! ```
//!
//! ## 旋转通道
//!
//! 旋转通道（`rotate` / `rotateX` / `rotateY` / `rotateZ`）作为独立样式键保存，单位为度。
//! 读取 `transform` 时与剩余 transform 组合；写入 `transform` 时重新拆分并覆盖所有通道。

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use magic_move::element::{ElementId, LayoutInfo, SceneActivation, SceneRole};
use magic_move::host::SceneHost;
use magic_move::property::{format_number, keywords, parse_numeric};
use magic_move::transform::{ROTATION_CHANNELS, compose, decompose};

use crate::error::{HeadlessError, HeadlessResult};

// ========== 文档描述（JSON） ==========

/// 元素节点描述
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSpec {
    /// 元素 id（供 `#id` 选择器使用）
    pub id: Option<String>,
    /// 类名标记
    pub classes: Vec<String>,
    /// 属性
    pub attributes: BTreeMap<String, String>,
    /// 内联样式
    pub style: BTreeMap<String, String>,
    /// 是否为包装容器
    pub wrapper: bool,
    /// 子元素
    pub children: Vec<NodeSpec>,
}

/// 布局描述
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSpec {
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub root: NodeSpec,
}

/// 场景描述：单一 `root` 或多个 `layouts`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSpec {
    pub name: String,
    #[serde(default)]
    pub root: Option<NodeSpec>,
    #[serde(default)]
    pub layouts: Vec<LayoutSpec>,
}

/// 文档描述
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSpec {
    /// 初始场景，缺省为第一个场景
    pub current: Option<String>,
    /// 当前布局名称
    pub layout: Option<String>,
    /// 具名动画（名称 → 内联属性）
    pub animations: BTreeMap<String, String>,
    pub scenes: Vec<SceneSpec>,
}

// ========== 运行时结构 ==========

#[derive(Debug, Clone, Default)]
struct Node {
    dom_id: Option<String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    wrapper: bool,
}

#[derive(Debug, Clone)]
struct Scene {
    name: String,
    layouts: Vec<LayoutInfo>,
    roots: Vec<ElementId>,
}

/// 内存场景文档
#[derive(Debug, Default)]
pub struct HeadlessDocument {
    nodes: Vec<Node>,
    scenes: Vec<Scene>,
    current: Option<String>,
    layout: Option<String>,
    animations: BTreeMap<String, String>,
    visible: HashMap<ElementId, bool>,
    roles: HashMap<ElementId, SceneRole>,
    native: HashMap<(ElementId, String), f64>,
    behaviors: Vec<String>,
    activations: Vec<(String, SceneActivation)>,
}

impl HeadlessDocument {
    /// 从描述构建文档
    pub fn from_spec(spec: DocumentSpec) -> HeadlessResult<Self> {
        let mut document = Self {
            layout: spec.layout,
            animations: spec.animations,
            ..Self::default()
        };

        for scene in spec.scenes {
            if document.scenes.iter().any(|s| s.name == scene.name) {
                return Err(HeadlessError::DuplicateScene(scene.name));
            }

            let layouts: Vec<LayoutSpec> = match (scene.root, scene.layouts) {
                (Some(root), layouts) if layouts.is_empty() => vec![LayoutSpec {
                    name: String::new(),
                    width: 0.0,
                    height: 0.0,
                    root,
                }],
                (None, layouts) if !layouts.is_empty() => layouts,
                _ => return Err(HeadlessError::InvalidScene(scene.name)),
            };

            let mut infos = Vec::new();
            let mut roots = Vec::new();
            for (index, layout) in layouts.into_iter().enumerate() {
                roots.push(document.insert_node(layout.root, None));
                infos.push(LayoutInfo {
                    name: layout.name,
                    width: layout.width,
                    height: layout.height,
                    index,
                });
            }
            document.scenes.push(Scene {
                name: scene.name,
                layouts: infos,
                roots,
            });
        }

        let current = match spec.current {
            Some(name) if document.scene(&name).is_none() => {
                return Err(HeadlessError::UnknownScene(name));
            }
            Some(name) => Some(name),
            None => document.scenes.first().map(|s| s.name.clone()),
        };
        if let Some(name) = &current {
            document.activate(name);
        }
        document.current = current;

        debug!(
            scenes = document.scenes.len(),
            elements = document.nodes.len(),
            "场景文档构建完成"
        );
        Ok(document)
    }

    /// 从 JSON 文本构建
    pub fn from_json(text: &str) -> HeadlessResult<Self> {
        let spec: DocumentSpec = serde_json::from_str(text)?;
        Self::from_spec(spec)
    }

    /// 从 JSON 文件加载
    pub fn load(path: impl AsRef<Path>) -> HeadlessResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    fn insert_node(&mut self, spec: NodeSpec, parent: Option<ElementId>) -> ElementId {
        let id = ElementId::new(self.nodes.len() as u64 + 1);
        self.nodes.push(Node {
            dom_id: spec.id,
            parent,
            classes: spec.classes,
            attributes: spec.attributes,
            wrapper: spec.wrapper,
            ..Node::default()
        });
        for (name, value) in spec.style {
            self.write_style(id, &name, Some(&value));
        }
        for child in spec.children {
            let child = self.insert_node(child, Some(id));
            if let Some(node) = self.node_mut(id) {
                node.children.push(child);
            }
        }
        id
    }

    fn node(&self, id: ElementId) -> Option<&Node> {
        let index = usize::try_from(id.0).ok()?.checked_sub(1)?;
        self.nodes.get(index)
    }

    fn node_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        let index = usize::try_from(id.0).ok()?.checked_sub(1)?;
        self.nodes.get_mut(index)
    }

    fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.name == name)
    }

    /// 显示场景在当前布局下的根元素，隐藏其余场景
    fn activate(&mut self, name: &str) {
        let Some(index) = self.layout_index_for(name) else {
            return;
        };
        let shown = self.scene_root(name, index);
        let roots: Vec<ElementId> = self.scenes.iter().flat_map(|s| s.roots.clone()).collect();
        for root in roots {
            self.visible.insert(root, Some(root) == shown);
        }
    }

    fn layout_index_for(&self, name: &str) -> Option<usize> {
        let scene = self.scene(name)?;
        let index = self
            .layout
            .as_deref()
            .and_then(|layout| scene.layouts.iter().position(|l| l.name == layout))
            .unwrap_or(0);
        Some(index)
    }

    fn write_style(&mut self, element: ElementId, name: &str, value: Option<&str>) {
        let Some(node) = self.node_mut(element) else {
            return;
        };
        if name == "transform" {
            for channel in ROTATION_CHANNELS {
                node.style.remove(channel);
            }
            match value {
                Some(value) => {
                    let decomposed = decompose(value);
                    for (channel, degrees) in decomposed.rotations {
                        node.style.insert(channel, format_number(degrees));
                    }
                    node.style.insert(name.to_string(), decomposed.residual);
                }
                None => {
                    node.style.remove(name);
                }
            }
            return;
        }

        match value {
            Some(value) => {
                node.style.insert(name.to_string(), value.to_string());
            }
            None => {
                node.style.remove(name);
            }
        }
    }

    // ========== 查询（测试与命令行使用） ==========

    /// 按 `#id` 查找元素
    pub fn element_by_id(&self, id: &str) -> Option<ElementId> {
        self.nodes
            .iter()
            .position(|n| n.dom_id.as_deref() == Some(id))
            .map(|index| ElementId::new(index as u64 + 1))
    }

    /// 元素的 `#id`
    pub fn dom_id(&self, element: ElementId) -> Option<&str> {
        self.node(element)?.dom_id.as_deref()
    }

    /// 元素的全部内联样式（`transform` 已组合旋转通道，通道键不单独列出）
    pub fn computed_style(&self, element: ElementId) -> BTreeMap<String, String> {
        let Some(node) = self.node(element) else {
            return BTreeMap::new();
        };
        let mut style: BTreeMap<String, String> = node
            .style
            .iter()
            .filter(|(name, _)| !ROTATION_CHANNELS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        if let Some(transform) = self.style_property(element, "transform") {
            style.insert("transform".to_string(), transform);
        }
        style
    }

    /// 文档声明的具名动画
    pub fn animations(&self) -> &BTreeMap<String, String> {
        &self.animations
    }

    /// 已触发的行为
    pub fn behaviors(&self) -> &[String] {
        &self.behaviors
    }

    /// 场景激活记录
    pub fn activations(&self) -> &[(String, SceneActivation)] {
        &self.activations
    }

    /// 场景根元素的角色
    pub fn role(&self, root: ElementId) -> Option<SceneRole> {
        self.roles.get(&root).copied()
    }

    /// 场景根元素是否可见
    pub fn is_visible(&self, root: ElementId) -> bool {
        self.visible.get(&root).copied().unwrap_or(false)
    }

    /// 切换当前布局
    pub fn set_layout(&mut self, layout: Option<String>) {
        self.layout = layout;
    }
}

impl SceneHost for HeadlessDocument {
    fn scene_names(&self) -> Vec<String> {
        self.scenes.iter().map(|s| s.name.clone()).collect()
    }

    fn current_scene_name(&self) -> Option<String> {
        self.current.clone()
    }

    fn current_layout_name(&self) -> Option<String> {
        self.layout.clone()
    }

    fn layouts_for_scene(&self, scene: &str) -> Vec<LayoutInfo> {
        self.scene(scene)
            .map(|s| s.layouts.clone())
            .unwrap_or_default()
    }

    fn scene_root(&self, scene: &str, layout_index: usize) -> Option<ElementId> {
        self.scene(scene)?.roots.get(layout_index).copied()
    }

    fn show_scene(&mut self, scene: &str, activation: SceneActivation) {
        debug!(scene = %scene, activation = ?activation, "激活场景");
        if activation == SceneActivation::Instant {
            self.activate(scene);
        }
        self.current = Some(scene.to_string());
        self.activations.push((scene.to_string(), activation));
    }

    fn set_scene_visible(&mut self, root: ElementId, visible: bool) {
        self.visible.insert(root, visible);
    }

    fn set_scene_role(&mut self, root: ElementId, role: SceneRole) {
        self.roles.insert(root, role);
    }

    fn scene_opacity(&self, root: ElementId) -> f64 {
        self.style_property(root, "opacity")
            .and_then(|v| parse_numeric(&v).map(|(n, _)| n))
            .unwrap_or(1.0)
    }

    fn trigger_behavior(&mut self, name: &str) {
        trace!(behavior = %name, "触发行为");
        self.behaviors.push(name.to_string());
    }

    fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self
            .node(root)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.node(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.node(element)?.parent
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.node(element)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn class_markers(&self, element: ElementId) -> Vec<String> {
        self.node(element)
            .map(|n| n.classes.clone())
            .unwrap_or_default()
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.node(element)?.attributes.get(name).cloned()
    }

    fn is_wrapper_container(&self, element: ElementId) -> bool {
        self.node(element).is_some_and(|n| n.wrapper)
    }

    /// 支持 `.class` 与 `#id`
    fn select(&self, selector: &str) -> Vec<ElementId> {
        let selector = selector.trim();
        let matches = |node: &Node| {
            if let Some(class) = selector.strip_prefix('.') {
                node.classes.iter().any(|c| c == class)
            } else if let Some(id) = selector.strip_prefix('#') {
                node.dom_id.as_deref() == Some(id)
            } else {
                false
            }
        };
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| matches(node))
            .map(|(index, _)| ElementId::new(index as u64 + 1))
            .collect()
    }

    fn style_property(&self, element: ElementId, name: &str) -> Option<String> {
        let node = self.node(element)?;
        if name != "transform" {
            return node.style.get(name).cloned();
        }

        let rotations: Vec<(&str, f64)> = ROTATION_CHANNELS
            .iter()
            .filter_map(|&channel| {
                let value = node.style.get(channel)?;
                parse_numeric(value).map(|(degrees, _)| (channel, degrees))
            })
            .collect();
        let residual = node.style.get("transform");
        if rotations.is_empty() {
            return residual.cloned();
        }
        Some(compose(
            residual.map(String::as_str).unwrap_or(keywords::NONE),
            rotations,
        ))
    }

    fn set_style_property(&mut self, element: ElementId, name: &str, value: Option<&str>) {
        self.write_style(element, name, value);
    }

    fn element_property(&self, element: ElementId, name: &str) -> Option<f64> {
        self.native.get(&(element, name.to_string())).copied()
    }

    fn set_element_property(
        &mut self,
        element: ElementId,
        name: &str,
        value: f64,
        animation: Option<(f64, &str)>,
    ) {
        debug!(element = %element, property = %name, value, animation = ?animation, "写入原生属性");
        self.native.insert((element, name.to_string()), value);
    }
}
