//! 单元测试用的内存宿主与记录型补间服务。

use std::collections::HashMap;

use crate::element::{ElementId, LayoutInfo, SceneActivation, SceneRole};
use crate::error::TweenError;
use crate::host::SceneHost;
use crate::property::parse_numeric;
use crate::tween::{TweenEvent, TweenId, TweenService, TweenSpec};

#[derive(Debug, Default, Clone)]
pub(crate) struct MockElement {
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub classes: Vec<String>,
    pub attributes: HashMap<String, String>,
    pub style: HashMap<String, String>,
    pub wrapper: bool,
}

#[derive(Debug, Default)]
pub(crate) struct MockHost {
    pub elements: HashMap<ElementId, MockElement>,
    pub scenes: Vec<(String, ElementId)>,
    pub current: Option<String>,
    pub behaviors: Vec<String>,
    pub roles: HashMap<ElementId, SceneRole>,
    pub visible: HashMap<ElementId, bool>,
    pub shown: Vec<(String, SceneActivation)>,
    pub native: HashMap<(ElementId, String), f64>,
    pub layouts: HashMap<String, Vec<LayoutInfo>>,
    pub layout_roots: HashMap<(String, usize), ElementId>,
    pub current_layout: Option<String>,
    next_id: u64,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self) -> ElementId {
        self.next_id += 1;
        ElementId::new(self.next_id)
    }

    pub fn add_scene(&mut self, name: &str) -> ElementId {
        let root = self.alloc();
        self.elements.insert(root, MockElement::default());
        self.scenes.push((name.to_string(), root));
        if self.current.is_none() {
            self.current = Some(name.to_string());
        }
        root
    }

    pub fn add_element(&mut self, parent: ElementId, classes: &[&str]) -> ElementId {
        let id = self.alloc();
        self.elements.insert(
            id,
            MockElement {
                parent: Some(parent),
                classes: classes.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
        );
        if let Some(p) = self.elements.get_mut(&parent) {
            p.children.push(id);
        }
        id
    }

    pub fn set_attr(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(e) = self.elements.get_mut(&element) {
            e.attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn set_style(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(e) = self.elements.get_mut(&element) {
            e.style.insert(name.to_string(), value.to_string());
        }
    }

    pub fn style(&self, element: ElementId, name: &str) -> Option<String> {
        self.elements.get(&element)?.style.get(name).cloned()
    }

    /// 为场景追加一个布局，返回该布局的根元素
    pub fn add_layout(&mut self, scene: &str, name: &str, width: f64, height: f64) -> ElementId {
        let root = self.alloc();
        self.elements.insert(root, MockElement::default());
        let layouts = self.layouts.entry(scene.to_string()).or_default();
        let index = layouts.len();
        layouts.push(LayoutInfo {
            name: name.to_string(),
            width,
            height,
            index,
        });
        self.layout_roots.insert((scene.to_string(), index), root);
        root
    }
}

impl SceneHost for MockHost {
    fn scene_names(&self) -> Vec<String> {
        self.scenes.iter().map(|(n, _)| n.clone()).collect()
    }

    fn current_scene_name(&self) -> Option<String> {
        self.current.clone()
    }

    fn current_layout_name(&self) -> Option<String> {
        self.current_layout.clone()
    }

    fn layouts_for_scene(&self, scene: &str) -> Vec<LayoutInfo> {
        self.layouts.get(scene).cloned().unwrap_or_default()
    }

    fn scene_root(&self, scene: &str, layout_index: usize) -> Option<ElementId> {
        if let Some(root) = self.layout_roots.get(&(scene.to_string(), layout_index)) {
            return Some(*root);
        }
        self.scenes
            .iter()
            .find(|(n, _)| n == scene)
            .map(|(_, r)| *r)
            .filter(|r| self.elements.contains_key(r))
    }

    fn show_scene(&mut self, scene: &str, activation: SceneActivation) {
        self.current = Some(scene.to_string());
        self.shown.push((scene.to_string(), activation));
    }

    fn set_scene_visible(&mut self, root: ElementId, visible: bool) {
        self.visible.insert(root, visible);
    }

    fn set_scene_role(&mut self, root: ElementId, role: SceneRole) {
        self.roles.insert(root, role);
    }

    fn scene_opacity(&self, root: ElementId) -> f64 {
        self.style(root, "opacity")
            .and_then(|v| parse_numeric(&v).map(|(n, _)| n))
            .unwrap_or(1.0)
    }

    fn trigger_behavior(&mut self, name: &str) {
        self.behaviors.push(name.to_string());
    }

    fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self
            .elements
            .get(&root)
            .map(|e| e.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(e) = self.elements.get(&id) {
                stack.extend(e.children.iter().rev().copied());
            }
        }
        out
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.elements.get(&element)?.parent
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.elements
            .get(&element)
            .map(|e| e.children.clone())
            .unwrap_or_default()
    }

    fn class_markers(&self, element: ElementId) -> Vec<String> {
        self.elements
            .get(&element)
            .map(|e| e.classes.clone())
            .unwrap_or_default()
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.elements.get(&element)?.attributes.get(name).cloned()
    }

    fn is_wrapper_container(&self, element: ElementId) -> bool {
        self.elements.get(&element).is_some_and(|e| e.wrapper)
    }

    fn select(&self, selector: &str) -> Vec<ElementId> {
        let class = selector.trim_start_matches('.');
        let mut ids: Vec<ElementId> = self
            .elements
            .iter()
            .filter(|(_, e)| e.classes.iter().any(|c| c == class))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    fn style_property(&self, element: ElementId, name: &str) -> Option<String> {
        self.style(element, name)
    }

    fn set_style_property(&mut self, element: ElementId, name: &str, value: Option<&str>) {
        if let Some(e) = self.elements.get_mut(&element) {
            match value {
                Some(v) => {
                    e.style.insert(name.to_string(), v.to_string());
                }
                None => {
                    e.style.remove(name);
                }
            }
        }
    }

    fn element_property(&self, element: ElementId, name: &str) -> Option<f64> {
        self.native.get(&(element, name.to_string())).copied()
    }

    fn set_element_property(
        &mut self,
        element: ElementId,
        name: &str,
        value: f64,
        _animation: Option<(f64, &str)>,
    ) {
        self.native.insert((element, name.to_string()), value);
    }
}

/// 记录所有调用的补间服务
#[derive(Debug, Default)]
pub(crate) struct RecordingTweens {
    pub log: Vec<String>,
    pub specs: Vec<(TweenId, TweenSpec)>,
    pub events: Vec<TweenEvent>,
    pub pending: Vec<ElementId>,
    pub reject_property: Option<String>,
    next_id: u64,
}

impl RecordingTweens {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self) -> TweenId {
        self.next_id += 1;
        TweenId(self.next_id)
    }

    pub fn spec_for(&self, target: ElementId) -> Option<&TweenSpec> {
        self.specs
            .iter()
            .map(|(_, s)| s)
            .find(|s| s.target == Some(target))
    }
}

impl TweenService for RecordingTweens {
    fn create_timeline(&mut self) -> TweenId {
        let id = self.alloc();
        self.log.push(format!("timeline {}", id.0));
        id
    }

    fn add_tween(
        &mut self,
        timeline: TweenId,
        position: f64,
        spec: TweenSpec,
    ) -> Result<TweenId, TweenError> {
        if let Some(bad) = &self.reject_property
            && let Some(value) = spec.to.get(bad)
        {
            return Err(TweenError::InvalidValue {
                property: bad.clone(),
                value: value.to_string(),
            });
        }
        let id = self.alloc();
        self.log.push(format!(
            "tween {} in {} at {} target {:?}",
            id.0,
            timeline.0,
            position,
            spec.target.map(|t| t.0)
        ));
        self.specs.push((id, spec));
        Ok(id)
    }

    fn add_timeline(
        &mut self,
        parent: TweenId,
        position: f64,
        child: TweenId,
    ) -> Result<(), TweenError> {
        self.log
            .push(format!("nest {} in {} at {}", child.0, parent.0, position));
        Ok(())
    }

    fn play(&mut self, timeline: TweenId, _host: &mut dyn SceneHost) {
        self.log.push(format!("play {}", timeline.0));
    }

    fn tween(
        &mut self,
        spec: TweenSpec,
        _host: &mut dyn SceneHost,
    ) -> Result<TweenId, TweenError> {
        let id = self.alloc();
        self.log
            .push(format!("standalone {} target {:?}", id.0, spec.target.map(|t| t.0)));
        self.specs.push((id, spec));
        Ok(id)
    }

    fn kill_tweens_of(&mut self, targets: &[ElementId]) {
        let ids: Vec<u64> = targets.iter().map(|t| t.0).collect();
        self.log.push(format!("kill {:?}", ids));
    }

    /// 只写入非相对值，足以检验"跳到终点"的效果
    fn complete(&mut self, timeline: TweenId, host: &mut dyn SceneHost) {
        self.log.push(format!("complete {}", timeline.0));
        for (_, spec) in &self.specs {
            let Some(target) = spec.target else { continue };
            for (name, value) in spec.to.iter() {
                if !value.starts_with("+=") && !value.starts_with("-=") {
                    host.set_style_property(target, name, Some(value));
                }
            }
        }
    }

    fn kill(&mut self, timeline: TweenId) {
        self.log.push(format!("kill timeline {}", timeline.0));
    }

    fn progress(&self, _timeline: TweenId) -> Option<f64> {
        None
    }

    fn pending_targets(&self, _timeline: TweenId) -> Vec<ElementId> {
        self.pending.clone()
    }

    fn drain_events(&mut self) -> Vec<TweenEvent> {
        std::mem::take(&mut self.events)
    }
}
