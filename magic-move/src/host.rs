//! # Host 模块
//!
//! 宿主场景/文档系统接口。
//!
//! 核心只通过这个 trait 访问场景图：场景枚举、布局、场景激活、
//! 元素树查询与内联样式读写。宿主负责分配 [`ElementId`] 并保证其稳定。

use crate::element::{ElementId, LayoutInfo, SceneActivation, SceneRole};

/// 宿主场景系统
///
/// ## 实现约定
///
/// - `descendants` 按文档顺序返回，匹配引擎的"后者胜出"依赖该顺序
/// - `style_property` 返回内联样式值；未设置时返回 `None`
/// - `set_style_property(.., None)` 移除内联覆盖，恢复继承值
pub trait SceneHost {
    // ========== 场景 ==========

    /// 所有场景名称（按场景顺序）
    fn scene_names(&self) -> Vec<String>;

    /// 当前场景名称
    fn current_scene_name(&self) -> Option<String>;

    /// 当前布局名称
    fn current_layout_name(&self) -> Option<String>;

    /// 场景的所有布局
    ///
    /// 不支持多布局的宿主返回空列表，核心将使用布局 0。
    fn layouts_for_scene(&self, scene: &str) -> Vec<LayoutInfo>;

    /// 解析场景根元素
    fn scene_root(&self, scene: &str, layout_index: usize) -> Option<ElementId>;

    /// 激活场景（宿主负责场景切换的簿记工作）
    fn show_scene(&mut self, scene: &str, activation: SceneActivation);

    /// 设置场景可见性
    fn set_scene_visible(&mut self, root: ElementId, visible: bool);

    /// 设置场景过渡角色
    fn set_scene_role(&mut self, root: ElementId, role: SceneRole);

    /// 场景的实际不透明度（0.0 - 1.0）
    fn scene_opacity(&self, root: ElementId) -> f64;

    /// 触发具名自定义行为
    fn trigger_behavior(&mut self, name: &str);

    // ========== 元素树 ==========

    /// 根元素之下的全部后代（文档顺序，不含根）
    fn descendants(&self, root: ElementId) -> Vec<ElementId>;

    /// 父元素
    fn parent(&self, element: ElementId) -> Option<ElementId>;

    /// 子元素
    fn children(&self, element: ElementId) -> Vec<ElementId>;

    /// 类名标记
    fn class_markers(&self, element: ElementId) -> Vec<String>;

    /// 元素属性
    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;

    /// 是否为宿主的布局包装容器
    fn is_wrapper_container(&self, element: ElementId) -> bool;

    /// 按选择器查找元素
    fn select(&self, selector: &str) -> Vec<ElementId>;

    // ========== 样式 ==========

    /// 读取内联样式
    fn style_property(&self, element: ElementId, name: &str) -> Option<String>;

    /// 写入内联样式（`None` 表示移除）
    fn set_style_property(&mut self, element: ElementId, name: &str, value: Option<&str>);

    // ========== 宿主原生属性 ==========

    /// 读取宿主原生属性
    fn element_property(&self, element: ElementId, name: &str) -> Option<f64>;

    /// 写入宿主原生属性，可选带动画（时长秒数, 缓动名）
    fn set_element_property(
        &mut self,
        element: ElementId,
        name: &str,
        value: f64,
        animation: Option<(f64, &str)>,
    );
}
