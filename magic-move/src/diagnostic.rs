//! # 诊断模块
//!
//! 对一对场景做静态匹配检查，不驱动任何动画。
//!
//! ## 检查项
//!
//! - Error：场景无法解析
//! - Warn：同一侧多个元素共享标识符（按后者胜出，前者被挤掉）
//! - Warn：动画指令解析为空，或引用了未注册的动画
//! - Info：未配对且没有进出场指令的元素（保持静止）

use std::collections::BTreeMap;

use crate::element::ElementId;
use crate::host::SceneHost;
use crate::identifier::{eligible_descendants, identifiers_of};
use crate::matching::{UnmatchedSide, match_elements, unmatched_directive};
use crate::registry::AnimationRegistry;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 场景名称
    pub scene: String,
    /// 相关元素（如果可定位）
    pub element: Option<ElementId>,
    /// 诊断消息
    pub message: String,
    /// 诊断详情
    pub detail: Option<String>,
}

impl Diagnostic {
    fn new(level: DiagnosticLevel, scene: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            scene: scene.into(),
            element: None,
            message: message.into(),
            detail: None,
        }
    }

    /// 创建错误诊断
    pub fn error(scene: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, scene, message)
    }

    /// 创建警告诊断
    pub fn warn(scene: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warn, scene, message)
    }

    /// 创建信息诊断
    pub fn info(scene: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Info, scene, message)
    }

    /// 设置元素
    pub fn with_element(mut self, element: ElementId) -> Self {
        self.element = Some(element);
        self
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.scene)?;
        if let Some(element) = self.element {
            write!(f, "{}", element)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    /// 创建空结果
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加诊断
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// 获取错误数量
    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    /// 获取警告数量
    pub fn warn_count(&self) -> usize {
        self.count(DiagnosticLevel::Warn)
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    /// 是否有错误
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 按级别过滤
    pub fn filter_by_level(&self, min_level: DiagnosticLevel) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level >= min_level)
            .collect()
    }
}

//=============================================================================
// 场景分析 API
//=============================================================================

/// 分析从 `source` 过渡到 `target` 时的匹配情况
///
/// 两个场景都使用布局 0。
pub fn analyze_scenes<H: SceneHost + ?Sized>(
    host: &H,
    registry: &AnimationRegistry,
    source: &str,
    target: &str,
) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();

    let mut roots = Vec::new();
    for scene in [source, target] {
        match host.scene_root(scene, 0) {
            Some(root) => roots.push(root),
            None => result.push(Diagnostic::error(scene, format!("场景不存在: **{}**", scene))),
        }
    }
    let &[source_root, target_root] = roots.as_slice() else {
        return result;
    };

    let source_elements = eligible_descendants(host, source_root);
    let target_elements = eligible_descendants(host, target_root);

    check_shared_identifiers(host, source, &source_elements, &mut result);
    check_shared_identifiers(host, target, &target_elements, &mut result);

    let matches = match_elements(host, &source_elements, &target_elements);
    for (scene, elements, side) in [
        (source, &matches.source_only, UnmatchedSide::Exit),
        (target, &matches.target_only, UnmatchedSide::Enter),
    ] {
        for &element in elements {
            check_unmatched(host, registry, scene, element, side, &mut result);
        }
    }

    result
}

/// 同一侧共享标识符的元素
fn check_shared_identifiers<H: SceneHost + ?Sized>(
    host: &H,
    scene: &str,
    elements: &[ElementId],
    result: &mut DiagnosticResult,
) {
    let mut owners: BTreeMap<String, Vec<ElementId>> = BTreeMap::new();
    for &element in elements {
        for id in identifiers_of(host, element) {
            owners.entry(id).or_default().push(element);
        }
    }

    for (id, elements) in owners {
        if let &[.., winner] = elements.as_slice()
            && elements.len() > 1
        {
            let list: Vec<String> = elements.iter().map(ToString::to_string).collect();
            result.push(
                Diagnostic::warn(
                    scene,
                    format!("标识符 **{}** 被 {} 个元素共享", id, elements.len()),
                )
                .with_element(winner)
                .with_detail(format!("{}，按后者胜出", list.join(", "))),
            );
        }
    }
}

/// 未配对元素的进出场指令
fn check_unmatched<H: SceneHost + ?Sized>(
    host: &H,
    registry: &AnimationRegistry,
    scene: &str,
    element: ElementId,
    side: UnmatchedSide,
    result: &mut DiagnosticResult,
) {
    let Some(directive) = unmatched_directive(host, element, side) else {
        result.push(
            Diagnostic::info(scene, "未配对元素没有进出场动画，保持静止").with_element(element),
        );
        return;
    };

    match registry.resolve_directive(&directive) {
        None => result.push(
            Diagnostic::warn(scene, format!("未注册的动画: **{}**", directive.trim()))
                .with_element(element),
        ),
        Some(map) if map.is_empty() => result.push(
            Diagnostic::warn(scene, "动画指令解析为空")
                .with_element(element)
                .with_detail(directive),
        ),
        Some(_) => {}
    }
}
