//! 单元素动画：对任意元素或选择器直接播放具名/内联动画。
//!
//! 与场景过渡互不干扰。动画结束后，按 `host_property_map` 把最终值
//! 写回宿主原生属性（可跳过）。

use std::fmt;

use tracing::{debug, warn};

use super::MagicMove;
use super::request::DEFAULT_EASE;
use crate::config::MagicConfig;
use crate::element::ElementId;
use crate::host::SceneHost;
use crate::property::{PropertyMap, parse_numeric};
use crate::transform::{decompose, rotation_channels};
use crate::tween::{TweenId, TweenService, TweenSpec};

/// 动画目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimateTarget {
    /// 单个元素
    Element(ElementId),
    /// 选择器
    Selector(String),
}

/// 动画方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationDirection {
    /// 从动画属性补间到当前值
    From,
    /// 从当前值补间到动画属性
    #[default]
    To,
}

/// 单元素动画请求
pub struct AnimateRequest {
    /// 目标
    pub target: AnimateTarget,
    /// 具名动画或内联属性
    pub animation: String,
    /// 时长（秒），`None` 使用配置默认值
    pub duration: Option<f64>,
    /// 缓动
    pub ease: Option<String>,
    /// 方向
    pub direction: AnimationDirection,
    /// 跳过回写宿主原生属性
    pub skip_sync: bool,
    /// 完成回调
    pub on_complete: Option<Box<dyn FnOnce()>>,
}

impl AnimateRequest {
    /// 创建请求
    pub fn new(target: AnimateTarget, animation: impl Into<String>) -> Self {
        Self {
            target,
            animation: animation.into(),
            duration: None,
            ease: None,
            direction: AnimationDirection::To,
            skip_sync: false,
            on_complete: None,
        }
    }

    /// 设置时长
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// 设置缓动
    pub fn with_ease(mut self, ease: impl Into<String>) -> Self {
        self.ease = Some(ease.into());
        self
    }

    /// 设置方向
    pub fn with_direction(mut self, direction: AnimationDirection) -> Self {
        self.direction = direction;
        self
    }

    /// 跳过回写
    pub fn skip_sync(mut self) -> Self {
        self.skip_sync = true;
        self
    }

    /// 设置完成回调
    pub fn on_complete(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for AnimateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimateRequest")
            .field("target", &self.target)
            .field("animation", &self.animation)
            .field("duration", &self.duration)
            .field("ease", &self.ease)
            .field("direction", &self.direction)
            .field("skip_sync", &self.skip_sync)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// 进行中的单元素动画
pub(crate) struct AdhocAnimation {
    /// 元素 → 最终属性
    finals: Vec<(ElementId, PropertyMap)>,
    skip_sync: bool,
    on_complete: Option<Box<dyn FnOnce()>>,
}

/// 读取给定属性的当前值（内联值，其次配置默认值）
fn current_values<H: SceneHost + ?Sized>(
    host: &H,
    element: ElementId,
    names: &PropertyMap,
    config: &MagicConfig,
) -> PropertyMap {
    names
        .names()
        .filter_map(|name| {
            host.style_property(element, name)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| config.property_defaults.get(name).cloned())
                .map(|value| (name.to_string(), value))
        })
        .collect()
}

/// 最终属性中可回写的数值：普通属性直接取数值，transform 拆出旋转角度
fn native_values(finals: &PropertyMap) -> Vec<(String, f64)> {
    let mut out = Vec::new();
    for (name, value) in finals.iter() {
        if name == "transform" {
            out.extend(decompose(value).rotations);
        } else if let Some((number, _)) = parse_numeric(value) {
            out.push((name.to_string(), number));
        }
    }
    out
}

impl<H: SceneHost, T: TweenService> MagicMove<H, T> {
    /// 播放单元素动画
    ///
    /// 目标不存在或动画无法解析时记录警告并返回 `None`。
    pub fn animate(&mut self, request: AnimateRequest) -> Option<TweenId> {
        let elements = match &request.target {
            AnimateTarget::Element(element) => vec![*element],
            AnimateTarget::Selector(selector) => self.host.select(selector),
        };
        if elements.is_empty() {
            warn!(target = ?request.target, "动画目标不存在");
            return None;
        }

        let animated = match self.registry.resolve_directive(&request.animation) {
            Some(map) if !map.is_empty() => map,
            _ => {
                warn!(animation = %request.animation, "动画无法解析");
                return None;
            }
        };

        let duration = request
            .duration
            .unwrap_or(self.config.default_animation_duration);
        let ease = self
            .config
            .resolve_ease(request.ease.as_deref().unwrap_or(DEFAULT_EASE));

        let mut specs = Vec::new();
        let mut finals = Vec::new();
        for element in elements {
            let mut current = current_values(&self.host, element, &animated, &self.config);
            for (name, value) in animated.iter() {
                if !current.contains(name) {
                    current.insert(name, value);
                }
            }

            let (mut from, mut to) = match request.direction {
                AnimationDirection::To => (current, animated.clone()),
                AnimationDirection::From => (animated.clone(), current),
            };
            finals.push((element, to.clone()));
            if self.config.decompose_transforms {
                rotation_channels(&mut from, &mut to);
            }
            specs.push(
                TweenSpec::new(element, from, to, duration).with_ease(ease.clone()),
            );
        }

        let id = if let [spec] = &specs[..] {
            match self.tweener.tween(spec.clone(), &mut self.host) {
                Ok(id) => id,
                Err(e) => {
                    warn!(error = %e, "单元素动画创建失败");
                    return None;
                }
            }
        } else {
            let timeline = self.tweener.create_timeline();
            for spec in specs {
                if let Err(e) = self.tweener.add_tween(timeline, 0.0, spec) {
                    warn!(error = %e, "单元素动画创建失败，跳过该元素");
                }
            }
            self.tweener.play(timeline, &mut self.host);
            timeline
        };

        debug!(id = %id, animation = %request.animation, "单元素动画开始");
        self.adhoc.insert(
            id,
            AdhocAnimation {
                finals,
                skip_sync: request.skip_sync,
                on_complete: request.on_complete,
            },
        );
        Some(id)
    }

    /// 单元素动画完成：回写原生属性并调用回调
    pub(super) fn finish_adhoc(&mut self, animation: AdhocAnimation) {
        if !animation.skip_sync {
            for (element, finals) in &animation.finals {
                for (name, value) in native_values(finals) {
                    if let Some(native) = self.config.host_property_map.get(&name) {
                        self.host.set_element_property(*element, native, value, None);
                    }
                }
            }
        }
        if let Some(callback) = animation.on_complete {
            callback();
        }
    }
}
