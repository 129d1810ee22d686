//! 主时间轴的组装：配对子时间轴与未配对元素的进出场补间。

use tracing::{debug, warn};

use crate::config::MagicConfig;
use crate::element::{ElementId, attributes};
use crate::host::SceneHost;
use crate::matching::{UnmatchedSide, unmatched_directive};
use crate::property::PropertyMap;
use crate::registry::AnimationRegistry;
use crate::snapshot::{PropertySnapshotStore, live_properties};
use crate::timing::{
    DEFAULT_DELAY, DEFAULT_DURATION, ResolvedTiming, TimingSpec, resolve_timing, spec_or,
};
use crate::transform::{ROTATION_CHANNELS, elide_auto_dimensions, rotation_channels};
use crate::tween::{TweenId, TweenService, TweenSpec};
use crate::zorder::{Z_INDEX, directive_of, resolve_z_index, stacking_element};

/// 一个配对的子时间轴
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PairTimeline {
    /// 子时间轴
    pub timeline: TweenId,
    /// 设置了 z-index 覆盖的元素，子时间轴完成时清除
    pub stacking: Vec<ElementId>,
}

/// 时间轴组装器
pub(crate) struct TimelineBuilder<'a, H: SceneHost, T: TweenService> {
    pub host: &'a mut H,
    pub tweener: &'a mut T,
    pub config: &'a MagicConfig,
    pub snapshots: &'a PropertySnapshotStore,
    pub registry: &'a AnimationRegistry,
    /// 过渡总时长
    pub total: f64,
    /// 请求级缓动（已解析别名）
    pub ease: String,
}

impl<H: SceneHost, T: TweenService> TimelineBuilder<'_, H, T> {
    /// 目标状态：初始快照，没有快照时退回实时属性
    fn designed_properties(&self, element: ElementId) -> PropertyMap {
        self.snapshots
            .pristine(element)
            .cloned()
            .unwrap_or_else(|| live_properties(&*self.host, element, self.config))
    }

    /// 读取元素的延迟/时长，`target` 取 `partner` 的同名属性
    fn timing(&self, element: ElementId, partner: Option<ElementId>) -> ResolvedTiming {
        let resolve = |name: &str, default: TimingSpec| {
            let own = spec_or(self.host.attribute(element, name).as_deref(), default);
            let other = partner
                .and_then(|p| self.host.attribute(p, name))
                .as_deref()
                .and_then(TimingSpec::parse);
            own.inherit(other, default)
        };
        resolve_timing(
            resolve(attributes::DELAY, DEFAULT_DELAY),
            resolve(attributes::DURATION, DEFAULT_DURATION),
            self.total,
        )
    }

    /// 元素的缓动覆盖，`target` 取 `partner` 的值
    fn ease(&self, element: ElementId, partner: Option<ElementId>) -> String {
        let read = |e: ElementId| {
            self.host
                .attribute(e, attributes::EASE)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let chosen = match read(element) {
            Some(v) if v.eq_ignore_ascii_case(attributes::INHERIT_MARKER) => partner
                .and_then(read)
                .filter(|v| !v.eq_ignore_ascii_case(attributes::INHERIT_MARKER)),
            other => other,
        };
        chosen
            .map(|name| self.config.resolve_ease(&name))
            .unwrap_or_else(|| self.ease.clone())
    }

    /// 只保留两侧都有且取值不同的属性
    ///
    /// 有旋转通道参与时，剩余 transform 必须一并写入，即使两侧相同。
    fn normalize(&self, from: &mut PropertyMap, to: &mut PropertyMap) {
        if self.config.decompose_transforms {
            rotation_channels(from, to);
        }
        elide_auto_dimensions(from, to);
        let residuals = (
            from.get("transform").map(str::to_string),
            to.get("transform").map(str::to_string),
        );

        let names: Vec<String> = from.names().map(str::to_string).collect();
        for name in names {
            let keep = matches!((from.get(&name), to.get(&name)), (Some(a), Some(b)) if a != b);
            if !keep {
                from.remove(&name);
                to.remove(&name);
            }
        }
        let extra: Vec<String> = to
            .names()
            .filter(|n| !from.contains(n))
            .map(str::to_string)
            .collect();
        for name in extra {
            to.remove(&name);
        }

        if ROTATION_CHANNELS.iter().any(|c| from.contains(c))
            && let (Some(start), Some(end)) = residuals
        {
            from.insert("transform", start);
            to.insert("transform", end);
        }
    }

    fn add(&mut self, timeline: TweenId, spec: TweenSpec) -> Option<TweenId> {
        let target = spec.target;
        match self.tweener.add_tween(timeline, 0.0, spec) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, element = ?target, "补间创建失败，跳过该补间");
                None
            }
        }
    }

    /// 应用叠放指令，返回实际设置了 z-index 的元素
    fn apply_z_order(&mut self, element: ElementId, partner: ElementId) -> Option<ElementId> {
        let directive = directive_of(&*self.host, element)?
            .inherit(directive_of(&*self.host, partner))?;
        let stacking = stacking_element(&*self.host, element);
        let z = resolve_z_index(&*self.host, stacking, directive)?;
        self.host
            .set_style_property(stacking, Z_INDEX, Some(&z.to_string()));
        Some(stacking)
    }

    /// 为一个配对创建子时间轴
    ///
    /// 两侧元素都从源元素的实时属性补间到目标元素的初始快照。
    pub fn pair(&mut self, source: ElementId, target: ElementId) -> PairTimeline {
        let mut from = live_properties(&*self.host, source, self.config);
        let mut to = self.designed_properties(target);
        self.normalize(&mut from, &mut to);

        let timing = self.timing(source, Some(target));
        let ease = self.ease(source, Some(target));
        debug!(
            source = %source,
            target = %target,
            from = %from,
            to = %to,
            delay = timing.delay,
            duration = timing.duration,
            "配对补间"
        );

        let timeline = self.tweener.create_timeline();
        for element in [target, source] {
            let spec = TweenSpec::new(element, from.clone(), to.clone(), timing.duration)
                .with_delay(timing.delay)
                .with_ease(ease.clone());
            self.add(timeline, spec);
        }

        let stacking = [(source, target), (target, source)]
            .into_iter()
            .filter_map(|(element, partner)| self.apply_z_order(element, partner))
            .collect();

        PairTimeline { timeline, stacking }
    }

    /// 为未配对元素创建进场或离场补间
    ///
    /// 没有指令、指令无法解析或解析为空时返回 `None`，元素保持静止。
    pub fn unmatched(
        &mut self,
        master: TweenId,
        element: ElementId,
        side: UnmatchedSide,
    ) -> Option<TweenId> {
        let directive = unmatched_directive(&*self.host, element, side)?;
        let Some(mut animated) = self.registry.resolve_directive(&directive) else {
            warn!(element = %element, directive = %directive.trim(), "未注册的动画，元素保持静止");
            return None;
        };
        animated.retain(|name, _| self.config.is_tracked(name));
        if animated.is_empty() {
            debug!(element = %element, "动画指令为空，元素保持静止");
            return None;
        }

        let names: Vec<&str> = animated.names().collect();
        let mut resting = match side {
            UnmatchedSide::Enter => self.designed_properties(element),
            UnmatchedSide::Exit => live_properties(&*self.host, element, self.config),
        };
        resting.retain_names(&names);

        let (mut from, mut to) = match side {
            UnmatchedSide::Enter => (animated, resting),
            UnmatchedSide::Exit => (resting, animated),
        };
        self.normalize(&mut from, &mut to);
        if from.is_empty() {
            return None;
        }

        let timing = self.timing(element, None);
        let spec = TweenSpec::new(element, from, to, timing.duration)
            .with_delay(timing.delay)
            .with_ease(self.ease(element, None));
        self.add(master, spec)
    }
}
