//! # Orchestrator 模块
//!
//! 过渡编排状态机。
//!
//! ## 状态流转
//!
//! ```text
//! Idle → Preparing → Animating → Restoring → Idle
//!                        │
//!                        └─ 新请求到达：强制完成 → 恢复 → 下一帧重试
//! ```
//!
//! ## 驱动方式
//!
//! 编排器本身不计时。宿主每帧依次调用：
//! 1. 补间服务推进（由宿主自行完成）
//! 2. [`MagicMove::handle_tween_events`] 消费补间事件
//! 3. [`MagicMove::on_animation_frame`] 执行推迟到帧边界的任务

mod adhoc;
mod navigation;
mod pair;
mod request;


use std::collections::{HashMap, VecDeque};

use tracing::{debug, info, warn};

pub use adhoc::{AnimateRequest, AnimateTarget, AnimationDirection};
pub use navigation::resolve_navigation;
pub use request::{
    DEFAULT_EASE, IgnoreReason, Phase, TransitionObserver, TransitionOutcome, TransitionParams,
};

use crate::config::MagicConfig;
use crate::element::{ElementId, SceneActivation, SceneRef, SceneRole};
use crate::error::ConfigError;
use crate::host::SceneHost;
use crate::identifier::eligible_descendants;
use crate::matching::{UnmatchedSide, match_elements};
use crate::property::PropertyMap;
use crate::registry::{AnimationRegistry, AnimationSpec};
use crate::snapshot::{PropertySnapshotStore, apply_properties};
use crate::tween::{TweenEvent, TweenId, TweenService, TweenSpec};
use crate::zorder::Z_INDEX;
use adhoc::AdhocAnimation;
use pair::TimelineBuilder;
use request::TransitionRequest;

/// 生命周期行为名
pub mod behaviors {
    /// 过渡开始
    pub const START: &str = "MagicMoveStart";
    /// 过渡结束
    pub const END: &str = "MagicMoveEnd";

    /// 离开某场景
    pub fn from_scene(scene: &str) -> String {
        format!("MagicMoveFrom{}", sanitize(scene))
    }

    /// 进入某场景
    pub fn to_scene(scene: &str) -> String {
        format!("MagicMoveTo{}", sanitize(scene))
    }

    /// 从一个场景到另一个场景
    pub fn from_to(source: &str, target: &str) -> String {
        format!("MagicMoveFrom{}To{}", sanitize(source), sanitize(target))
    }

    fn sanitize(scene: &str) -> String {
        scene.chars().filter(|c| !c.is_whitespace()).collect()
    }
}

/// 场景不透明度视为已收敛的阈值
const OPACITY_EPSILON: f64 = 1e-3;

/// 推迟到下一帧的任务
#[derive(Debug)]
enum FrameTask {
    /// 重试被打断时到达的请求
    Retry(TransitionRequest),
    /// 等待目标场景不透明度到达 1
    AwaitOpacity,
    /// 应用恢复列表
    Restore,
}

/// 进行中的过渡
struct ActiveTransition {
    source: SceneRef,
    target: SceneRef,
    params: TransitionParams,
    master: TweenId,
    crossfade: Option<TweenId>,
    fade_complete: bool,
    /// 子时间轴 → 需要清除 z-index 的元素
    z_overrides: HashMap<TweenId, Vec<ElementId>>,
}

/// 过渡编排器
///
/// 每个宿主文档持有一个实例；配置、注册表与快照缓存都属于实例，多个文档互不影响。
pub struct MagicMove<H: SceneHost, T: TweenService> {
    host: H,
    tweener: T,
    config: MagicConfig,
    registry: AnimationRegistry,
    snapshots: PropertySnapshotStore,
    phase: Phase,
    active: Option<ActiveTransition>,
    frame_tasks: VecDeque<FrameTask>,
    adhoc: HashMap<TweenId, AdhocAnimation>,
}

impl<H: SceneHost, T: TweenService> MagicMove<H, T> {
    /// 创建编排器
    pub fn new(host: H, tweener: T, config: MagicConfig) -> Self {
        Self {
            host,
            tweener,
            config,
            registry: AnimationRegistry::new(),
            snapshots: PropertySnapshotStore::new(),
            phase: Phase::Idle,
            active: None,
            frame_tasks: VecDeque::new(),
            adhoc: HashMap::new(),
        }
    }

    // ========== 访问器 ==========

    /// 宿主
    pub fn host(&self) -> &H {
        &self.host
    }

    /// 宿主（可变）
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// 补间服务
    pub fn tweener(&self) -> &T {
        &self.tweener
    }

    /// 同时借出宿主与补间服务，供宿主推进补间
    pub fn parts_mut(&mut self) -> (&mut H, &mut T) {
        (&mut self.host, &mut self.tweener)
    }

    /// 当前阶段
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// 是否有推迟到下一帧的任务
    pub fn has_pending_frame_tasks(&self) -> bool {
        !self.frame_tasks.is_empty()
    }

    /// 快照缓存
    pub fn snapshots(&self) -> &PropertySnapshotStore {
        &self.snapshots
    }

    // ========== 配置 ==========

    /// 当前配置
    pub fn config(&self) -> &MagicConfig {
        &self.config
    }

    /// 可变配置（按键读写见 [`MagicConfig::set`]）
    pub fn config_mut(&mut self) -> &mut MagicConfig {
        &mut self.config
    }

    /// 整体替换配置
    pub fn replace_config(&mut self, config: MagicConfig) -> Result<(), ConfigError> {
        self.config.replace(config)
    }

    // ========== 具名动画 ==========

    /// 注册具名动画
    pub fn register_animation(&mut self, name: &str, spec: impl Into<AnimationSpec>) {
        self.registry.register(name, spec);
    }

    /// 查找具名动画
    pub fn lookup_animation(&self, name: &str) -> Option<&PropertyMap> {
        self.registry.lookup(name)
    }

    /// 具名动画注册表
    pub fn registry(&self) -> &AnimationRegistry {
        &self.registry
    }

    // ========== 快照 ==========

    /// 场景即将显示：为其中可参与过渡的元素记录初始快照
    pub fn scene_will_display(&mut self, root: ElementId) {
        let mut captured = 0usize;
        for element in eligible_descendants(&self.host, root) {
            if self
                .snapshots
                .capture_pristine_if_absent(&self.host, element, &self.config)
            {
                captured += 1;
            }
        }
        if captured > 0 {
            debug!(root = %root, captured, "记录初始快照");
        }
    }

    /// 场景被销毁：回收其元素的快照
    pub fn scene_removed(&mut self, root: ElementId) {
        self.snapshots.release_scene(&self.host, root);
    }

    /// 清除初始快照（`None` 清除全部）
    pub fn clear_pristine(&mut self, element: Option<ElementId>) {
        self.snapshots.clear_pristine(element);
    }

    // ========== 过渡 ==========

    /// 过渡到指定场景
    pub fn show_scene_named(&mut self, scene: &str, params: TransitionParams) -> TransitionOutcome {
        self.dispatch(TransitionRequest {
            scene: scene.to_string(),
            params,
        })
    }

    fn dispatch(&mut self, request: TransitionRequest) -> TransitionOutcome {
        if !self.host.scene_names().iter().any(|n| *n == request.scene) {
            warn!(scene = %request.scene, "目标场景不存在，忽略过渡请求");
            return TransitionOutcome::Ignored(IgnoreReason::UnknownScene);
        }

        if self.phase == Phase::Animating {
            self.interrupt();
            self.queue_retry(request);
            return TransitionOutcome::Deferred;
        }

        // 已有重试在排队时，新请求取代它
        if self.has_queued_retry() {
            self.queue_retry(request);
            return TransitionOutcome::Deferred;
        }

        let Some(current) = self.host.current_scene_name() else {
            debug!(scene = %request.scene, "没有当前场景，忽略过渡请求");
            return TransitionOutcome::Ignored(IgnoreReason::NoCurrentScene);
        };
        if current == request.scene {
            debug!(scene = %request.scene, "目标即当前场景");
            return TransitionOutcome::Ignored(IgnoreReason::SameScene);
        }

        if self.phase == Phase::Restoring {
            debug!("上一个过渡尚在恢复阶段，立即完成恢复");
            self.finish_restore();
        }

        self.start(current, request)
    }

    fn has_queued_retry(&self) -> bool {
        self.frame_tasks
            .iter()
            .any(|t| matches!(t, FrameTask::Retry(_)))
    }

    fn queue_retry(&mut self, request: TransitionRequest) {
        self.frame_tasks
            .retain(|t| !matches!(t, FrameTask::Retry(_)));
        self.frame_tasks.push_back(FrameTask::Retry(request));
    }

    /// 选择目标场景的布局：同名 → 同尺寸 → 第一个
    fn choose_layout(&self, current: &str, target: &str) -> (usize, usize) {
        let current_layouts = self.host.layouts_for_scene(current);
        let target_layouts = self.host.layouts_for_scene(target);
        let layout_name = self.host.current_layout_name();

        let current_layout = layout_name
            .as_deref()
            .and_then(|name| current_layouts.iter().find(|l| l.name == name))
            .or_else(|| current_layouts.first());

        let source_index = current_layout.map(|l| l.index).unwrap_or(0);
        let target_index = current_layout
            .and_then(|cur| {
                target_layouts
                    .iter()
                    .find(|l| l.name == cur.name)
                    .or_else(|| {
                        target_layouts
                            .iter()
                            .find(|l| l.width == cur.width && l.height == cur.height)
                    })
            })
            .or_else(|| target_layouts.first())
            .map(|l| l.index)
            .unwrap_or(0);

        (source_index, target_index)
    }

    fn start(&mut self, current: String, request: TransitionRequest) -> TransitionOutcome {
        let (source_index, target_index) = self.choose_layout(&current, &request.scene);
        let roots = (
            self.host.scene_root(&current, source_index),
            self.host.scene_root(&request.scene, target_index),
        );
        let (Some(source_root), Some(target_root)) = roots else {
            debug!(source = %current, target = %request.scene, "场景根元素无法解析");
            return TransitionOutcome::Ignored(IgnoreReason::MissingRoot);
        };

        let source = SceneRef {
            name: current,
            layout_index: source_index,
            root: source_root,
        };
        let target = SceneRef {
            name: request.scene,
            layout_index: target_index,
            root: target_root,
        };
        let params = request.params;
        let duration = params.duration.unwrap_or(self.config.default_duration);
        let factor = params
            .cross_fade_factor
            .unwrap_or(self.config.cross_fade_factor);
        let ease = self
            .config
            .resolve_ease(params.ease.as_deref().unwrap_or(DEFAULT_EASE));

        // ---------- Preparing ----------
        self.phase = Phase::Preparing;
        info!(source = %source.name, target = %target.name, duration, "开始过渡");

        self.scene_will_display(source.root);
        self.scene_will_display(target.root);
        self.snapshots.clear_restore();

        self.host.set_scene_role(source.root, SceneRole::Outgoing);
        self.host.set_scene_role(target.root, SceneRole::Incoming);
        self.host.set_scene_visible(target.root, true);

        if let Some(observer) = &params.observer {
            observer.on_prepare(&source, &target);
        }

        for behavior in [
            behaviors::START.to_string(),
            behaviors::from_scene(&source.name),
            behaviors::to_scene(&target.name),
            behaviors::from_to(&source.name, &target.name),
        ] {
            self.host.trigger_behavior(&behavior);
        }

        self.host
            .show_scene(&target.name, SceneActivation::Crossfade { duration });

        // ---------- Animating ----------
        let source_elements = eligible_descendants(&self.host, source.root);
        let target_elements = eligible_descendants(&self.host, target.root);
        let matches = match_elements(&self.host, &source_elements, &target_elements);

        for (s, t) in &matches.abandoned {
            debug!(source = %s, target = %t, "候选配对被后来者取代");
            self.tweener.kill_tweens_of(&[*s, *t]);
        }

        let master = self.tweener.create_timeline();
        if let Err(e) = self
            .tweener
            .add_tween(master, 0.0, TweenSpec::spacer(duration))
        {
            warn!(error = %e, "占位补间创建失败");
        }

        let fade: PropertyMap = [("opacity", "0")].into_iter().collect();
        let opaque: PropertyMap = [("opacity", "1")].into_iter().collect();
        let crossfade = match self.tweener.add_tween(
            master,
            0.0,
            TweenSpec::new(target.root, fade, opaque, duration * factor).with_ease("linear"),
        ) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "场景淡入补间创建失败");
                None
            }
        };

        let mut z_overrides = HashMap::new();
        let mut restore = Vec::new();
        {
            let mut builder = TimelineBuilder {
                host: &mut self.host,
                tweener: &mut self.tweener,
                config: &self.config,
                snapshots: &self.snapshots,
                registry: &self.registry,
                total: duration,
                ease,
            };

            for &(s, t) in &matches.pairs {
                let pair = builder.pair(s, t);
                if let Err(e) = builder.tweener.add_timeline(master, 0.0, pair.timeline) {
                    warn!(error = %e, source = %s, target = %t, "子时间轴嵌入失败");
                }
                if !pair.stacking.is_empty() {
                    z_overrides.insert(pair.timeline, pair.stacking);
                }
                restore.push(s);
            }

            for (elements, side) in [
                (&matches.target_only, UnmatchedSide::Enter),
                (&matches.source_only, UnmatchedSide::Exit),
            ] {
                for &element in elements {
                    if builder.unmatched(master, element, side).is_some() {
                        restore.push(element);
                    }
                }
            }
        }

        for element in restore {
            if !self.snapshots.schedule_restore(element) {
                debug!(element = %element, "元素没有初始快照，过渡后不恢复");
            }
        }

        self.active = Some(ActiveTransition {
            source,
            target,
            params,
            master,
            crossfade,
            fade_complete: false,
            z_overrides,
        });
        self.phase = Phase::Animating;
        self.tweener.play(master, &mut self.host);

        TransitionOutcome::Started
    }

    /// 打断进行中的过渡：强制完成并同步恢复
    fn interrupt(&mut self) {
        let Some(active) = &self.active else {
            return;
        };
        let master = active.master;
        let pending = self.tweener.pending_targets(master);
        warn!(
            source = %active.source.name,
            target = %active.target.name,
            pending = ?pending,
            "过渡进行中收到新的请求，强制完成当前过渡"
        );
        self.tweener.complete(master, &mut self.host);
        self.finish_restore();
    }

    /// 交叉淡化完成：隐藏离场场景，固定进场场景不透明度
    fn fade_complete(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.fade_complete {
            return;
        }
        active.fade_complete = true;
        let (source_root, target_root) = (active.source.root, active.target.root);

        self.host.set_scene_visible(source_root, false);
        self.host
            .set_style_property(target_root, "opacity", Some("1"));
        let outgoing = self.host.descendants(source_root);
        self.tweener.kill_tweens_of(&outgoing);
    }

    fn clear_z_overrides(&mut self, elements: &[ElementId]) {
        for &element in elements {
            self.host.set_style_property(element, Z_INDEX, None);
        }
    }

    /// 恢复阶段收尾：应用恢复列表、清除场景角色、通知结束
    fn finish_restore(&mut self) {
        self.fade_complete();
        self.frame_tasks
            .retain(|t| matches!(t, FrameTask::Retry(_)));

        let Some(active) = self.active.take() else {
            self.phase = Phase::Idle;
            return;
        };

        for elements in active.z_overrides.values() {
            self.clear_z_overrides(elements);
        }

        let restore = self.snapshots.take_restore();
        debug!(count = restore.len(), "应用恢复列表");
        for (element, properties) in &restore {
            apply_properties(&mut self.host, *element, properties);
        }

        self.host
            .set_scene_role(active.source.root, SceneRole::Settled);
        self.host
            .set_scene_role(active.target.root, SceneRole::Settled);

        if let Some(observer) = &active.params.observer {
            observer.on_end(&active.source, &active.target);
        }
        self.host.trigger_behavior(behaviors::END);
        info!(source = %active.source.name, target = %active.target.name, "过渡结束");

        self.phase = Phase::Idle;
    }

    // ========== 帧驱动 ==========

    /// 消费补间服务积压的事件
    pub fn handle_tween_events(&mut self) {
        for event in self.tweener.drain_events() {
            match event {
                TweenEvent::Started(id) => {
                    if let Some(active) = self.active.as_ref().filter(|a| a.master == id)
                        && let Some(observer) = &active.params.observer
                    {
                        observer.on_start(&active.source, &active.target);
                    }
                }
                TweenEvent::Updated { id, progress } => {
                    if let Some(active) = self.active.as_ref().filter(|a| a.master == id)
                        && let Some(observer) = &active.params.observer
                    {
                        observer.on_progress(progress, &active.source, &active.target);
                    }
                }
                TweenEvent::Completed(id) => self.on_completed(id),
            }
        }
    }

    fn on_completed(&mut self, id: TweenId) {
        if let Some(animation) = self.adhoc.remove(&id) {
            self.finish_adhoc(animation);
            return;
        }

        let Some(active) = self.active.as_mut() else {
            return;
        };
        let is_crossfade = active.crossfade == Some(id);
        let is_master = active.master == id;
        let z_override = active.z_overrides.remove(&id);

        if is_crossfade {
            self.fade_complete();
        } else if let Some(elements) = z_override {
            self.clear_z_overrides(&elements);
        } else if is_master && self.phase == Phase::Animating {
            self.fade_complete();
            self.phase = Phase::Restoring;
            self.frame_tasks.push_back(FrameTask::AwaitOpacity);
        }
    }

    /// 帧边界回调：执行推迟的任务
    ///
    /// 本帧执行中新产生的任务留到下一帧。
    pub fn on_animation_frame(&mut self) {
        let tasks = std::mem::take(&mut self.frame_tasks);
        for task in tasks {
            match task {
                FrameTask::Retry(request) => {
                    debug!(scene = %request.scene, "重试被推迟的过渡请求");
                    self.dispatch(request);
                }
                FrameTask::AwaitOpacity => {
                    let converged = self.active.as_ref().is_none_or(|active| {
                        self.host.scene_opacity(active.target.root) >= 1.0 - OPACITY_EPSILON
                    });
                    let next = if converged {
                        FrameTask::Restore
                    } else {
                        FrameTask::AwaitOpacity
                    };
                    self.frame_tasks.push_back(next);
                }
                FrameTask::Restore => {
                    if self.phase == Phase::Restoring {
                        self.finish_restore();
                    }
                }
            }
        }
    }
}
