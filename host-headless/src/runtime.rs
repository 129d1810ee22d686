//! # Runtime 模块
//!
//! 逐帧推进的补间运行时，实现 [`TweenService`]。
//!
//! ## 时间轴
//!
//! 时间轴在 `play` 时展开为扁平的调度表：每个补间的绝对开始时间等于
//! 各级嵌入位置之和加上自身延迟；每个时间轴的结束时间是其子项结束时间的最大值。
//!
//! ```text
//! master ─┬─ spacer        [0, 1.0]
//!         ├─ crossfade     [0, 0.5]
//!         └─ pair ─┬─ target tween [0, 1.0]
//!                  └─ source tween [0, 1.0]
//! ```
//!
//! ## 事件顺序
//!
//! 同一帧内：补间完成 → 子时间轴完成（后序） → 根时间轴完成。

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use magic_move::element::ElementId;
use magic_move::error::TweenError;
use magic_move::host::SceneHost;
use magic_move::tween::{TweenEvent, TweenId, TweenService, TweenSpec};

use crate::easing::EasingFunction;
use crate::value::AnimatedValue;

/// 补间状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TweenState {
    /// 等待开始（有延迟）
    #[default]
    Pending,
    /// 正在播放
    Playing,
    /// 已完成
    Completed,
    /// 已被终止
    Killed,
}

impl TweenState {
    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Killed)
    }
}

/// 单个属性的补间轨道
#[derive(Debug, Clone)]
struct Track {
    name: String,
    from: AnimatedValue,
    to: AnimatedValue,
    /// 起点与终点的原始文本，端点处原样写入
    start_text: String,
    end_text: String,
}

/// 已校验的补间定义
#[derive(Debug, Clone)]
struct TweenDef {
    target: Option<ElementId>,
    tracks: Vec<Track>,
    delay: f64,
    duration: f64,
    easing: EasingFunction,
}

impl TweenDef {
    fn from_spec(spec: TweenSpec) -> Result<Self, TweenError> {
        for value in [spec.duration, spec.delay] {
            if !value.is_finite() || value < 0.0 {
                return Err(TweenError::InvalidDuration { duration: value });
            }
        }
        let easing = EasingFunction::from_name(&spec.ease).ok_or_else(|| TweenError::InvalidValue {
            property: "ease".to_string(),
            value: spec.ease.clone(),
        })?;

        let mut tracks = Vec::new();
        for (name, end) in spec.to.iter() {
            let start = spec.from.get(name).unwrap_or(end);
            let from = AnimatedValue::parse(start);
            let to = AnimatedValue::parse_end(&from, end).ok_or_else(|| TweenError::InvalidValue {
                property: name.to_string(),
                value: end.to_string(),
            })?;
            let end_text = if end.trim_start().starts_with("+=") || end.trim_start().starts_with("-=") {
                to.to_string()
            } else {
                end.trim().to_string()
            };
            tracks.push(Track {
                name: name.to_string(),
                from,
                to,
                start_text: start.trim().to_string(),
                end_text,
            });
        }
        // transform 的写入会重置旋转通道，必须先于通道写入
        tracks.sort_by_key(|track| track.name != "transform");

        Ok(Self {
            target: spec.target,
            tracks,
            delay: spec.delay,
            duration: spec.duration,
            easing,
        })
    }

    /// 写入局部进度 `t` 处的值
    fn render(&self, t: f64, host: &mut dyn SceneHost) {
        let Some(target) = self.target else {
            return;
        };
        for track in &self.tracks {
            if t <= 0.0 {
                host.set_style_property(target, &track.name, Some(&track.start_text));
            } else if t >= 1.0 {
                host.set_style_property(target, &track.name, Some(&track.end_text));
            } else {
                let eased = self.easing.apply(t);
                let value = track.from.sample(&track.to, eased).to_string();
                host.set_style_property(target, &track.name, Some(&value));
            }
        }
    }
}

/// 未播放的节点
#[derive(Debug, Clone)]
enum Node {
    Tween(TweenDef),
    Timeline(Vec<(f64, TweenId)>),
}

#[derive(Debug)]
struct ScheduledTween {
    id: TweenId,
    def: TweenDef,
    /// 绝对开始时间（含延迟）
    start: f64,
    state: TweenState,
}

impl ScheduledTween {
    fn local_progress(&self, now: f64) -> f64 {
        if self.def.duration <= 0.0 {
            1.0
        } else {
            ((now - self.start) / self.def.duration).clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug)]
struct ScheduledTimeline {
    id: TweenId,
    end: f64,
    completed: bool,
}

/// 播放中的根节点
#[derive(Debug)]
struct Playback {
    root: TweenId,
    elapsed: f64,
    total: f64,
    tweens: Vec<ScheduledTween>,
    /// 后序排列，根时间轴（如果根是时间轴）在最后
    timelines: Vec<ScheduledTimeline>,
}

impl Playback {
    fn is_finished(&self) -> bool {
        self.tweens.iter().all(|t| t.state.is_finished())
            && self.timelines.iter().all(|t| t.completed)
    }

    fn progress(&self) -> f64 {
        if self.total <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.total).clamp(0.0, 1.0)
        }
    }
}

/// 补间运行时
#[derive(Debug, Default)]
pub struct TweenRuntime {
    nodes: HashMap<TweenId, Node>,
    playing: Vec<Playback>,
    events: Vec<TweenEvent>,
    next_id: u64,
}

impl TweenRuntime {
    /// 创建运行时
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self) -> TweenId {
        self.next_id += 1;
        TweenId(self.next_id)
    }

    /// 是否没有正在播放的时间轴
    pub fn is_idle(&self) -> bool {
        self.playing.is_empty()
    }

    /// 正在播放的根节点数量
    pub fn active_count(&self) -> usize {
        self.playing.len()
    }

    /// 展开节点树；节点从定义表中移出
    fn flatten(
        &mut self,
        id: TweenId,
        offset: f64,
        tweens: &mut Vec<ScheduledTween>,
        timelines: &mut Vec<ScheduledTimeline>,
    ) -> f64 {
        match self.nodes.remove(&id) {
            Some(Node::Tween(def)) => {
                let start = offset + def.delay;
                let end = start + def.duration;
                tweens.push(ScheduledTween {
                    id,
                    def,
                    start,
                    state: TweenState::Pending,
                });
                end
            }
            Some(Node::Timeline(children)) => {
                let mut end = offset;
                for (position, child) in children {
                    end = end.max(self.flatten(child, offset + position, tweens, timelines));
                }
                timelines.push(ScheduledTimeline {
                    id,
                    end,
                    completed: false,
                });
                end
            }
            None => offset,
        }
    }

    fn schedule(&mut self, root: TweenId) -> Option<Playback> {
        if !self.nodes.contains_key(&root) {
            return None;
        }
        let mut tweens = Vec::new();
        let mut timelines = Vec::new();
        let total = self.flatten(root, 0.0, &mut tweens, &mut timelines);
        Some(Playback {
            root,
            elapsed: 0.0,
            total,
            tweens,
            timelines,
        })
    }

    /// 推进 `dt` 秒，把当前值写入宿主
    pub fn advance(&mut self, dt: f64, host: &mut dyn SceneHost) {
        for playback in &mut self.playing {
            playback.elapsed += dt;
            let now = playback.elapsed;

            for tween in &mut playback.tweens {
                if tween.state.is_finished() || now < tween.start {
                    continue;
                }
                tween.state = TweenState::Playing;
                let t = tween.local_progress(now);
                tween.def.render(t, host);
                if t >= 1.0 {
                    tween.state = TweenState::Completed;
                    self.events.push(TweenEvent::Completed(tween.id));
                }
            }

            if !playback.timelines.is_empty() {
                self.events.push(TweenEvent::Updated {
                    id: playback.root,
                    progress: playback.progress(),
                });
            }

            for timeline in &mut playback.timelines {
                if !timeline.completed && now >= timeline.end {
                    timeline.completed = true;
                    self.events.push(TweenEvent::Completed(timeline.id));
                }
            }
        }

        self.playing.retain(|playback| {
            let finished = playback.is_finished();
            if finished {
                trace!(root = %playback.root, "时间轴播放结束");
            }
            !finished
        });
    }
}

impl TweenService for TweenRuntime {
    fn create_timeline(&mut self) -> TweenId {
        let id = self.alloc();
        self.nodes.insert(id, Node::Timeline(Vec::new()));
        id
    }

    fn add_tween(
        &mut self,
        timeline: TweenId,
        position: f64,
        spec: TweenSpec,
    ) -> Result<TweenId, TweenError> {
        if !matches!(self.nodes.get(&timeline), Some(Node::Timeline(_))) {
            return Err(TweenError::UnknownTimeline { id: timeline.0 });
        }
        let def = TweenDef::from_spec(spec)?;
        let id = self.alloc();
        self.nodes.insert(id, Node::Tween(def));
        if let Some(Node::Timeline(children)) = self.nodes.get_mut(&timeline) {
            children.push((position, id));
        }
        Ok(id)
    }

    fn add_timeline(
        &mut self,
        parent: TweenId,
        position: f64,
        child: TweenId,
    ) -> Result<(), TweenError> {
        if !matches!(self.nodes.get(&child), Some(Node::Timeline(_))) {
            return Err(TweenError::UnknownTimeline { id: child.0 });
        }
        match self.nodes.get_mut(&parent) {
            Some(Node::Timeline(children)) => {
                children.push((position, child));
                Ok(())
            }
            _ => Err(TweenError::UnknownTimeline { id: parent.0 }),
        }
    }

    fn play(&mut self, timeline: TweenId, host: &mut dyn SceneHost) {
        if self.playing.iter().any(|p| p.root == timeline) {
            debug!(timeline = %timeline, "时间轴已在播放");
            return;
        }
        let Some(playback) = self.schedule(timeline) else {
            warn!(timeline = %timeline, "时间轴不存在，无法播放");
            return;
        };

        // 起始值立即生效，即使补间带有延迟
        for tween in &playback.tweens {
            tween.def.render(0.0, host);
        }
        debug!(
            timeline = %timeline,
            tweens = playback.tweens.len(),
            total = playback.total,
            "开始播放"
        );
        self.events.push(TweenEvent::Started(timeline));
        self.playing.push(playback);
    }

    fn tween(&mut self, spec: TweenSpec, host: &mut dyn SceneHost) -> Result<TweenId, TweenError> {
        let def = TweenDef::from_spec(spec)?;
        let id = self.alloc();
        self.nodes.insert(id, Node::Tween(def));
        self.play(id, host);
        Ok(id)
    }

    fn kill_tweens_of(&mut self, targets: &[ElementId]) {
        let mut killed = 0usize;
        for playback in &mut self.playing {
            for tween in &mut playback.tweens {
                let hit = tween.def.target.is_some_and(|t| targets.contains(&t));
                if hit && !tween.state.is_finished() {
                    tween.state = TweenState::Killed;
                    killed += 1;
                }
            }
        }
        if killed > 0 {
            debug!(killed, "终止补间");
        }
    }

    fn complete(&mut self, timeline: TweenId, host: &mut dyn SceneHost) {
        let playback = match self.playing.iter().position(|p| p.root == timeline) {
            Some(index) => self.playing.remove(index),
            None => match self.schedule(timeline) {
                Some(playback) => playback,
                None => {
                    debug!(timeline = %timeline, "时间轴不存在，忽略强制完成");
                    return;
                }
            },
        };
        for tween in &playback.tweens {
            if !tween.state.is_finished() {
                tween.def.render(1.0, host);
            }
        }
        debug!(timeline = %timeline, "时间轴强制完成");
    }

    fn kill(&mut self, timeline: TweenId) {
        if let Some(index) = self.playing.iter().position(|p| p.root == timeline) {
            self.playing.remove(index);
        } else if self.schedule(timeline).is_none() {
            debug!(timeline = %timeline, "时间轴不存在，忽略终止");
        }
    }

    fn progress(&self, timeline: TweenId) -> Option<f64> {
        self.playing
            .iter()
            .find(|p| p.root == timeline)
            .map(Playback::progress)
    }

    fn pending_targets(&self, timeline: TweenId) -> Vec<ElementId> {
        let Some(playback) = self.playing.iter().find(|p| p.root == timeline) else {
            return Vec::new();
        };
        let mut targets: Vec<ElementId> = playback
            .tweens
            .iter()
            .filter(|t| !t.state.is_finished())
            .filter_map(|t| t.def.target)
            .collect();
        targets.sort();
        targets.dedup();
        targets
    }

    fn drain_events(&mut self) -> Vec<TweenEvent> {
        std::mem::take(&mut self.events)
    }
}
