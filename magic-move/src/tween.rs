//! # Tween 模块
//!
//! 外部补间服务接口。
//!
//! 核心不做插值、不计算缓动，只描述"哪个元素的哪些属性在什么时间从 A 变到 B"，
//! 由补间服务负责逐帧推进。补间服务通过事件队列回报进度与完成：
//!
//! ```text
//! MagicMove                      TweenService
//!   │── create_timeline / add_tween ──►│
//!   │── play ─────────────────────────►│
//!   │                                  │ 逐帧推进
//!   │◄──────── drain_events ───────────│
//! ```

use serde::{Deserialize, Serialize};

use crate::element::ElementId;
use crate::error::TweenError;
use crate::host::SceneHost;
use crate::property::PropertyMap;

/// 补间 / 时间轴句柄
///
/// 补间与时间轴共用同一句柄空间。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TweenId(pub u64);

impl std::fmt::Display for TweenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tween:{}", self.0)
    }
}

/// 单个补间描述
///
/// 补间结束后属性停留在 `to`（fill-forward）。
/// `to` 中形如 `+=370` 的值表示相对 `from` 的增量。
#[derive(Debug, Clone, PartialEq)]
pub struct TweenSpec {
    /// 目标元素；`None` 表示无效果的占位补间
    pub target: Option<ElementId>,
    /// 起始属性
    pub from: PropertyMap,
    /// 结束属性
    pub to: PropertyMap,
    /// 时长（秒）
    pub duration: f64,
    /// 延迟（秒）
    pub delay: f64,
    /// 缓动名称
    pub ease: String,
}

impl TweenSpec {
    /// 创建补间
    pub fn new(target: ElementId, from: PropertyMap, to: PropertyMap, duration: f64) -> Self {
        Self {
            target: Some(target),
            from,
            to,
            duration,
            delay: 0.0,
            ease: "linear".to_string(),
        }
    }

    /// 创建仅占据时长的空补间
    pub fn spacer(duration: f64) -> Self {
        Self {
            target: None,
            from: PropertyMap::new(),
            to: PropertyMap::new(),
            duration,
            delay: 0.0,
            ease: "linear".to_string(),
        }
    }

    /// 设置延迟
    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    /// 设置缓动
    pub fn with_ease(mut self, ease: impl Into<String>) -> Self {
        self.ease = ease.into();
        self
    }
}

/// 补间服务事件
#[derive(Debug, Clone, PartialEq)]
pub enum TweenEvent {
    /// 补间 / 时间轴开始播放
    Started(TweenId),
    /// 时间轴进度更新（0.0 - 1.0）
    Updated {
        /// 时间轴
        id: TweenId,
        /// 归一化进度
        progress: f64,
    },
    /// 补间 / 时间轴自然完成
    Completed(TweenId),
}

/// 外部补间服务
///
/// ## 实现约定
///
/// - 时间轴创建后处于暂停状态，直到 `play`
/// - `play` 立即把各补间的起始值写入元素（即使补间带有延迟）
/// - `complete` 立即把时间轴跳到结尾：写入所有补间的最终值并移除，**不产生事件**
/// - 嵌套时间轴的完成同样产生 `Completed` 事件，且先于父时间轴
/// - 属性值通过传入的宿主写入，补间服务自身不持有场景图
pub trait TweenService {
    /// 创建空时间轴
    fn create_timeline(&mut self) -> TweenId;

    /// 在时间轴的 `position` 秒处加入补间
    fn add_tween(
        &mut self,
        timeline: TweenId,
        position: f64,
        spec: TweenSpec,
    ) -> Result<TweenId, TweenError>;

    /// 把子时间轴嵌入父时间轴的 `position` 秒处
    fn add_timeline(
        &mut self,
        parent: TweenId,
        position: f64,
        child: TweenId,
    ) -> Result<(), TweenError>;

    /// 开始播放时间轴
    fn play(&mut self, timeline: TweenId, host: &mut dyn SceneHost);

    /// 创建并立即播放一个独立补间
    fn tween(&mut self, spec: TweenSpec, host: &mut dyn SceneHost) -> Result<TweenId, TweenError>;

    /// 终止作用于给定元素的所有补间（停留在当前值）
    fn kill_tweens_of(&mut self, targets: &[ElementId]);

    /// 强制完成时间轴
    fn complete(&mut self, timeline: TweenId, host: &mut dyn SceneHost);

    /// 终止时间轴（停留在当前值）
    fn kill(&mut self, timeline: TweenId);

    /// 时间轴当前进度
    fn progress(&self, timeline: TweenId) -> Option<f64>;

    /// 时间轴中尚未完成的补间所作用的元素
    fn pending_targets(&self, timeline: TweenId) -> Vec<ElementId>;

    /// 取出积压的事件
    fn drain_events(&mut self) -> Vec<TweenEvent>;
}
