//! 过渡请求参数、结果与生命周期观察者。

use std::fmt;
use std::rc::Rc;

use crate::element::SceneRef;

/// 过渡生命周期观察者
///
/// 触发顺序：`on_prepare` → `on_start` → `on_progress`* → `on_end`。
/// 被打断的过渡同样会收到 `on_end`。
pub trait TransitionObserver {
    /// 场景解析完成、时间轴创建之前
    fn on_prepare(&self, _source: &SceneRef, _target: &SceneRef) {}

    /// 主时间轴开始播放
    fn on_start(&self, _source: &SceneRef, _target: &SceneRef) {}

    /// 主时间轴每次推进
    fn on_progress(&self, _progress: f64, _source: &SceneRef, _target: &SceneRef) {}

    /// 恢复完成、过渡结束
    fn on_end(&self, _source: &SceneRef, _target: &SceneRef) {}
}

/// 过渡参数
#[derive(Clone, Default)]
pub struct TransitionParams {
    /// 总时长（秒），`None` 使用配置默认值
    pub duration: Option<f64>,
    /// 缓动名称，`None` 使用 [`DEFAULT_EASE`]
    pub ease: Option<String>,
    /// 本次过渡的交叉淡化比例覆盖
    pub cross_fade_factor: Option<f64>,
    /// 生命周期观察者
    pub observer: Option<Rc<dyn TransitionObserver>>,
}

/// 未指定缓动时使用的缓动
pub const DEFAULT_EASE: &str = "easeInOut";

impl TransitionParams {
    /// 默认参数
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置总时长
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// 设置缓动
    pub fn with_ease(mut self, ease: impl Into<String>) -> Self {
        self.ease = Some(ease.into());
        self
    }

    /// 设置交叉淡化比例
    pub fn with_cross_fade_factor(mut self, factor: f64) -> Self {
        self.cross_fade_factor = Some(factor);
        self
    }

    /// 设置观察者
    pub fn with_observer(mut self, observer: Rc<dyn TransitionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

impl fmt::Debug for TransitionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionParams")
            .field("duration", &self.duration)
            .field("ease", &self.ease)
            .field("cross_fade_factor", &self.cross_fade_factor)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// 待执行的过渡请求
#[derive(Debug, Clone)]
pub(crate) struct TransitionRequest {
    pub scene: String,
    pub params: TransitionParams,
}

/// 请求被忽略的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// 场景名称不存在
    UnknownScene,
    /// 目标即当前场景
    SameScene,
    /// 没有当前场景
    NoCurrentScene,
    /// 场景根元素无法解析
    MissingRoot,
    /// 导航已到达场景列表的一端
    AtBoundary,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::UnknownScene => "场景不存在",
            Self::SameScene => "目标即当前场景",
            Self::NoCurrentScene => "没有当前场景",
            Self::MissingRoot => "场景根元素无法解析",
            Self::AtBoundary => "已到达场景列表末端",
        };
        write!(f, "{}", text)
    }
}

/// 过渡请求的结果
///
/// 触发操作从不返回错误，调用方只需按需检查结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// 过渡已开始
    Started,
    /// 打断了进行中的过渡，请求推迟到下一帧重试
    Deferred,
    /// 请求被忽略，状态未改变
    Ignored(IgnoreReason),
}

impl TransitionOutcome {
    /// 是否已开始或已排队
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Ignored(_))
    }
}

/// 过渡阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// 空闲
    #[default]
    Idle,
    /// 解析场景、建立快照
    Preparing,
    /// 主时间轴播放中
    Animating,
    /// 等待场景不透明度收敛并恢复快照
    Restoring,
}
