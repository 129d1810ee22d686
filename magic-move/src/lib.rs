//! # Magic Move
//!
//! 场景过渡引擎的核心库。
//!
//! ## 架构概述
//!
//! `magic-move` 不持有文档，也不计时。它通过两个 trait 与宿主协作：
//!
//! ```text
//! Host                                MagicMove
//!   │                                     │
//!   │──── show_scene_named / navigate ──►│ 匹配元素、组装时间轴
//!   │                                     │
//!   │◄─── SceneHost 读写样式/行为 ───────│
//!   │◄─── TweenService 创建/播放时间轴 ──│
//!   │                                     │
//!   │──── handle_tween_events ──────────►│ 淡入完成、清除叠放、进入恢复
//!   │──── on_animation_frame ───────────►│ 等待不透明度、恢复、重试
//! ```
//!
//! ## 核心类型
//!
//! - [`MagicMove`]：过渡编排器
//! - [`SceneHost`]：宿主文档访问接口
//! - [`TweenService`]：补间服务接口
//! - [`MagicConfig`]：实例级配置
//! - [`PropertyMap`]：属性名 → 属性值
//!
//! ## 使用示例
//!
//! ```ignore
//! use magic_move::{MagicConfig, MagicMove, TransitionParams};
//!
//! let mut engine = MagicMove::new(document, tweens, MagicConfig::default());
//! engine.show_scene_named("Detail", TransitionParams::new().with_duration(0.8));
//!
//! // 每帧
//! let (host, tweens) = engine.parts_mut();
//! tweens.advance(dt, host);
//! engine.handle_tween_events();
//! engine.on_animation_frame();
//! ```
//!
//! ## 模块结构
//!
//! - [`identifier`] / [`matching`]：标识符提取与跨场景配对
//! - [`snapshot`]：初始快照与恢复列表
//! - [`timing`] / [`transform`] / [`zorder`]：逐元素的时间、旋转与叠放
//! - [`registry`]：具名动画
//! - [`orchestrator`]：过渡状态机
//! - [`diagnostic`]：场景静态检查

pub mod config;
pub mod diagnostic;
pub mod element;
pub mod error;
pub mod host;
pub mod identifier;
pub mod matching;
pub mod orchestrator;
pub mod property;
pub mod registry;
pub mod snapshot;
pub mod timing;
pub mod transform;
pub mod tween;
pub mod zorder;

#[cfg(test)]
mod test_support;

// 重导出核心类型
pub use config::MagicConfig;
pub use diagnostic::{Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_scenes};
pub use element::{ElementId, LayoutInfo, SceneActivation, SceneRef, SceneRole, attributes};
pub use error::{ConfigError, TweenError};
pub use host::SceneHost;
pub use matching::{MatchResult, match_elements};
pub use orchestrator::{
    AnimateRequest, AnimateTarget, AnimationDirection, IgnoreReason, MagicMove, Phase,
    TransitionObserver, TransitionOutcome, TransitionParams, behaviors,
};
pub use property::PropertyMap;
pub use registry::{AnimationRegistry, AnimationSpec};
pub use snapshot::PropertySnapshotStore;
pub use tween::{TweenEvent, TweenId, TweenService, TweenSpec};
