//! # Host Headless
//!
//! 无渲染宿主：为 `magic-move` 提供可运行的协作方。
//!
//! ## 架构概述
//!
//! ```text
//! ScenePlayer
//!   │
//!   ├── HeadlessDocument   SceneHost：JSON 场景树、内联样式、场景角色
//!   ├── TweenRuntime       TweenService：时间轴展开、缓动插值、事件队列
//!   └── MagicMove          过渡编排
//! ```
//!
//! ## 模块结构
//!
//! - [`document`]：内存场景文档
//! - [`runtime`]：逐帧补间运行时
//! - [`easing`]：缓动函数
//! - [`value`]：属性值解析与插值
//! - [`player`]：固定帧长驱动

pub mod document;
pub mod easing;
pub mod error;
pub mod player;
pub mod runtime;
pub mod value;

pub use document::{DocumentSpec, HeadlessDocument, NodeSpec};
pub use easing::EasingFunction;
pub use error::{HeadlessError, HeadlessResult};
pub use player::{DEFAULT_FRAME_STEP, DEFAULT_MAX_FRAMES, HeadlessEngine, ScenePlayer};
pub use runtime::{TweenRuntime, TweenState};
pub use value::AnimatedValue;
