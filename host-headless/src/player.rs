//! # Player 模块
//!
//! 以固定帧长驱动编排器与补间运行时。
//!
//! 每帧顺序：
//! 1. 补间运行时推进并写入文档
//! 2. 编排器消费补间事件
//! 3. 编排器执行帧边界任务

use tracing::{debug, info};

use magic_move::config::MagicConfig;
use magic_move::diagnostic::{DiagnosticResult, analyze_scenes};
use magic_move::host::SceneHost;
use magic_move::orchestrator::{MagicMove, Phase, TransitionOutcome, TransitionParams};

use crate::document::HeadlessDocument;
use crate::error::{HeadlessError, HeadlessResult};
use crate::runtime::TweenRuntime;

/// 默认帧长（60 FPS）
pub const DEFAULT_FRAME_STEP: f64 = 1.0 / 60.0;

/// 默认的最大帧数，超出视为过渡卡住
pub const DEFAULT_MAX_FRAMES: u64 = 60 * 60;

/// 编排器的具体类型
pub type HeadlessEngine = MagicMove<HeadlessDocument, TweenRuntime>;

/// 场景播放器
pub struct ScenePlayer {
    engine: HeadlessEngine,
    frame_step: f64,
    frames: u64,
}

impl ScenePlayer {
    /// 创建播放器，并注册文档声明的具名动画
    pub fn new(document: HeadlessDocument, config: MagicConfig) -> Self {
        let animations = document.animations().clone();
        let mut engine = MagicMove::new(document, TweenRuntime::new(), config);
        for (name, spec) in animations {
            engine.register_animation(&name, spec);
        }
        Self {
            engine,
            frame_step: DEFAULT_FRAME_STEP,
            frames: 0,
        }
    }

    /// 设置帧长（秒）
    pub fn with_frame_step(mut self, step: f64) -> Self {
        self.frame_step = step;
        self
    }

    pub fn engine(&self) -> &HeadlessEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut HeadlessEngine {
        &mut self.engine
    }

    /// 文档
    pub fn document(&self) -> &HeadlessDocument {
        self.engine.host()
    }

    /// 已推进的帧数
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 已推进的时间（秒）
    pub fn elapsed(&self) -> f64 {
        self.frames as f64 * self.frame_step
    }

    /// 按导航写法请求过渡
    pub fn transition(&mut self, target: &str, params: TransitionParams) -> TransitionOutcome {
        let outcome = self.engine.navigate(target, params);
        debug!(target = %target, outcome = ?outcome, frame = self.frames, "过渡请求");
        outcome
    }

    /// 检查从当前场景过渡到 `target` 的匹配情况
    pub fn diagnose(&self, target: &str) -> DiagnosticResult {
        let source = self.document().current_scene_name().unwrap_or_default();
        analyze_scenes(self.document(), self.engine.registry(), &source, target)
    }

    /// 推进一帧
    pub fn step(&mut self) {
        let dt = self.frame_step;
        let (document, runtime) = self.engine.parts_mut();
        runtime.advance(dt, document);
        self.engine.handle_tween_events();
        self.engine.on_animation_frame();
        self.frames += 1;
    }

    /// 没有进行中的过渡、帧任务与补间
    pub fn is_settled(&self) -> bool {
        self.engine.phase() == Phase::Idle
            && !self.engine.has_pending_frame_tasks()
            && self.engine.tweener().is_idle()
    }

    /// 一直推进到稳定，返回推进的帧数
    pub fn run_until_settled(&mut self, max_frames: u64) -> HeadlessResult<u64> {
        let start = self.frames;
        while !self.is_settled() {
            if self.frames - start >= max_frames {
                return Err(HeadlessError::Stalled { frames: max_frames });
            }
            self.step();
        }
        let frames = self.frames - start;
        info!(frames, elapsed = self.elapsed(), "播放稳定");
        Ok(frames)
    }
}
