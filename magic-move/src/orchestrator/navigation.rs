//! 场景导航简写。
//!
//! | 写法 | 含义 |
//! |------|------|
//! | `>` | 下一个场景 |
//! | `<` | 上一个场景 |
//! | `>Base` | 之后第一个名称以 `Base` 开头的场景 |
//! | `<Base` | 之前第一个名称以 `Base` 开头的场景 |
//! | 其他 | 场景名称 |
//!
//! 到达场景列表两端时不回绕。

use tracing::debug;

use super::request::{IgnoreReason, TransitionOutcome, TransitionParams};
use super::MagicMove;
use crate::host::SceneHost;
use crate::tween::TweenService;

/// 把导航写法解析为场景名称
pub fn resolve_navigation(
    scenes: &[String],
    current: Option<&str>,
    target: &str,
) -> Result<String, IgnoreReason> {
    let target = target.trim();
    let (forward, prefix) = if let Some(prefix) = target.strip_prefix('>') {
        (true, prefix.trim())
    } else if let Some(prefix) = target.strip_prefix('<') {
        (false, prefix.trim())
    } else {
        return Ok(target.to_string());
    };

    let current = current.ok_or(IgnoreReason::NoCurrentScene)?;
    let index = scenes
        .iter()
        .position(|s| s == current)
        .ok_or(IgnoreReason::NoCurrentScene)?;

    let found = if forward {
        scenes[index + 1..].iter().find(|s| s.starts_with(prefix))
    } else {
        scenes[..index].iter().rev().find(|s| s.starts_with(prefix))
    };
    found.cloned().ok_or(IgnoreReason::AtBoundary)
}

impl<H: SceneHost, T: TweenService> MagicMove<H, T> {
    /// 按导航写法过渡
    pub fn navigate(&mut self, target: &str, params: TransitionParams) -> TransitionOutcome {
        let scenes = self.host.scene_names();
        let current = self.host.current_scene_name();
        match resolve_navigation(&scenes, current.as_deref(), target) {
            Ok(scene) => self.show_scene_named(&scene, params),
            Err(reason) => {
                debug!(target = %target, reason = %reason, "导航无目标");
                TransitionOutcome::Ignored(reason)
            }
        }
    }

    /// 过渡到下一个场景
    pub fn show_next_scene(&mut self, params: TransitionParams) -> TransitionOutcome {
        self.navigate(">", params)
    }

    /// 过渡到上一个场景
    pub fn show_previous_scene(&mut self, params: TransitionParams) -> TransitionOutcome {
        self.navigate("<", params)
    }
}
