//! # Config 模块
//!
//! 过渡引擎配置，集中管理所有可调参数。
//!
//! 每个 `MagicMove` 实例持有一份配置，多个文档之间互不影响。
//!
//! ## 配置优先级
//!
//! 1. 运行期 `set` / `replace`（最高）
//! 2. 配置文件（JSON）
//! 3. 默认值（最低）

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ConfigError;

/// 过渡引擎配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagicConfig {
    /// 缓动别名（作者使用的名称 → 补间服务的名称）
    #[serde(default = "default_ease_aliases")]
    pub ease_aliases: BTreeMap<String, String>,

    /// 参与过渡的属性列表
    ///
    /// 不在列表中的属性对引擎不可见。
    #[serde(default = "default_tracked_properties")]
    pub tracked_properties: Vec<String>,

    /// 跳过的属性（不读取也不补间）
    #[serde(default = "default_skip_properties")]
    pub skip_properties: Vec<String>,

    /// 属性未设置时使用的默认值
    #[serde(default = "default_property_defaults")]
    pub property_defaults: BTreeMap<String, String>,

    /// 场景交叉淡化占总时长的比例
    #[serde(default = "default_cross_fade_factor")]
    pub cross_fade_factor: f64,

    /// 默认过渡时长（秒）
    #[serde(default = "default_duration")]
    pub default_duration: f64,

    /// 单元素动画默认时长（秒）
    #[serde(default = "default_animation_duration")]
    pub default_animation_duration: f64,

    /// 补间属性 → 宿主原生属性映射（单元素动画结束后回写）
    #[serde(default = "default_host_property_map")]
    pub host_property_map: BTreeMap<String, String>,

    /// 是否拆分 transform 中的旋转通道
    #[serde(default = "default_decompose_transforms")]
    pub decompose_transforms: bool,
}

// 默认值函数
fn default_ease_aliases() -> BTreeMap<String, String> {
    [
        ("linear", "linear"),
        ("easein", "ease-in"),
        ("easeout", "ease-out"),
        ("easeinout", "ease-in-out"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_tracked_properties() -> Vec<String> {
    [
        "left",
        "top",
        "width",
        "height",
        "opacity",
        "transform",
        "background-color",
        "color",
        "border-radius",
        "border-width",
        "border-color",
        "font-size",
        "font-family",
        "letter-spacing",
        "line-height",
        "box-shadow",
        "filter",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_skip_properties() -> Vec<String> {
    vec!["font-family".to_string()]
}

fn default_property_defaults() -> BTreeMap<String, String> {
    [
        ("left", "0px"),
        ("top", "0px"),
        ("width", "auto"),
        ("height", "auto"),
        ("opacity", "1"),
        ("transform", "none"),
        ("background-color", "transparent"),
        ("border-radius", "0px"),
        ("border-width", "0px"),
        ("letter-spacing", "normal"),
        ("line-height", "normal"),
        ("box-shadow", "none"),
        ("filter", "none"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_cross_fade_factor() -> f64 {
    0.5
}

fn default_duration() -> f64 {
    1.0
}

fn default_animation_duration() -> f64 {
    0.5
}

fn default_host_property_map() -> BTreeMap<String, String> {
    [
        ("left", "left"),
        ("top", "top"),
        ("width", "width"),
        ("height", "height"),
        ("opacity", "opacity"),
        ("rotate", "rotateZ"),
        ("rotateZ", "rotateZ"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_decompose_transforms() -> bool {
    true
}

impl Default for MagicConfig {
    fn default() -> Self {
        Self {
            ease_aliases: default_ease_aliases(),
            tracked_properties: default_tracked_properties(),
            skip_properties: default_skip_properties(),
            property_defaults: default_property_defaults(),
            cross_fade_factor: default_cross_fade_factor(),
            default_duration: default_duration(),
            default_animation_duration: default_animation_duration(),
            host_property_map: default_host_property_map(),
            decompose_transforms: default_decompose_transforms(),
        }
    }
}

impl MagicConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = ?path, "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = ?path, "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cross_fade_factor > 0.0 && self.cross_fade_factor <= 1.0) {
            return Err(ConfigError::ValidationFailed(
                "cross_fade_factor 必须在 (0.0, 1.0] 之间".to_string(),
            ));
        }

        if self.default_duration < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "default_duration 不能为负".to_string(),
            ));
        }

        if self.default_animation_duration < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "default_animation_duration 不能为负".to_string(),
            ));
        }

        Ok(())
    }

    /// 按键读取配置项
    pub fn get(&self, key: &str) -> Option<Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.get(key).cloned(),
            _ => None,
        }
    }

    /// 按键写入配置项
    ///
    /// 写入后的配置必须仍能通过反序列化与 [`validate`](Self::validate)，否则保持原值。
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        let mut map = match serde_json::to_value(&*self) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(ConfigError::SerializationFailed(
                    "配置未序列化为对象".to_string(),
                ));
            }
            Err(e) => return Err(ConfigError::SerializationFailed(e.to_string())),
        };

        if !map.contains_key(key) {
            return Err(ConfigError::UnknownKey {
                key: key.to_string(),
            });
        }
        map.insert(key.to_string(), value);

        let updated: MagicConfig =
            serde_json::from_value(Value::Object(map)).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;

        *self = updated;
        Ok(())
    }

    /// 整体替换配置
    pub fn replace(&mut self, other: MagicConfig) -> Result<(), ConfigError> {
        other.validate()?;
        *self = other;
        Ok(())
    }

    /// 属性是否参与过渡（在追踪列表中且不在跳过列表中）
    pub fn is_tracked(&self, name: &str) -> bool {
        self.tracked_properties.iter().any(|p| p == name)
            && !self.skip_properties.iter().any(|p| p == name)
    }

    /// 参与过渡的属性
    pub fn effective_properties(&self) -> impl Iterator<Item = &str> {
        self.tracked_properties
            .iter()
            .map(String::as_str)
            .filter(|p| !self.skip_properties.iter().any(|s| s == p))
    }

    /// 解析缓动名称（别名大小写不敏感，未知名称原样返回）
    pub fn resolve_ease(&self, name: &str) -> String {
        self.ease_aliases
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = MagicConfig::default();
        assert_eq!(config.cross_fade_factor, 0.5);
        assert!(config.decompose_transforms);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MagicConfig = serde_json::from_str(r#"{ "cross_fade_factor": 0.25 }"#).unwrap();
        assert_eq!(config.cross_fade_factor, 0.25);
        assert_eq!(config.default_duration, 1.0);
        assert!(config.is_tracked("left"));
    }

    #[test]
    fn test_skip_list_hides_property() {
        let config = MagicConfig::default();
        assert!(!config.is_tracked("font-family"));
        assert!(!config.is_tracked("z-index"));
        assert!(!config.effective_properties().any(|p| p == "font-family"));
    }

    #[test]
    fn test_get_and_set_by_key() {
        let mut config = MagicConfig::default();
        assert_eq!(config.get("default_duration"), Some(json!(1.0)));

        config.set("default_duration", json!(2.5)).unwrap();
        assert_eq!(config.default_duration, 2.5);

        config
            .set("skip_properties", json!(["font-family", "color"]))
            .unwrap();
        assert!(!config.is_tracked("color"));
    }

    #[test]
    fn test_set_rejects_unknown_key() {
        let mut config = MagicConfig::default();
        let err = config.set("nope", json!(1)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownKey {
                key: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_set_rejects_invalid_value_and_keeps_old() {
        let mut config = MagicConfig::default();
        assert!(config.set("cross_fade_factor", json!("half")).is_err());
        assert!(config.set("cross_fade_factor", json!(0.0)).is_err());
        assert_eq!(config.cross_fade_factor, 0.5);
    }

    #[test]
    fn test_resolve_ease() {
        let config = MagicConfig::default();
        assert_eq!(config.resolve_ease("EaseInOut"), "ease-in-out");
        assert_eq!(config.resolve_ease("bounce-out"), "bounce-out");
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let config = MagicConfig::load("/nonexistent/magic-move.json");
        assert_eq!(config, MagicConfig::default());
    }
}
