//! # Error 模块
//!
//! 定义 magic-move 中使用的错误类型。
//!
//! 过渡触发接口本身不返回错误（结果通过 `TransitionOutcome` 表达），
//! 这里的错误只出现在配置读写与补间创建等可局部恢复的位置。

use thiserror::Error;

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),

    /// 未知配置项
    #[error("未知配置项 '{key}'")]
    UnknownKey { key: String },

    /// 配置项值类型不匹配
    #[error("配置项 '{key}' 的值无效 - {message}")]
    InvalidValue { key: String, message: String },
}

/// 补间服务错误
///
/// 由补间服务在拒绝单个补间时返回；编排器记录警告后继续构建其余时间轴。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TweenError {
    /// 时间轴不存在或已结束
    #[error("时间轴 {id} 不存在")]
    UnknownTimeline { id: u64 },

    /// 属性值无法被补间
    #[error("属性 '{property}' 的值 '{value}' 无法补间")]
    InvalidValue { property: String, value: String },

    /// 时长无效
    #[error("无效的补间时长 {duration}")]
    InvalidDuration { duration: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TweenError::InvalidDuration { duration: -1.0 };
        assert!(err.to_string().contains("-1"));
        let err = ConfigError::UnknownKey {
            key: "fade".to_string(),
        };
        assert_eq!(err.to_string(), "未知配置项 'fade'");
    }
}
