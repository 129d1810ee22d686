//! # Error 模块
//!
//! 无渲染宿主的错误类型。

use thiserror::Error;

/// 宿主错误
#[derive(Error, Debug)]
pub enum HeadlessError {
    /// 文件读取失败
    #[error("文档读取失败: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 解析失败
    #[error("文档解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    /// 场景重名
    #[error("场景 '{0}' 重复定义")]
    DuplicateScene(String),

    /// 场景既没有 root 也没有 layouts，或两者同时存在
    #[error("场景 '{0}' 必须且只能声明 root 或 layouts 之一")]
    InvalidScene(String),

    /// 引用了不存在的场景
    #[error("场景 '{0}' 不存在")]
    UnknownScene(String),

    /// 过渡在给定帧数内没有回到空闲
    #[error("{frames} 帧后过渡仍未结束")]
    Stalled { frames: u64 },
}

/// Result 类型别名
pub type HeadlessResult<T> = Result<T, HeadlessError>;
