//! # Error 模块
//!
//! 定义 sim-runtime 中使用的错误类型。
//!
//! 大部分错误属于"软失败"：调用方会收到 `Err`，同时运行时记录日志，
//! 场景本身保持可用，不会 panic。

use std::path::PathBuf;

use thiserror::Error;

/// 颜色解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColorError {
    /// 十六进制颜色格式无效
    #[error("无效的十六进制颜色 '{input}'")]
    InvalidHex { input: String },
}

/// 场景图错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// 把集合加入自身或其子孙，会形成环
    #[error("元素 {element} 不能加入集合 {collection}：会形成环")]
    Cycle { element: u64, collection: u64 },
}

/// 事件订阅错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventError {
    /// 未知事件名
    #[error("未知事件 '{name}'，有效事件为 {valid}")]
    UnknownEvent { name: String, valid: String },

    /// hover 事件缺少离开回调
    #[error("'hover' 事件需要两个回调（进入 / 离开）")]
    MissingLeaveCallback,
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("无法读取配置文件 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置 JSON 格式错误
    #[error("配置解析失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 配置值无效
    #[error("配置验证失败: {0}")]
    Validation(String),
}

/// sim-runtime 统一错误类型
#[derive(Error, Debug)]
pub enum SimError {
    /// 颜色错误
    #[error("颜色错误: {0}")]
    Color(#[from] ColorError),

    /// 场景图错误
    #[error("场景错误: {0}")]
    Scene(#[from] SceneError),

    /// 事件错误
    #[error("事件错误: {0}")]
    Event(#[from] EventError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// Result 类型别名
pub type SimResult<T> = Result<T, SimError>;
