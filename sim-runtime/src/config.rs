//! # Config 模块
//!
//! 舞台配置。帧率和背景色属于舞台本身，不是全局状态。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高，由宿主覆盖）
//! 2. 配置文件（JSON）
//! 3. 默认值（最低）

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::color::Color;
use crate::error::ConfigError;

/// 舞台配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// 绘图表面 id
    #[serde(default = "default_surface_id")]
    pub surface_id: String,

    /// 帧率，创建舞台后不可修改
    #[serde(default = "default_fps")]
    pub fps: f64,

    /// 绘图表面宽度
    #[serde(default = "default_width")]
    pub width: f64,

    /// 绘图表面高度
    #[serde(default = "default_height")]
    pub height: f64,

    /// 是否跟随容器尺寸（resize 时重新读取容器尺寸）
    #[serde(default)]
    pub fit_container: bool,

    /// 背景色（十六进制）
    #[serde(default = "default_background")]
    pub background: String,
}

// 默认值函数
fn default_surface_id() -> String {
    "canvas".to_string()
}

fn default_fps() -> f64 {
    60.0
}

fn default_width() -> f64 {
    800.0
}

fn default_height() -> f64 {
    600.0
}

fn default_background() -> String {
    "#ffffff".to_string()
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            surface_id: default_surface_id(),
            fps: default_fps(),
            width: default_width(),
            height: default_height(),
            fit_container: false,
            background: default_background(),
        }
    }
}

impl StageConfig {
    /// 从 JSON 字符串解析
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// 从文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&content)?;
        info!(path = %path.display(), "配置文件加载成功");
        Ok(config)
    }

    /// 从文件加载；文件不存在或解析失败时使用默认配置并记录警告
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            warn!(error = %e, "配置文件加载失败，使用默认配置");
            Self::default()
        })
    }

    /// 序列化为格式化的 JSON
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.surface_id.is_empty() {
            return Err(ConfigError::Validation("surface_id 不能为空".to_string()));
        }
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(ConfigError::Validation(format!("fps 必须为正数: {}", self.fps)));
        }
        if !(self.width >= 0.0 && self.height >= 0.0) {
            return Err(ConfigError::Validation(format!(
                "尺寸无效: {}x{}",
                self.width, self.height
            )));
        }
        Color::from_hex(&self.background)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StageConfig::default();
        assert_eq!(config.surface_id, "canvas");
        assert_eq!(config.fps, 60.0);
        assert_eq!((config.width, config.height), (800.0, 600.0));
        assert!(!config.fit_container);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = StageConfig::from_json_str(r#"{ "fps": 30, "fit_container": true }"#).unwrap();
        assert_eq!(config.fps, 30.0);
        assert!(config.fit_container);
        assert_eq!(config.background, "#ffffff");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            StageConfig::from_json_str("{ fps: }"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = StageConfig {
            fps: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = StageConfig {
            background: "white".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = StageConfig::load_or_default("definitely/not/here.json");
        assert_eq!(config, StageConfig::default());
        assert!(matches!(
            StageConfig::load("definitely/not/here.json"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = StageConfig {
            surface_id: "main".to_string(),
            ..Default::default()
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(StageConfig::from_json_str(&json).unwrap(), config);
    }
}
