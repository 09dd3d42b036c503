//! 降级配置
//!
//! 配置来自 `monolower.toml`（或调用方指定的路径），字段全部可省略。
//!
//! ```toml
//! add_importable_name = true
//! importable_name = "Importable"
//! discard_imports = true
//! name_separator = "_"
//! log_level = "debug"
//! ```
//!
//! ```rust
//! use monolower::util::config::{load_config, LowerConfig};
//!
//! let config = load_config("does-not-exist.toml").unwrap();
//! assert_eq!(config.name_separator, LowerConfig::default().name_separator);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::util::logger::LogLevel;

/// 默认配置文件名
pub const CONFIG_FILE_NAME: &str = "monolower.toml";

/// 降级配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowerConfig {
    /// 在输出末尾追加 `type <importable_name> int`，
    /// 让同批次的其它模块有名字可以引用本模块
    #[serde(default)]
    pub add_importable_name: bool,
    /// 可引用名
    #[serde(default = "default_importable_name")]
    pub importable_name: String,
    /// 为每个导入追加 `_` 引用声明，避免导入未使用
    #[serde(default = "default_discard_imports")]
    pub discard_imports: bool,
    /// 生成名称时基名与类型参数之间的分隔符
    #[serde(default = "default_name_separator")]
    pub name_separator: String,
    /// 日志级别
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_importable_name() -> String {
    "Importable".to_string()
}

fn default_discard_imports() -> bool {
    true
}

fn default_name_separator() -> String {
    "_".to_string()
}

impl Default for LowerConfig {
    fn default() -> Self {
        Self {
            add_importable_name: false,
            importable_name: default_importable_name(),
            discard_imports: default_discard_imports(),
            name_separator: default_name_separator(),
            log_level: LogLevel::default(),
        }
    }
}

impl LowerConfig {
    /// 从 TOML 文本解析
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: LowerConfig = toml::from_str(content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// 序列化为 TOML 文本
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::SerializeError)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !is_identifier(&self.importable_name) {
            return Err(ConfigError::Invalid {
                field: "importable_name",
                value: self.importable_name.clone(),
            });
        }
        if !self
            .name_separator
            .chars()
            .all(|c| c == '_' || c.is_ascii_alphanumeric())
        {
            return Err(ConfigError::Invalid {
                field: "name_separator",
                value: self.name_separator.clone(),
            });
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => chars.all(|c| c == '_' || c.is_alphanumeric()),
        _ => false,
    }
}

/// 加载配置，文件不存在时返回默认值
pub fn load_config(path: impl AsRef<Path>) -> Result<LowerConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(LowerConfig::default());
    }

    let content = fs::read_to_string(path).map_err(ConfigError::IoError)?;
    LowerConfig::from_toml(&content)
}

/// 在目录中查找 [`CONFIG_FILE_NAME`] 并加载
pub fn load_project_config(dir: impl AsRef<Path>) -> Result<LowerConfig, ConfigError> {
    load_config(dir.as_ref().join(CONFIG_FILE_NAME))
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(toml::de::Error),
    SerializeError(toml::ser::Error),
    Invalid { field: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Config parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "Config serialize error: {}", e),
            ConfigError::Invalid { field, value } => {
                write!(f, "Invalid value for '{}': '{}'", field, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_project_config(dir.path()).unwrap();
        assert_eq!(config, LowerConfig::default());
        assert!(config.discard_imports);
        assert!(!config.add_importable_name);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "add_importable_name = true").unwrap();
        writeln!(file, "log_level = \"debug\"").unwrap();
        drop(file);

        let config = load_config(&path).unwrap();
        assert!(config.add_importable_name);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.importable_name, "Importable");
        assert_eq!(config.name_separator, "_");
    }

    #[test]
    fn test_invalid_separator_rejected() {
        let err = LowerConfig::from_toml("name_separator = \"-\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "name_separator", .. }));
    }

    #[test]
    fn test_invalid_importable_name_rejected() {
        let err = LowerConfig::from_toml("importable_name = \"9lives\"").unwrap_err();
        assert!(err.to_string().contains("importable_name"));
    }

    #[test]
    fn test_toml_roundtrip_keeps_fields() {
        let config = LowerConfig {
            add_importable_name: true,
            importable_name: "Pkg".to_string(),
            ..LowerConfig::default()
        };
        let text = config.to_toml().unwrap();
        assert_eq!(LowerConfig::from_toml(&text).unwrap(), config);
    }
}
