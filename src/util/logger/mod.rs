//! 日志
//!
//! Go 风格的简洁输出：`LEVEL message`，不带时间和模块路径。
//! 降级过程中的解析、循环检测、实例化和工作队列都通过 `tracing` 打点，
//! 默认只显示 INFO 以上，调试时用 [`LogLevel::Trace`] 打开全部细节。
//!
//! ```rust
//! use monolower::util::logger::{self, LogLevel};
//!
//! logger::try_init_with_level(LogLevel::Debug);
//! tracing::debug!("instantiating {}", "List");
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

use crate::util::config::LowerConfig;

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// 以指定级别初始化
///
/// 全局订阅者只能安装一次；重复调用返回 `false` 而不是 panic，
/// 测试里可以放心多次调用。
pub fn try_init_with_level(level: LogLevel) -> bool {
    let filter = tracing_subscriber::filter::LevelFilter::from_level(level.into());

    let layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .with_level(true)
        .with_ansi(false)
        .compact()
        .with_filter(filter);

    Registry::default().with(layer).try_init().is_ok()
}

/// 按配置里的 `log_level` 初始化
pub fn init_from_config(config: &LowerConfig) -> bool {
    try_init_with_level(config.log_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(tracing::Level::from(LogLevel::Trace), tracing::Level::TRACE);
        assert_eq!(tracing::Level::from(LogLevel::Warn), tracing::Level::WARN);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_repeated_init_does_not_panic() {
        try_init_with_level(LogLevel::Debug);
        assert!(!try_init_with_level(LogLevel::Debug));
    }
}
