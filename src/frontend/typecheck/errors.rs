//! 致命错误
//!
//! 这些错误会中止整个文件的降级，已生成的声明全部丢弃。
//! 可以继续处理的问题走诊断（见 `util::diagnostic`）。

use crate::util::span::Span;
use thiserror::Error;

/// 降级错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LowerError {
    /// 需要的类型信息缺失
    #[error("incomplete resolution: {what}")]
    IncompleteResolution { what: String, span: Span },

    /// 遇到无法处理的语法或类型形状
    #[error("unsupported construct: {what}")]
    UnsupportedConstruct { what: String, span: Span },

    /// 导入的模块无法解析，或找不到可引用的名字
    #[error("import resolution failed for '{path}': {reason}")]
    ImportResolution { path: String, reason: String },
}

impl LowerError {
    pub fn incomplete(
        what: impl Into<String>,
        span: Span,
    ) -> Self {
        LowerError::IncompleteResolution {
            what: what.into(),
            span,
        }
    }

    pub fn unsupported(
        what: impl Into<String>,
        span: Span,
    ) -> Self {
        LowerError::UnsupportedConstruct {
            what: what.into(),
            span,
        }
    }

    /// 出错位置
    pub fn span(&self) -> Option<Span> {
        match self {
            LowerError::IncompleteResolution { span, .. }
            | LowerError::UnsupportedConstruct { span, .. } => Some(*span),
            LowerError::ImportResolution { .. } => None,
        }
    }
}

/// 降级结果
pub type LowerResult<T> = Result<T, LowerError>;
