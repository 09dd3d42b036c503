//! 诊断数据结构
//!
//! - `Diagnostic` 的 `message` 和 `help` 在构建时就已渲染完成
//! - **只允许通过 `DiagnosticBuilder` 创建诊断**，所有错误码都必须在注册表中登记
//!
//! ```ignore
//! ErrorCodeDefinition::illegal_cycle("T")
//!     .at(span)
//!     .with_related(notes)
//!     .build();
//! ```

use crate::util::span::Span;

/// 诊断严重级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// 是否为错误级别
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}

/// 诊断信息
///
/// **不可直接构造**。必须通过 `DiagnosticBuilder::build()` 创建。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 严重级别
    pub severity: Severity,
    /// 错误码
    pub code: String,
    /// 完整消息
    pub message: String,
    /// 帮助信息
    pub help: String,
    /// 位置信息
    pub span: Option<Span>,
    /// 相关诊断（例如循环中的每一条 "refers to" 边）
    pub related: Vec<Diagnostic>,
}

impl Diagnostic {
    /// `pub(crate)`: 仅由 `DiagnosticBuilder::build()` 调用
    pub(crate) fn new(
        severity: Severity,
        code: String,
        message: String,
        help: String,
        span: Option<Span>,
    ) -> Self {
        Self {
            severity,
            code,
            message,
            help,
            span,
            related: Vec::new(),
        }
    }

    pub(crate) fn with_related(
        mut self,
        related: Vec<Diagnostic>,
    ) -> Self {
        self.related = related;
        self
    }

    /// 是否为错误
    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}
