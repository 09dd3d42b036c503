//! 错误码定义
//!
//! E8xxx: 内部错误

use super::{DiagnosticBuilder, ErrorCategory, ErrorCodeDefinition};

/// E8xxx 错误码列表
pub static E8XXX: &[ErrorCodeDefinition] = &[ErrorCodeDefinition {
    code: "E8001",
    category: ErrorCategory::Internal,
    message_template: "Internal diagnostic error: {message}",
    help_template: "Please report this issue.",
}];

impl ErrorCodeDefinition {
    /// E8001 内部错误
    ///
    /// 不经过 [`ErrorCodeDefinition::lookup`]，注册表本身出问题时也能用。
    pub fn internal_error(message: &str) -> DiagnosticBuilder {
        DiagnosticBuilder::new(
            E8XXX[0].code,
            E8XXX[0].message_template,
            E8XXX[0].help_template,
        )
        .param("message", message)
    }
}
