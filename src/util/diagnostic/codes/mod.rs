//! 错误码注册表
//!
//! 所有诊断错误码的集中定义

pub mod e2xxx;
pub mod e4xxx;
pub mod e8xxx;

pub mod builder;
pub use builder::DiagnosticBuilder;

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Semantic, // E2xxx: 声明解析
    Generic,  // E4xxx: 泛型与合约
    Internal, // E8xxx: 内部错误
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            ErrorCategory::Semantic => write!(f, "Semantic"),
            ErrorCategory::Generic => write!(f, "Generic"),
            ErrorCategory::Internal => write!(f, "Internal"),
        }
    }
}

/// 错误码定义
#[derive(Debug, Clone, Copy)]
pub struct ErrorCodeDefinition {
    /// 错误码，如 "E2101"
    pub code: &'static str,
    /// 错误类别
    pub category: ErrorCategory,
    /// 消息模板，支持 {param} 占位符
    pub message_template: &'static str,
    /// 帮助模板
    pub help_template: &'static str,
}

use once_cell::sync::Lazy;

/// 完整的错误码注册表
static ERROR_CODES: Lazy<Vec<ErrorCodeDefinition>> = Lazy::new(|| {
    let mut codes: Vec<ErrorCodeDefinition> = Vec::new();

    // E2xxx: 声明解析
    codes.extend_from_slice(e2xxx::E2XXX);
    // E4xxx: 泛型与合约
    codes.extend_from_slice(e4xxx::E4XXX);
    // E8xxx: 内部错误
    codes.extend_from_slice(e8xxx::E8XXX);

    codes
});

impl ErrorCodeDefinition {
    /// 根据代码查找错误码定义
    pub fn find(code: &str) -> Option<&'static Self> {
        ERROR_CODES.iter().find(|c| c.code == code)
    }

    /// 所有错误码
    pub fn all() -> &'static [Self] {
        &ERROR_CODES
    }

    /// 按类别获取错误码
    pub fn by_category(category: ErrorCategory) -> impl Iterator<Item = &'static Self> {
        ERROR_CODES.iter().filter(move |c| c.category == category)
    }

    /// 创建 DiagnosticBuilder
    pub fn builder(&self) -> DiagnosticBuilder {
        DiagnosticBuilder::new(self.code, self.message_template, self.help_template)
    }

    /// 按错误码取构建器；未登记的错误码降级为 E8001
    pub(crate) fn lookup(code: &'static str) -> DiagnosticBuilder {
        match Self::find(code) {
            Some(def) => def.builder(),
            None => Self::internal_error(&format!("unregistered error code {}", code)),
        }
    }
}
