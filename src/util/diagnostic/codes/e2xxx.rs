//! 错误码定义
//!
//! E2xxx: 声明解析阶段的错误码

use super::{DiagnosticBuilder, ErrorCategory, ErrorCodeDefinition};
use crate::util::diagnostic::Severity;

/// E2xxx 错误码列表
pub static E2XXX: &[ErrorCodeDefinition] = &[
    ErrorCodeDefinition {
        code: "E2101",
        category: ErrorCategory::Semantic,
        message_template: "illegal cycle in declaration of '{name}'",
        help_template: "break the cycle with a type definition or an indirection",
    },
    ErrorCodeDefinition {
        code: "E2102",
        category: ErrorCategory::Semantic,
        message_template: "invalid recursive type '{name}'",
        help_template: "a type cannot contain itself without a pointer, slice, map, channel or function in between",
    },
    ErrorCodeDefinition {
        code: "E2103",
        category: ErrorCategory::Semantic,
        message_template: "initialization cycle: '{name}' refers to itself",
        help_template: "",
    },
    ErrorCodeDefinition {
        code: "E2104",
        category: ErrorCategory::Semantic,
        message_template: "undeclared name: '{name}'",
        help_template: "",
    },
    ErrorCodeDefinition {
        code: "E2105",
        category: ErrorCategory::Semantic,
        message_template: "'{name}' is not a type",
        help_template: "",
    },
    ErrorCodeDefinition {
        code: "E2106",
        category: ErrorCategory::Semantic,
        message_template: "'{from}' refers to '{to}'",
        help_template: "",
    },
];

// E2xxx 快捷方法
impl ErrorCodeDefinition {
    /// E2101 非法声明循环
    pub fn illegal_cycle(name: &str) -> DiagnosticBuilder {
        Self::lookup("E2101").param("name", name)
    }

    /// E2102 无限展开的递归类型
    pub fn invalid_recursive_type(name: &str) -> DiagnosticBuilder {
        Self::lookup("E2102").param("name", name)
    }

    /// E2103 初始化循环
    pub fn initialization_cycle(name: &str) -> DiagnosticBuilder {
        Self::lookup("E2103").param("name", name)
    }

    /// E2104 未声明的名字
    pub fn undeclared_name(name: &str) -> DiagnosticBuilder {
        Self::lookup("E2104").param("name", name)
    }

    /// E2105 不是类型
    pub fn not_a_type(name: &str) -> DiagnosticBuilder {
        Self::lookup("E2105").param("name", name)
    }

    /// E2106 循环中的一条引用边（附注）
    pub fn cycle_edge(
        from: &str,
        to: &str,
    ) -> DiagnosticBuilder {
        Self::lookup("E2106")
            .param("from", from)
            .param("to", to)
            .severity(Severity::Info)
    }
}
