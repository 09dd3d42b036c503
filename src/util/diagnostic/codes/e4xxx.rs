//! 错误码定义
//!
//! E4xxx: 泛型、类型参数与合约

use super::{DiagnosticBuilder, ErrorCategory, ErrorCodeDefinition};

/// E4xxx 错误码列表
pub static E4XXX: &[ErrorCodeDefinition] = &[
    ErrorCodeDefinition {
        code: "E4101",
        category: ErrorCategory::Generic,
        message_template: "'{ty}' is not an interface or contract",
        help_template: "",
    },
    ErrorCodeDefinition {
        code: "E4102",
        category: ErrorCategory::Generic,
        message_template: "{found} type parameters but contract expects {expected}",
        help_template: "",
    },
    ErrorCodeDefinition {
        code: "E4103",
        category: ErrorCategory::Generic,
        message_template: "'{name}' used multiple times (not supported due to implementation restriction)",
        help_template: "",
    },
    ErrorCodeDefinition {
        code: "E4104",
        category: ErrorCategory::Generic,
        message_template: "'{name}' is not an incoming type parameter (not supported due to implementation restriction)",
        help_template: "",
    },
    ErrorCodeDefinition {
        code: "E4105",
        category: ErrorCategory::Generic,
        message_template: "'{ty}' is not a type parameter (not supported due to implementation restriction)",
        help_template: "",
    },
    ErrorCodeDefinition {
        code: "E4106",
        category: ErrorCategory::Generic,
        message_template: "cannot use generic type '{name}' without instantiation",
        help_template: "",
    },
    ErrorCodeDefinition {
        code: "E4107",
        category: ErrorCategory::Generic,
        message_template: "got {found} type arguments for '{name}' but it expects {expected}",
        help_template: "",
    },
    ErrorCodeDefinition {
        code: "E4108",
        category: ErrorCategory::Generic,
        message_template: "type alias '{name}' cannot have type parameters",
        help_template: "the type parameters are ignored",
    },
];

// E4xxx 快捷方法
impl ErrorCodeDefinition {
    /// E4101 约束既不是接口也不是合约
    pub fn not_interface_or_contract(ty: &str) -> DiagnosticBuilder {
        Self::lookup("E4101").param("ty", ty)
    }

    /// E4102 合约参数个数不匹配
    pub fn contract_arity(
        found: usize,
        expected: usize,
    ) -> DiagnosticBuilder {
        Self::lookup("E4102")
            .param("found", found.to_string())
            .param("expected", expected.to_string())
    }

    /// E4103 合约实参被重复使用
    pub fn contract_arg_reused(name: &str) -> DiagnosticBuilder {
        Self::lookup("E4103").param("name", name)
    }

    /// E4104 合约实参不是正在声明的类型参数
    pub fn contract_arg_not_incoming(name: &str) -> DiagnosticBuilder {
        Self::lookup("E4104").param("name", name)
    }

    /// E4105 合约实参不是类型参数
    pub fn contract_arg_not_type_param(ty: &str) -> DiagnosticBuilder {
        Self::lookup("E4105").param("ty", ty)
    }

    /// E4106 泛型类型未实例化
    pub fn generic_without_instantiation(name: &str) -> DiagnosticBuilder {
        Self::lookup("E4106").param("name", name)
    }

    /// E4107 类型实参个数错误
    pub fn type_arg_count(
        name: &str,
        found: usize,
        expected: usize,
    ) -> DiagnosticBuilder {
        Self::lookup("E4107")
            .param("name", name)
            .param("found", found.to_string())
            .param("expected", expected.to_string())
    }

    /// E4108 泛型别名
    pub fn generic_alias(name: &str) -> DiagnosticBuilder {
        Self::lookup("E4108").param("name", name)
    }
}
