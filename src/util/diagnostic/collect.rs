//! 诊断收集器
//!
//! 非致命诊断在整个会话中累积，不会中断降级。

use super::error::{Diagnostic, Severity};

/// 诊断收集器
#[derive(Debug, Clone, Default)]
pub struct ErrorCollector {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorCollector {
    /// 创建空收集器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条诊断
    pub fn push(
        &mut self,
        diagnostic: Diagnostic,
    ) {
        tracing::debug!("diagnostic: {}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// 是否有错误级别的诊断
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// 错误数量
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// 指定错误码的诊断
    pub fn with_code<'a>(
        &'a self,
        code: &'a str,
    ) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics.iter().filter(move |d| d.code == code)
    }

    /// 警告
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// 全部诊断（按记录顺序）
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 取出全部诊断
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::diagnostic::codes::ErrorCodeDefinition;

    #[test]
    fn test_collector_counts_errors() {
        let mut collector = ErrorCollector::new();
        assert!(!collector.has_errors());

        collector.push(ErrorCodeDefinition::undeclared_name("Foo").build());
        collector.push(ErrorCodeDefinition::not_a_type("bar").build());

        assert!(collector.has_errors());
        assert_eq!(collector.error_count(), 2);
        assert_eq!(collector.with_code("E2104").count(), 1);
        assert_eq!(collector.warnings().count(), 0);
    }
}
