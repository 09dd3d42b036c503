//! 通用诊断构建器
//!
//! 支持模板参数化的错误消息构建器

use crate::util::diagnostic::{Diagnostic, Severity};
use crate::util::span::Span;
use std::collections::{HashMap, HashSet};

/// 诊断构建器（支持模板参数）
#[derive(Debug, Clone)]
pub struct DiagnosticBuilder {
    code: &'static str,
    message_template: &'static str,
    help_template: &'static str,
    severity: Severity,
    params: Vec<(&'static str, String)>,
    span: Option<Span>,
    related: Vec<Diagnostic>,
}

impl DiagnosticBuilder {
    /// 创建新的诊断构建器
    pub fn new(
        code: &'static str,
        template: &'static str,
        help: &'static str,
    ) -> Self {
        Self {
            code,
            message_template: template,
            help_template: help,
            severity: Severity::Error,
            params: Vec::new(),
            span: None,
            related: Vec::new(),
        }
    }

    /// 添加模板参数
    pub fn param(
        mut self,
        key: &'static str,
        value: impl Into<String>,
    ) -> Self {
        self.params.push((key, value.into()));
        self
    }

    /// 设置位置
    #[inline]
    pub fn at(
        mut self,
        span: Span,
    ) -> Self {
        self.span = Some(span);
        self
    }

    /// 设置严重级别
    #[inline]
    pub fn severity(
        mut self,
        severity: Severity,
    ) -> Self {
        self.severity = severity;
        self
    }

    /// 添加相关诊断
    #[inline]
    pub fn with_related(
        mut self,
        related: Vec<Diagnostic>,
    ) -> Self {
        self.related = related;
        self
    }

    /// 构建 Diagnostic
    ///
    /// 缺少模板参数时回落为 E8001，而不是带着未替换的占位符输出。
    pub fn build(&self) -> Diagnostic {
        let missing = self.missing_params();
        if !missing.is_empty() {
            let message = format!(
                "Internal diagnostic error: missing template parameter(s) for '{}'. template='{}', missing={:?}",
                self.code, self.message_template, missing
            );
            return Diagnostic::new(
                Severity::Error,
                "E8001".to_string(),
                message,
                "Please report this issue.".to_string(),
                self.span,
            )
            .with_related(self.related.clone());
        }

        let message = render(self.message_template, &self.params);
        let help = render(self.help_template, &self.params);
        Diagnostic::new(
            self.severity,
            self.code.to_string(),
            message,
            help,
            self.span,
        )
        .with_related(self.related.clone())
    }

    fn missing_params(&self) -> Vec<String> {
        let keys: HashSet<&str> = self.params.iter().map(|(k, _)| *k).collect();
        placeholders(self.message_template)
            .into_iter()
            .chain(placeholders(self.help_template))
            .filter(|key| !keys.contains(key.as_str()))
            .collect()
    }
}

/// 模板中的占位符名
fn placeholders(template: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '{' {
            continue;
        }
        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            chars.next();
            if c == '}' {
                if !key.is_empty() {
                    keys.push(key);
                }
                break;
            }
            key.push(c);
        }
    }
    keys
}

/// 渲染模板
pub fn render(
    template: &str,
    params: &[(&'static str, String)],
) -> String {
    let mut result = String::with_capacity(template.len() + 64);
    let mut chars = template.chars().peekable();
    let param_map: HashMap<&str, &str> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();

    while let Some(c) = chars.next() {
        if c != '{' {
            result.push(c);
            continue;
        }
        let mut key = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            chars.next();
            if c == '}' {
                closed = true;
                break;
            }
            key.push(c);
        }
        match param_map.get(key.as_str()) {
            Some(value) if closed => result.push_str(value),
            _ => {
                // 占位符不存在时保留原样
                result.push('{');
                result.push_str(&key);
                if closed {
                    result.push('}');
                }
            }
        }
    }
    result
}
