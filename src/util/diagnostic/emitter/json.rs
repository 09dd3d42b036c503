//! JSON 诊断渲染器
//!
//! 输出符合 Language Server Protocol (LSP) 诊断结构的 JSON

use crate::util::diagnostic::{Diagnostic, Severity};
use crate::util::span::Span;
use serde::{Deserialize, Serialize};
use serde_json::to_string_pretty;

/// LSP 诊断严重级别
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LspDiagnosticSeverity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

/// LSP 位置范围
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LspRange {
    pub start: LspPosition,
    pub end: LspPosition,
}

/// LSP 位置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LspPosition {
    pub line: u32,
    pub character: u32,
}

/// LSP 相关诊断信息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LspRelatedDiagnosticInformation {
    pub location: LspRange,
    pub message: String,
}

/// LSP 诊断结构
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LspDiagnostic {
    /// 诊断范围
    pub range: LspRange,
    /// 严重级别
    pub severity: Option<LspDiagnosticSeverity>,
    /// 错误代码
    pub code: Option<String>,
    /// 来源
    pub source: String,
    /// 诊断消息
    pub message: String,
    /// 相关诊断信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_information: Option<Vec<LspRelatedDiagnosticInformation>>,
}

/// JSON 诊断渲染器
#[derive(Debug, Clone)]
pub struct JsonEmitter;

impl JsonEmitter {
    /// 渲染诊断为 JSON 字符串
    pub fn render(diagnostic: &Diagnostic) -> String {
        let lsp_diagnostic = Self::to_lsp_diagnostic(diagnostic);
        to_string_pretty(&lsp_diagnostic).unwrap_or_else(|_| "{}".to_string())
    }

    /// 渲染多个诊断
    pub fn render_all(diagnostics: &[Diagnostic]) -> String {
        let lsp_diagnostics: Vec<LspDiagnostic> =
            diagnostics.iter().map(Self::to_lsp_diagnostic).collect();
        to_string_pretty(&lsp_diagnostics).unwrap_or_else(|_| "[]".to_string())
    }

    /// 转换为 LSP 诊断结构
    pub fn to_lsp_diagnostic(diagnostic: &Diagnostic) -> LspDiagnostic {
        let related_information = if diagnostic.related.is_empty() {
            None
        } else {
            Some(
                diagnostic
                    .related
                    .iter()
                    .map(|r| LspRelatedDiagnosticInformation {
                        location: Self::span_to_range(r.span.as_ref()),
                        message: r.message.clone(),
                    })
                    .collect(),
            )
        };

        LspDiagnostic {
            range: Self::span_to_range(diagnostic.span.as_ref()),
            severity: Some(match diagnostic.severity {
                Severity::Error => LspDiagnosticSeverity::Error,
                Severity::Warning => LspDiagnosticSeverity::Warning,
                Severity::Info => LspDiagnosticSeverity::Information,
                Severity::Hint => LspDiagnosticSeverity::Hint,
            }),
            code: Some(diagnostic.code.clone()),
            source: "monolower".to_string(),
            message: diagnostic.message.clone(),
            related_information,
        }
    }

    /// 转换 Span 到 LSP Range（LSP 从 0 开始计数）
    fn span_to_range(span: Option<&Span>) -> LspRange {
        match span {
            Some(s) if !s.is_dummy() => LspRange {
                start: LspPosition {
                    line: s.start.line.saturating_sub(1) as u32,
                    character: s.start.column.saturating_sub(1) as u32,
                },
                end: LspPosition {
                    line: s.end.line.saturating_sub(1) as u32,
                    character: s.end.column.saturating_sub(1) as u32,
                },
            },
            _ => Self::dummy_range(),
        }
    }

    fn dummy_range() -> LspRange {
        LspRange {
            start: LspPosition { line: 0, character: 0 },
            end: LspPosition { line: 0, character: 0 },
        }
    }
}
