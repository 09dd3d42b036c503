//! 文本诊断渲染器

use crate::util::diagnostic::{Diagnostic, Severity};
use crate::util::span::SourceFile;

/// 渲染器配置
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// 是否启用颜色输出
    pub use_colors: bool,
    /// 是否显示源码片段
    pub show_source: bool,
    /// 是否显示帮助信息
    pub show_help: bool,
    /// 是否显示相关诊断
    pub show_related: bool,
    /// 指示字符
    pub indicator: char,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            use_colors: true,
            show_source: true,
            show_help: true,
            show_related: true,
            indicator: '^',
        }
    }
}

/// 文本诊断渲染器
#[derive(Debug, Clone)]
pub struct TextEmitter {
    config: EmitterConfig,
}

impl TextEmitter {
    /// 创建新的文本渲染器
    pub fn new() -> Self {
        Self {
            config: EmitterConfig::default(),
        }
    }

    /// 使用自定义配置创建渲染器
    pub fn with_config(config: EmitterConfig) -> Self {
        Self { config }
    }

    /// 渲染单个诊断
    pub fn render(
        &self,
        diagnostic: &Diagnostic,
    ) -> String {
        self.render_internal(diagnostic, None, 0)
    }

    /// 渲染诊断到指定源码文件
    pub fn render_with_source(
        &self,
        diagnostic: &Diagnostic,
        source_file: Option<&SourceFile>,
    ) -> String {
        self.render_internal(diagnostic, source_file, 0)
    }

    /// 渲染多个诊断
    pub fn render_all<'a>(
        &self,
        diagnostics: impl IntoIterator<Item = &'a Diagnostic>,
        source_file: Option<&SourceFile>,
    ) -> String {
        diagnostics
            .into_iter()
            .map(|d| self.render_internal(d, source_file, 0))
            .collect()
    }

    fn render_internal(
        &self,
        diagnostic: &Diagnostic,
        source_file: Option<&SourceFile>,
        indent: usize,
    ) -> String {
        let pad = "  ".repeat(indent);
        let mut output = String::new();

        output.push_str(&pad);
        output.push_str(&self.render_header(diagnostic));

        let location = self.render_location(diagnostic, source_file);
        if !location.is_empty() {
            output.push_str(&pad);
            output.push_str(&location);
        }

        if self.config.show_source {
            if let Some(snippet) = self.render_source_snippet(diagnostic, source_file) {
                output.push_str(&snippet);
            }
        }

        if self.config.show_help && !diagnostic.help.is_empty() {
            output.push_str(&pad);
            output.push_str("help: ");
            output.push_str(&diagnostic.help);
            output.push('\n');
        }

        if self.config.show_related {
            for related in &diagnostic.related {
                output.push_str(&self.render_internal(related, source_file, indent + 1));
            }
        }

        output
    }

    fn render_header(
        &self,
        diagnostic: &Diagnostic,
    ) -> String {
        let severity = diagnostic.severity.to_string();
        let style = match diagnostic.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        };

        format!(
            "{} [{}] {}\n",
            self.color(style, &severity),
            self.color("bold", &diagnostic.code),
            diagnostic.message
        )
    }

    fn render_location(
        &self,
        diagnostic: &Diagnostic,
        source_file: Option<&SourceFile>,
    ) -> String {
        match &diagnostic.span {
            Some(span) if !span.is_dummy() => {
                let file_name = source_file
                    .map(|sf| sf.name.as_str())
                    .unwrap_or("<unknown>");
                format!(
                    " --> {}:{}:{}\n",
                    file_name, span.start.line, span.start.column
                )
            }
            _ => String::new(),
        }
    }

    fn render_source_snippet(
        &self,
        diagnostic: &Diagnostic,
        source_file: Option<&SourceFile>,
    ) -> Option<String> {
        let span = diagnostic.span.as_ref()?;
        if span.is_dummy() {
            return None;
        }
        let line = source_file?.line(span.start.line)?;

        let mut output = format!("{:>4} | {}\n", span.start.line, line);
        let spaces = " ".repeat(span.start.column.saturating_sub(1));
        let width = if span.start.line == span.end.line {
            span.end.column.saturating_sub(span.start.column).max(1)
        } else {
            line.len().saturating_sub(span.start.column - 1).max(1)
        };
        let indicators = self.config.indicator.to_string().repeat(width);
        output.push_str(&format!("     | {}{}\n", spaces, indicators));
        Some(output)
    }

    fn color(
        &self,
        style: &str,
        text: &str,
    ) -> String {
        if !self.config.use_colors {
            return text.to_string();
        }

        match style {
            "error" => format!("\x1b[31m{}\x1b[0m", text),
            "warning" => format!("\x1b[33m{}\x1b[0m", text),
            "info" => format!("\x1b[34m{}\x1b[0m", text),
            "hint" => format!("\x1b[36m{}\x1b[0m", text),
            "bold" => format!("\x1b[1m{}\x1b[0m", text),
            _ => text.to_string(),
        }
    }
}

impl Default for TextEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::diagnostic::codes::ErrorCodeDefinition;
    use crate::util::span::{Position, Span};

    fn plain() -> TextEmitter {
        TextEmitter::with_config(EmitterConfig {
            use_colors: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_render_basic_error() {
        let diagnostic = ErrorCodeDefinition::undeclared_name("Foo").build();
        let output = plain().render(&diagnostic);
        assert!(output.contains("error [E2104]"), "{}", output);
        assert!(output.contains("undeclared name: 'Foo'"), "{}", output);
    }

    #[test]
    fn test_render_with_source_snippet() {
        let source = SourceFile::new("list.go", "package list\n\ntype A = B\ntype B = A\n");
        let span = Span::new(Position::new(3, 6), Position::new(3, 7));
        let diagnostic = ErrorCodeDefinition::illegal_cycle("A").at(span).build();

        let output = plain().render_with_source(&diagnostic, Some(&source));
        assert!(output.contains("list.go:3:6"), "{}", output);
        assert!(output.contains("type A = B"), "{}", output);
        assert!(output.contains("     |      ^"), "{}", output);
    }

    #[test]
    fn test_related_notes_are_indented() {
        let note = ErrorCodeDefinition::cycle_edge("A", "B").build();
        let diagnostic = ErrorCodeDefinition::illegal_cycle("A")
            .with_related(vec![note])
            .build();
        let output = plain().render(&diagnostic);
        assert!(output.contains("\n  info [E2106] 'A' refers to 'B'"), "{}", output);
    }

    #[test]
    fn test_colors_can_be_disabled() {
        let diagnostic = ErrorCodeDefinition::not_a_type("x").build();
        assert!(!plain().render(&diagnostic).contains("\x1b[31m"));
        assert!(TextEmitter::new().render(&diagnostic).contains("\x1b[31m"));
    }
}
