//! 统一诊断系统
//!
//! - [`error`] - 诊断数据结构 (Diagnostic, Severity)
//! - [`codes`] - 错误码注册表和构建器
//! - [`collect`] - 诊断收集器
//! - [`emitter`] - 文本与 JSON 渲染

pub mod codes;
pub mod collect;
pub mod emitter;
pub mod error;

pub use codes::{DiagnosticBuilder, ErrorCategory, ErrorCodeDefinition};
pub use collect::ErrorCollector;
pub use emitter::{JsonEmitter, TextEmitter};
pub use error::{Diagnostic, Severity};
