//! 前端
//!
//! 语法树、模块导入接口、类型模型与声明解析。

pub mod ast;
pub mod module;
pub mod typecheck;
