//! 声明解析测试模块

mod generics;

use crate::frontend::ast::File;
use crate::frontend::module::{ModuleInfo, ModuleRegistry, ModuleSource};
use crate::frontend::typecheck::info::TypeInfo;
use crate::frontend::typecheck::types::TypeStore;
use crate::session::Session;
use crate::util::config::LowerConfig;

const PKG: &str = "example.com/p";

fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register(ModuleInfo::new(PKG, ModuleSource::Batch));
    registry
}

/// 解析整个文件，返回会话
fn checked<'a>(
    file: File,
    info: TypeInfo,
    registry: &'a ModuleRegistry,
) -> Session<'a> {
    let mut session = Session::new(file, TypeStore::new(), info, registry, LowerConfig::default());
    session.check().unwrap();
    session
}

/// 指定错误码的诊断个数
fn count(
    session: &Session<'_>,
    code: &str,
) -> usize {
    session.diagnostics().with_code(code).count()
}
