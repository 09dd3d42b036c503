//! 模块导入接口
//!
//! 降级只需要其它模块的三样信息：导出符号表（按名字排序，带种类），
//! 传递导入闭包，以及该模块是否属于当前这批一起降级的模块。
//!
//! - [`Importer`] - 降级过程依赖的接口
//! - [`registry`] - 内存中的实现

pub mod registry;

use std::collections::BTreeMap;

pub use registry::ModuleRegistry;

/// 导出项类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    Type,
    Var,
    Func,
    Const,
    Contract,
}

/// 模块导出项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// 短名称
    pub name: String,
    pub kind: ExportKind,
    /// 是否带类型参数
    pub generic: bool,
}

impl Export {
    pub fn new(
        name: impl Into<String>,
        kind: ExportKind,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            generic: false,
        }
    }

    pub fn generic(
        name: impl Into<String>,
        kind: ExportKind,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            generic: true,
        }
    }

    /// 是否为导出名（首字母大写）
    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(char::is_uppercase)
    }
}

/// 模块来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleSource {
    /// 与当前文件同一批降级的模块
    Batch,
    /// 已编译好的外部模块
    External,
}

/// 模块信息
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    /// 导入路径
    pub path: String,
    pub source: ModuleSource,
    /// 导出项（按名字排序）
    pub exports: BTreeMap<String, Export>,
    /// 直接导入的模块路径
    pub imports: Vec<String>,
}

impl ModuleInfo {
    pub fn new(
        path: impl Into<String>,
        source: ModuleSource,
    ) -> Self {
        Self {
            path: path.into(),
            source,
            exports: BTreeMap::new(),
            imports: Vec::new(),
        }
    }

    /// 添加导出项
    pub fn add_export(
        &mut self,
        export: Export,
    ) -> &mut Self {
        self.exports.insert(export.name.clone(), export);
        self
    }

    /// 添加直接依赖
    pub fn add_import(
        &mut self,
        path: impl Into<String>,
    ) -> &mut Self {
        let path = path.into();
        if !self.imports.contains(&path) {
            self.imports.push(path);
        }
        self
    }

    pub fn get_export(
        &self,
        name: &str,
    ) -> Option<&Export> {
        self.exports.get(name)
    }

    /// 按名字顺序第一个可以在 `_` 声明里引用的导出项
    pub fn first_referenceable(&self) -> Option<&Export> {
        self.exports
            .values()
            .filter(|e| e.is_exported() && !e.generic)
            .find(|e| e.kind != ExportKind::Contract)
    }
}

/// 降级过程使用的模块导入接口
pub trait Importer {
    /// 查找模块
    fn module(
        &self,
        path: &str,
    ) -> Result<&ModuleInfo, ModuleError>;

    /// 模块的传递导入闭包（不含自身，已排序去重）
    fn transitive_imports(
        &self,
        path: &str,
    ) -> Result<Vec<String>, ModuleError>;

    /// 模块是否属于当前批次
    fn is_batch(
        &self,
        path: &str,
    ) -> bool {
        self.module(path)
            .map(|m| m.source == ModuleSource::Batch)
            .unwrap_or(false)
    }
}

/// 模块系统错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModuleError {
    /// 模块未找到
    #[error("module not found: '{path}'")]
    NotFound { path: String },

    /// 导出项未找到
    #[error("export '{name}' not found in module '{module_path}'")]
    ExportNotFound { name: String, module_path: String },
}
