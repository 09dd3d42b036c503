//! 模块注册表
//!
//! [`Importer`] 的内存实现：按路径存放模块信息，按需计算传递导入。

use std::collections::{BTreeSet, HashMap, VecDeque};

use super::{Export, Importer, ModuleError, ModuleInfo};

/// 模块注册表
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    /// 模块映射（path -> ModuleInfo）
    modules: HashMap<String, ModuleInfo>,
}

impl ModuleRegistry {
    /// 创建新的注册表
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// 注册一个模块
    pub fn register(
        &mut self,
        module: ModuleInfo,
    ) {
        self.modules.insert(module.path.clone(), module);
    }

    /// 获取模块信息
    pub fn get(
        &self,
        path: &str,
    ) -> Option<&ModuleInfo> {
        self.modules.get(path)
    }

    /// 解析 `path.Name` 形式的导出项
    pub fn resolve_export(
        &self,
        path: &str,
        name: &str,
    ) -> Result<&Export, ModuleError> {
        let module = self.module(path)?;
        module
            .get_export(name)
            .ok_or_else(|| ModuleError::ExportNotFound {
                name: name.to_string(),
                module_path: path.to_string(),
            })
    }
}

impl Importer for ModuleRegistry {
    fn module(
        &self,
        path: &str,
    ) -> Result<&ModuleInfo, ModuleError> {
        self.modules.get(path).ok_or_else(|| ModuleError::NotFound {
            path: path.to_string(),
        })
    }

    fn transitive_imports(
        &self,
        path: &str,
    ) -> Result<Vec<String>, ModuleError> {
        let root = self.module(path)?;

        // 依赖图可能有环，用已访问集合截断
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<&str> = root.imports.iter().map(String::as_str).collect();
        while let Some(next) = queue.pop_front() {
            if next == path || !seen.insert(next.to_string()) {
                continue;
            }
            // 未注册的依赖也算进闭包，只是不再继续展开
            if let Some(module) = self.modules.get(next) {
                queue.extend(module.imports.iter().map(String::as_str));
            }
        }
        Ok(seen.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::module::{ExportKind, ModuleSource};

    fn module(
        path: &str,
        imports: &[&str],
    ) -> ModuleInfo {
        let mut info = ModuleInfo::new(path, ModuleSource::External);
        for i in imports {
            info.add_import(*i);
        }
        info
    }

    #[test]
    fn test_transitive_imports_sorted_and_deduplicated() {
        let mut registry = ModuleRegistry::new();
        registry.register(module("app", &["z/log", "a/util"]));
        registry.register(module("a/util", &["fmt", "z/log"]));
        registry.register(module("z/log", &["fmt"]));
        registry.register(module("fmt", &[]));

        let imports = registry.transitive_imports("app").unwrap();
        assert_eq!(imports, vec!["a/util", "fmt", "z/log"]);
    }

    #[test]
    fn test_transitive_imports_survive_cycles() {
        let mut registry = ModuleRegistry::new();
        registry.register(module("a", &["b"]));
        registry.register(module("b", &["a", "c"]));

        let imports = registry.transitive_imports("a").unwrap();
        assert_eq!(imports, vec!["b", "c"]);
    }

    #[test]
    fn test_unknown_module() {
        let registry = ModuleRegistry::new();
        assert!(matches!(
            registry.transitive_imports("nope"),
            Err(ModuleError::NotFound { .. })
        ));
        assert!(!registry.is_batch("nope"));
    }

    #[test]
    fn test_resolve_export_and_first_referenceable() {
        let mut info = ModuleInfo::new("strs", ModuleSource::External);
        info.add_export(Export::new("helper", ExportKind::Func))
            .add_export(Export::generic("Map", ExportKind::Func))
            .add_export(Export::new("Reader", ExportKind::Type))
            .add_export(Export::new("Max", ExportKind::Const));
        let mut registry = ModuleRegistry::new();
        registry.register(info);

        assert_eq!(registry.resolve_export("strs", "Reader").unwrap().kind, ExportKind::Type);
        assert!(registry.resolve_export("strs", "Nope").is_err());

        // 名字顺序: Map (泛型, 跳过), Max, Reader, helper (未导出)
        let first = registry.get("strs").unwrap().first_referenceable().unwrap();
        assert_eq!(first.name, "Max");
    }
}
