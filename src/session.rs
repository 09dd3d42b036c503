//! 降级会话
//!
//! 一个 [`Session`] 负责一个源文件：持有语法树、类型 arena、类型信息表、
//! 诊断收集器以及解析器和单态化的全部缓存。会话之间不共享任何状态。
//!
//! ```ignore
//! let mut session = Session::new(file, store, info, &registry, LowerConfig::default());
//! session.check()?;
//! let lowered = session.translate()?;
//! ```

use tracing::{debug, info};

use crate::frontend::ast::{DeclId, DeclKind, File, ImportSpec};
use crate::frontend::module::Importer;
use crate::frontend::typecheck::decl::ResolverState;
use crate::frontend::typecheck::errors::LowerResult;
use crate::frontend::typecheck::info::TypeInfo;
use crate::frontend::typecheck::types::{TypeId, TypeStore};
use crate::middle::passes::mono::MonoState;
use crate::util::config::LowerConfig;
use crate::util::diagnostic::{Diagnostic, ErrorCollector};

/// 降级结果
#[derive(Debug)]
pub struct LoweredFile {
    /// 改写后的语法树（含生成的声明）
    pub file: File,
    /// 输出的顶层声明，按处理顺序
    pub decls: Vec<DeclId>,
    /// 合并后的导入列表
    pub imports: Vec<ImportSpec>,
    pub store: TypeStore,
    pub info: TypeInfo,
    /// 非致命诊断
    pub diagnostics: Vec<Diagnostic>,
}

impl LoweredFile {
    /// 按名字查找输出的声明
    pub fn find_decl(
        &self,
        name: &str,
    ) -> Option<DeclId> {
        self.decls
            .iter()
            .copied()
            .find(|d| self.file.decl(*d).name == name)
    }

    /// 输出声明的名字，按输出顺序
    pub fn decl_names(&self) -> Vec<&str> {
        self.decls
            .iter()
            .map(|d| self.file.decl(*d).name.as_str())
            .collect()
    }
}

/// 单个文件的降级会话
pub struct Session<'a> {
    pub(crate) file: File,
    pub(crate) store: TypeStore,
    pub(crate) info: TypeInfo,
    pub(crate) diags: ErrorCollector,
    pub(crate) config: LowerConfig,
    pub(crate) importer: &'a dyn Importer,
    pub(crate) resolver: ResolverState,
    pub(crate) mono: MonoState,
    checked: bool,
}

impl<'a> Session<'a> {
    /// 创建会话
    ///
    /// `info` 中的 `TypeId` 必须来自 `store`。
    pub fn new(
        file: File,
        store: TypeStore,
        info: TypeInfo,
        importer: &'a dyn Importer,
        config: LowerConfig,
    ) -> Self {
        let resolver = ResolverState::new(&file);
        Self {
            file,
            store,
            info,
            diags: ErrorCollector::new(),
            config,
            importer,
            resolver,
            mono: MonoState::new(),
            checked: false,
        }
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn store(&self) -> &TypeStore {
        &self.store
    }

    pub fn info(&self) -> &TypeInfo {
        &self.info
    }

    /// 类型信息表
    ///
    /// 值表达式的类型可能引用类型参数，外部检查器要在 [`Session::check`]
    /// 之后通过 [`Session::type_param`] 取得类型参数再补记。
    pub fn info_mut(&mut self) -> &mut TypeInfo {
        &mut self.info
    }

    pub fn store_mut(&mut self) -> &mut TypeStore {
        &mut self.store
    }

    pub fn config(&self) -> &LowerConfig {
        &self.config
    }

    /// 泛型声明中名为 `name` 的类型参数
    pub fn type_param(
        &self,
        decl: DeclId,
        name: &str,
    ) -> Option<TypeId> {
        self.resolver.decl_tparams.get(&decl)?.get(name).copied()
    }

    /// 目前收集到的诊断
    pub fn diagnostics(&self) -> &ErrorCollector {
        &self.diags
    }

    /// 按源码顺序解析全部普通声明，然后执行延后的检查
    ///
    /// 合约只在被引用时解析。
    pub fn check(&mut self) -> LowerResult<()> {
        if self.checked {
            return Ok(());
        }
        info!("checking '{}' ({} decls)", self.file.package, self.file.decls.len());
        for decl in self.file.decls.clone() {
            if matches!(self.file.decl(decl).kind, DeclKind::Contract { .. }) {
                continue;
            }
            self.resolve(decl)?;
        }
        self.drain_later()?;
        self.report_init_cycles();
        self.checked = true;
        debug!("check done, {} diagnostics", self.diags.len());
        Ok(())
    }

    /// 单态化并整理导入，消费会话
    pub fn translate(mut self) -> LowerResult<LoweredFile> {
        self.check()?;
        let decls = self.monomorphize()?;
        let (decls, imports) = self.finalize_imports(decls)?;
        info!(
            "lowered '{}': {} decls, {} imports",
            self.file.package,
            decls.len(),
            imports.len()
        );
        Ok(LoweredFile {
            file: self.file,
            decls,
            imports,
            store: self.store,
            info: self.info,
            diagnostics: self.diags.into_vec(),
        })
    }
}

/// 一步完成检查与降级
pub fn lower(
    file: File,
    store: TypeStore,
    info: TypeInfo,
    importer: &dyn Importer,
    config: LowerConfig,
) -> LowerResult<LoweredFile> {
    Session::new(file, store, info, importer, config).translate()
}
