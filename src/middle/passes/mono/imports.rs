//! 导入整理
//!
//! 降级后的文件可能引用原文件没有直接导入的模块（类型实参来自间接依赖），
//! 所以输出导入取本模块和每个导入的传递闭包，排序去重。
//! 为了不出现“导入未使用”，每个导入再追加一个 `_` 引用声明。

use std::collections::BTreeSet;

use tracing::{debug, trace};

use super::clone::UNSAFE_PATH;
use crate::frontend::ast::{Decl, DeclId, DeclKind, Expr, ImportSpec};
use crate::frontend::module::{ExportKind, ModuleError};
use crate::frontend::typecheck::errors::{LowerError, LowerResult};
use crate::session::Session;
use crate::util::span::Span;

/// 引用声明的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiscardKind {
    /// `type _ = pkg.Name`
    Type,
    /// `var _ = pkg.Name`
    Var,
    /// `const _ = pkg.Name`
    Const,
}

fn import_error(
    path: &str,
    err: ModuleError,
) -> LowerError {
    LowerError::ImportResolution {
        path: path.to_string(),
        reason: err.to_string(),
    }
}

impl Session<'_> {
    /// 合并导入并追加引用声明，返回最终的声明列表和导入列表
    pub(crate) fn finalize_imports(
        &mut self,
        mut decls: Vec<DeclId>,
    ) -> LowerResult<(Vec<DeclId>, Vec<ImportSpec>)> {
        let own = self.file.package.clone();
        let mut paths: BTreeSet<String> = match self.importer.transitive_imports(&own) {
            Ok(deps) => deps.into_iter().collect(),
            Err(ModuleError::NotFound { .. }) => BTreeSet::new(),
            Err(e) => return Err(import_error(&own, e)),
        };

        let mut imports: Vec<ImportSpec> = Vec::new();
        let mut direct: Vec<String> = Vec::new();
        for spec in &self.file.imports {
            if spec.name.is_some() {
                imports.push(spec.clone());
            }
            direct.push(spec.path.clone());
        }
        direct.extend(self.mono.extra_imports.iter().cloned());
        for path in direct {
            if !paths.insert(path.clone()) || path == UNSAFE_PATH {
                continue;
            }
            let deps = self
                .importer
                .transitive_imports(&path)
                .map_err(|e| import_error(&path, e))?;
            paths.extend(deps);
        }
        paths.remove(&own);
        imports.extend(paths.into_iter().map(ImportSpec::new));
        debug!("{} imports after merge", imports.len());

        if self.config.add_importable_name {
            let name = self.config.importable_name.clone();
            let int = self.synth_ident("int");
            let decl = self.file.push_decl(
                Decl {
                    name,
                    kind: DeclKind::Type {
                        tparams: Vec::new(),
                        alias: false,
                        typ: int,
                    },
                },
                Span::dummy(),
            );
            decls.push(decl);
        }

        if self.config.discard_imports {
            for spec in &imports {
                if spec.is_blank() || spec.is_dot() {
                    continue;
                }
                let (kind, sel) = self.discard_target(&spec.path)?;
                trace!("discard {}.{}", spec.local_name(), sel);
                let pkg = self.synth_ident(spec.local_name());
                let value = self.file.add_expr(Expr::Selector { x: pkg, sel }, Span::dummy());
                let kind = match kind {
                    DiscardKind::Type => DeclKind::Type {
                        tparams: Vec::new(),
                        alias: true,
                        typ: value,
                    },
                    DiscardKind::Var => DeclKind::Var {
                        typ: None,
                        value: Some(value),
                    },
                    DiscardKind::Const => DeclKind::Const {
                        typ: None,
                        value: Some(value),
                    },
                };
                let decl = self.file.push_decl(
                    Decl {
                        name: "_".to_string(),
                        kind,
                    },
                    Span::dummy(),
                );
                decls.push(decl);
            }
        }

        self.file.imports = imports.clone();
        Ok((decls, imports))
    }

    /// 导入模块里可以引用的名字
    fn discard_target(
        &self,
        path: &str,
    ) -> LowerResult<(DiscardKind, String)> {
        if path == UNSAFE_PATH {
            return Ok((DiscardKind::Type, "Pointer".to_string()));
        }
        if self.importer.is_batch(path) {
            return Ok((DiscardKind::Type, self.config.importable_name.clone()));
        }
        let module = self
            .importer
            .module(path)
            .map_err(|e| import_error(path, e))?;
        let export = module
            .first_referenceable()
            .ok_or_else(|| LowerError::ImportResolution {
                path: path.to_string(),
                reason: "can't find any importable name in package".to_string(),
            })?;
        let kind = match export.kind {
            ExportKind::Type => DiscardKind::Type,
            ExportKind::Var | ExportKind::Func => DiscardKind::Var,
            ExportKind::Const => DiscardKind::Const,
            ExportKind::Contract => {
                return Err(LowerError::ImportResolution {
                    path: path.to_string(),
                    reason: format!("'{}' is a contract", export.name),
                })
            }
        };
        Ok((kind, export.name.clone()))
    }

    fn synth_ident(
        &mut self,
        name: &str,
    ) -> crate::frontend::ast::ExprId {
        self.file.add_expr(Expr::Ident(name.to_string()), Span::dummy())
    }
}
