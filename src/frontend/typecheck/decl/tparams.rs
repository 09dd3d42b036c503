//! 类型参数与合约
//!
//! 参数列表中的所有参数先以空接口为约束声明出来，再逐组求值约束，
//! 所以约束里可以互相引用。约束有三种写法：
//! - 接口类型表达式
//! - 裸合约名 `C`：作用于本组的全部名字，个数必须一致
//! - 合约应用 `C(T, U)`：实参必须是本列表中尚未用过的类型参数

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use super::{ContractInfo, Session};
use crate::frontend::ast::{DeclId, DeclKind, Expr, ExprId, TypeParamGroup};
use crate::frontend::typecheck::errors::{LowerError, LowerResult};
use crate::frontend::typecheck::types::{TypeData, TypeId, TypeParam};
use crate::util::diagnostic::codes::ErrorCodeDefinition;
use crate::util::span::Span;

impl Session<'_> {
    /// 声明 `owner` 的类型参数列表，返回名字到类型参数的映射（声明顺序）
    pub(crate) fn collect_type_params(
        &mut self,
        owner: DeclId,
        groups: &[TypeParamGroup],
    ) -> LowerResult<IndexMap<String, TypeId>> {
        let empty = self.store.empty_interface();
        let mut scope = IndexMap::new();
        let mut ids = Vec::new();
        for group in groups {
            for (name, _) in &group.names {
                let tp = self.store.alloc(TypeData::TypeParam(TypeParam {
                    name: name.clone(),
                    owner,
                    index: ids.len(),
                    bound: empty,
                }));
                ids.push(tp);
                scope.insert(name.clone(), tp);
            }
        }

        // 每个类型参数最多作为一次合约实参
        let mut unused: HashMap<TypeId, bool> = ids.iter().map(|t| (*t, true)).collect();

        self.resolver.tparam_scopes.push(scope.clone());
        let mut index = 0;
        let mut result = Ok(());
        for group in groups {
            let members = &ids[index..index + group.names.len()];
            index += group.names.len();
            let Some(bound) = group.bound else {
                continue;
            };
            result = self.bound_group(members, bound, &mut unused);
            if result.is_err() {
                break;
            }
        }
        self.resolver.tparam_scopes.pop();
        result?;
        Ok(scope)
    }

    fn bound_group(
        &mut self,
        members: &[TypeId],
        bound: ExprId,
        unused: &mut HashMap<TypeId, bool>,
    ) -> LowerResult<()> {
        let span = self.file.expr_span(bound);
        let expr = self.file.unparen(bound);
        let (head, args) = match self.file.expr(expr) {
            Expr::Call { fun, args, .. } => (self.file.unparen(*fun), Some(args.clone())),
            _ => (expr, None),
        };
        if let Some(contract) = self.contract_ref(head)? {
            return self.apply_contract(contract, members, args, span, unused);
        }

        let bound = self.eval_type(bound)?;
        if self.store.is_invalid(bound) {
            return Ok(());
        }
        let under = self.under(bound)?;
        if matches!(self.store.get(under), TypeData::Interface(_)) {
            for &tp in members {
                self.store.set_bound(tp, bound);
            }
        } else {
            let shown = self.store.display(bound).to_string();
            let diagnostic = ErrorCodeDefinition::not_interface_or_contract(&shown)
                .at(span)
                .build();
            self.diags.push(diagnostic);
        }
        Ok(())
    }

    /// 表达式是否引用一个合约；是则返回解析后的合约
    fn contract_ref(
        &mut self,
        head: ExprId,
    ) -> LowerResult<Option<ContractInfo>> {
        match self.file.expr(head) {
            Expr::Ident(name) => {
                if self.resolver.lookup_tparam(name).is_some() {
                    return Ok(None);
                }
                let Some(&decl) = self.resolver.scope.get(name) else {
                    return Ok(None);
                };
                if !matches!(self.file.decl(decl).kind, DeclKind::Contract { .. }) {
                    return Ok(None);
                }
                self.resolve(decl)?;
                Ok(self.resolver.contract(decl).cloned())
            }
            Expr::Selector { x, sel } => {
                let Expr::Ident(pkg) = self.file.expr(self.file.unparen(*x)) else {
                    return Ok(None);
                };
                let Some(path) = self.import_path(pkg) else {
                    return Ok(None);
                };
                let is_contract = self
                    .importer
                    .module(&path)
                    .ok()
                    .and_then(|m| m.get_export(sel))
                    .is_some_and(|e| e.kind == crate::frontend::module::ExportKind::Contract);
                if is_contract {
                    return Err(LowerError::unsupported(
                        format!("contract '{}' from another module", sel),
                        self.file.expr_span(head),
                    ));
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn apply_contract(
        &mut self,
        contract: ContractInfo,
        members: &[TypeId],
        args: Option<Vec<ExprId>>,
        span: Span,
        unused: &mut HashMap<TypeId, bool>,
    ) -> LowerResult<()> {
        let expected = contract.tparams.len();
        let targs: Vec<TypeId> = match args {
            // 裸合约名：本组的名字就是实参
            None => {
                if members.len() != expected {
                    let diagnostic = ErrorCodeDefinition::contract_arity(members.len(), expected)
                        .at(span)
                        .build();
                    self.diags.push(diagnostic);
                    return Ok(());
                }
                members.to_vec()
            }
            Some(args) => {
                if args.len() != expected {
                    let diagnostic = ErrorCodeDefinition::contract_arity(args.len(), expected)
                        .at(span)
                        .build();
                    self.diags.push(diagnostic);
                    for arg in args {
                        self.eval_type(arg)?;
                    }
                    return Ok(());
                }
                let mut targs = Vec::with_capacity(args.len());
                for arg in &args {
                    if let Some(t) = self.contract_arg(*arg, unused)? {
                        targs.push(t);
                    }
                }
                if targs.len() != args.len() {
                    return Ok(());
                }
                targs
            }
        };

        for (i, &tp) in targs.iter().enumerate() {
            let bound = self.substitute(&contract.tparams, &targs, contract.bounds[i])?;
            self.store.set_bound(tp, bound);
        }
        debug!("contract bounds applied to {} type parameters", targs.len());
        Ok(())
    }

    /// 合约实参：必须是本列表中尚未用过的类型参数
    fn contract_arg(
        &mut self,
        arg: ExprId,
        unused: &mut HashMap<TypeId, bool>,
    ) -> LowerResult<Option<TypeId>> {
        let span = self.file.expr_span(arg);
        let targ = self.eval_type(arg)?;
        if self.store.type_param(targ).is_some() {
            let name = self.store.display(targ).to_string();
            match unused.get_mut(&targ) {
                Some(fresh) if *fresh => {
                    *fresh = false;
                    return Ok(Some(targ));
                }
                Some(_) => {
                    let diagnostic = ErrorCodeDefinition::contract_arg_reused(&name).at(span).build();
                    self.diags.push(diagnostic);
                }
                None => {
                    let diagnostic = ErrorCodeDefinition::contract_arg_not_incoming(&name)
                        .at(span)
                        .build();
                    self.diags.push(diagnostic);
                }
            }
        } else if !self.store.is_invalid(targ) {
            let shown = self.store.display(targ).to_string();
            let diagnostic = ErrorCodeDefinition::contract_arg_not_type_param(&shown)
                .at(span)
                .build();
            self.diags.push(diagnostic);
        }
        Ok(None)
    }

    /// 解析合约声明：参数以空接口声明，约束必须是接口
    pub(super) fn resolve_contract_decl(
        &mut self,
        decl: DeclId,
        params: &[(String, Span)],
        bounds: &[Option<ExprId>],
    ) -> LowerResult<TypeId> {
        let empty = self.store.empty_interface();
        let mut scope = IndexMap::new();
        let mut tparams = Vec::with_capacity(params.len());
        for (index, (name, _)) in params.iter().enumerate() {
            let tp = self.store.alloc(TypeData::TypeParam(TypeParam {
                name: name.clone(),
                owner: decl,
                index,
                bound: empty,
            }));
            tparams.push(tp);
            scope.insert(name.clone(), tp);
        }

        self.resolver.tparam_scopes.push(scope);
        let resolved = self.contract_bounds(&tparams, bounds);
        self.resolver.tparam_scopes.pop();
        let bounds = resolved?;

        for (&tp, &bound) in tparams.iter().zip(&bounds) {
            self.store.set_bound(tp, bound);
        }
        debug!(
            "contract '{}' with {} parameters",
            self.file.decl(decl).name,
            tparams.len()
        );
        self.resolver
            .contracts
            .insert(decl, ContractInfo { tparams, bounds });
        Ok(self.store.invalid())
    }

    fn contract_bounds(
        &mut self,
        tparams: &[TypeId],
        bounds: &[Option<ExprId>],
    ) -> LowerResult<Vec<TypeId>> {
        let mut result = Vec::with_capacity(tparams.len());
        for i in 0..tparams.len() {
            let Some(expr) = bounds.get(i).copied().flatten() else {
                result.push(self.store.empty_interface());
                continue;
            };
            let bound = self.eval_type(expr)?;
            let under = self.under(bound)?;
            if matches!(self.store.get(under), TypeData::Interface(_)) || self.store.is_invalid(bound) {
                result.push(bound);
            } else {
                let shown = self.store.display(bound).to_string();
                let diagnostic = ErrorCodeDefinition::not_interface_or_contract(&shown)
                    .at(self.file.expr_span(expr))
                    .build();
                self.diags.push(diagnostic);
                result.push(self.store.invalid());
            }
        }
        Ok(result)
    }
}
