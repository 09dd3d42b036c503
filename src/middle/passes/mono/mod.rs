//! 单态化
//!
//! 把泛型函数和泛型类型特化为具体类型的声明。
//! 核心策略：
//! 1. 按需特化：只为实际引用到的类型实参组合生成声明
//! 2. 声明共享：语义相同的类型实参组合共用一份声明
//! 3. 工作队列：生成的声明进入同一个先进先出队列，和原声明一样被改写
//!
//! 泛型声明和合约本身不出现在输出里。

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use tracing::{debug, info, trace};

pub mod clone;
pub mod function;
pub mod imports;
pub mod instance;
pub mod subst;
#[cfg(test)]
pub mod tests;
pub mod type_mono;

use self::function::FunctionMonomorphizer;
use self::instance::{InFlight, Instantiation, SubstRecord, TypeInstantiation};
use self::type_mono::TypeMonomorphizer;

use crate::frontend::ast::{DeclId, DeclKind, Expr, ExprId, FuncSig};
use crate::frontend::typecheck::decl::{LocalScopes, Walk};
use crate::frontend::typecheck::errors::{LowerError, LowerResult};
use crate::frontend::typecheck::types::TypeId;
use crate::session::Session;

/// 单态化状态
#[derive(Debug, Default)]
pub struct MonoState {
    /// 泛型函数 -> 实例化记录
    pub(crate) func_insts: IndexMap<DeclId, Vec<Instantiation>>,
    /// 泛型类型 -> 实例化记录
    pub(crate) type_insts: IndexMap<DeclId, Vec<TypeInstantiation>>,
    /// 正在生成的类型实例
    pub(crate) in_flight: Vec<InFlight>,
    /// 代入缓存
    pub(crate) subst_memo: HashMap<TypeId, Vec<SubstRecord>>,
    /// 泛型函数体里的局部类型 -> 各实例中复制出的类型
    pub(crate) local_types: HashMap<TypeId, Vec<SubstRecord>>,
    /// 待改写的声明
    pub(crate) queue: VecDeque<DeclId>,
    /// 已分配的生成名
    pub(crate) used_names: HashSet<String>,
    /// 合成类型表达式引入的额外导入
    pub(crate) extra_imports: Vec<String>,
}

impl MonoState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 生成的函数实例总数
    pub fn func_instance_count(&self) -> usize {
        self.func_insts.values().map(Vec::len).sum()
    }

    /// 生成的类型实例总数
    pub fn type_instance_count(&self) -> usize {
        self.type_insts.values().map(Vec::len).sum()
    }
}

impl Session<'_> {
    /// 单态化状态
    pub fn mono_state(&self) -> &MonoState {
        &self.mono
    }

    /// 取得泛型函数或泛型类型的实例，返回生成的声明名
    pub fn instantiate(
        &mut self,
        generic: DeclId,
        targs: &[TypeId],
    ) -> LowerResult<String> {
        let span = self.file.decl_span(generic);
        let d = self.file.decl(generic);
        let is_type = matches!(d.kind, DeclKind::Type { .. });
        let is_func = matches!(d.kind, DeclKind::Func { recv: None, .. });
        if is_type {
            Ok(self.instantiate_type(generic, targs, span)?.0)
        } else if is_func {
            Ok(self.instantiate_func(generic, targs, span)?.0)
        } else {
            Err(LowerError::unsupported(
                format!("instantiation of '{}'", self.file.decl(generic).name),
                span,
            ))
        }
    }

    /// 改写全部声明，返回输出声明（按处理顺序）
    pub(crate) fn monomorphize(&mut self) -> LowerResult<Vec<DeclId>> {
        info!("monomorphizing '{}'", self.file.package);
        self.mono.queue.extend(self.file.decls.iter().copied());
        let mut out = Vec::new();
        while let Some(decl) = self.mono.queue.pop_front() {
            if matches!(self.file.decl(decl).kind, DeclKind::Contract { .. })
                || self.is_generic_decl(decl)
            {
                trace!("skip generic '{}'", self.file.decl(decl).name);
                continue;
            }
            self.rewrite_decl(decl)?;
            out.push(decl);
        }
        debug!(
            "{} function instances, {} type instances",
            self.mono.func_instance_count(),
            self.mono.type_instance_count()
        );
        Ok(out)
    }

    fn rewrite_decl(
        &mut self,
        decl: DeclId,
    ) -> LowerResult<()> {
        let mut locals = LocalScopes::new();
        match self.file.decl(decl).kind.clone() {
            DeclKind::Const { typ, value } | DeclKind::Var { typ, value } => {
                for e in [typ, value].into_iter().flatten() {
                    self.rewrite_expr(e, &mut locals)?;
                }
                Ok(())
            }
            DeclKind::Type { typ, .. } => self.rewrite_expr(typ, &mut locals),
            DeclKind::Func {
                recv, sig, body, ..
            } => {
                if let Some(recv) = &recv {
                    self.rewrite_expr(recv.typ, &mut locals)?;
                    if let Some(name) = &recv.name {
                        locals.bind(name);
                    }
                }
                self.rewrite_sig(&sig, &mut locals)?;
                locals.bind_sig(&sig);
                match body {
                    Some(body) => self.walk_stmt(body, &mut locals, Walk::Rewrite),
                    None => Ok(()),
                }
            }
            DeclKind::Contract { .. } => Ok(()),
        }
    }

    fn rewrite_sig(
        &mut self,
        sig: &FuncSig,
        locals: &mut LocalScopes,
    ) -> LowerResult<()> {
        for field in sig.params.iter().chain(&sig.results) {
            self.rewrite_expr(field.typ, locals)?;
        }
        Ok(())
    }

    fn rewrite_list(
        &mut self,
        exprs: &[ExprId],
        locals: &mut LocalScopes,
    ) -> LowerResult<()> {
        exprs.iter().try_for_each(|e| self.rewrite_expr(*e, locals))
    }

    /// 把对泛型实体的引用改写成对生成声明的引用
    pub(crate) fn rewrite_expr(
        &mut self,
        expr: ExprId,
        locals: &mut LocalScopes,
    ) -> LowerResult<()> {
        let span = self.file.expr_span(expr);
        match self.file.expr(expr).clone() {
            Expr::Ident(name) => match self.generic_base(expr, locals) {
                Some(_) => Err(LowerError::unsupported(
                    format!("reference to generic '{}' without instantiation", name),
                    span,
                )),
                None => Ok(()),
            },
            Expr::BasicLit { .. } => Ok(()),
            Expr::Index { x, indices } => match self.generic_base(x, locals) {
                Some(base) => {
                    let mut targs = Vec::with_capacity(indices.len());
                    for &idx in &indices {
                        let t = self.info.type_of(idx).ok_or_else(|| {
                            LowerError::incomplete("type of type argument", self.file.expr_span(idx))
                        })?;
                        targs.push(t);
                    }
                    let is_type = matches!(self.file.decl(base).kind, DeclKind::Type { .. });
                    let (name, typ) = if is_type {
                        self.instantiate_type(base, &targs, span)?
                    } else {
                        self.instantiate_func(base, &targs, span)?
                    };
                    self.file.replace_expr(expr, Expr::Ident(name));
                    self.info.record_type(expr, typ);
                    Ok(())
                }
                None => {
                    self.rewrite_expr(x, locals)?;
                    self.rewrite_list(&indices, locals)
                }
            },
            Expr::Call { fun, args, .. } => {
                let f = self.file.unparen(fun);
                let generic = self
                    .generic_base(f, locals)
                    .filter(|b| matches!(self.file.decl(*b).kind, DeclKind::Func { .. }));
                match generic {
                    Some(base) if matches!(self.file.expr(f), Expr::Ident(_)) => {
                        self.rewrite_inferred_call(expr, f, base)?;
                    }
                    _ => self.rewrite_expr(fun, locals)?,
                }
                self.rewrite_list(&args, locals)
            }
            Expr::Selector { x, sel } => {
                if let Expr::Ident(pkg) = self.file.expr(self.file.unparen(x)) {
                    if !locals.contains(pkg) && !self.resolver.scope.contains_key(pkg) {
                        if let Some(path) = self.import_path(pkg) {
                            let generic = self
                                .importer
                                .module(&path)
                                .ok()
                                .and_then(|m| m.get_export(&sel))
                                .is_some_and(|e| e.generic);
                            if generic {
                                return Err(LowerError::unsupported(
                                    format!("generic '{}.{}' from another module", pkg, sel),
                                    span,
                                ));
                            }
                            return Ok(());
                        }
                    }
                }
                self.rewrite_expr(x, locals)
            }
            Expr::FuncLit { sig, body } => {
                self.rewrite_sig(&sig, locals)?;
                locals.push();
                locals.bind_sig(&sig);
                let result = self.walk_stmt(body, locals, Walk::Rewrite);
                locals.pop();
                result
            }
            Expr::KeyValue { key, value } => {
                if !matches!(self.file.expr(key), Expr::Ident(_)) {
                    self.rewrite_expr(key, locals)?;
                }
                self.rewrite_expr(value, locals)
            }
            Expr::Composite { typ, elts } => {
                if let Some(typ) = typ {
                    self.rewrite_expr(typ, locals)?;
                }
                self.rewrite_list(&elts, locals)
            }
            Expr::Paren(x) | Expr::Star(x) | Expr::Unary { x, .. } => self.rewrite_expr(x, locals),
            Expr::Binary { x, y, .. } => {
                self.rewrite_expr(x, locals)?;
                self.rewrite_expr(y, locals)
            }
            Expr::Slice { x, lo, hi, max } => {
                self.rewrite_expr(x, locals)?;
                for e in [lo, hi, max].into_iter().flatten() {
                    self.rewrite_expr(e, locals)?;
                }
                Ok(())
            }
            Expr::TypeAssert { x, typ } => {
                self.rewrite_expr(x, locals)?;
                match typ {
                    Some(typ) => self.rewrite_expr(typ, locals),
                    None => Ok(()),
                }
            }
            Expr::ArrayType { len, elem } => {
                if let Some(len) = len {
                    self.rewrite_expr(len, locals)?;
                }
                self.rewrite_expr(elem, locals)
            }
            Expr::StructType { fields } => fields
                .iter()
                .try_for_each(|f| self.rewrite_expr(f.typ, locals)),
            Expr::FuncType(sig) => self.rewrite_sig(&sig, locals),
            Expr::InterfaceType { methods, embeds } => {
                for m in &methods {
                    self.rewrite_sig(&m.sig, locals)?;
                }
                self.rewrite_list(&embeds, locals)
            }
            Expr::MapType { key, value } => {
                self.rewrite_expr(key, locals)?;
                self.rewrite_expr(value, locals)
            }
            Expr::ChanType { elem, .. } => self.rewrite_expr(elem, locals),
            Expr::Bad => Err(LowerError::unsupported("malformed expression", span)),
        }
    }

    /// `F(x)`：用外部推断出的类型实参实例化
    fn rewrite_inferred_call(
        &mut self,
        call: ExprId,
        fun: ExprId,
        base: DeclId,
    ) -> LowerResult<()> {
        let span = self.file.expr_span(call);
        let inferred = self
            .info
            .inferred(call)
            .map(<[TypeId]>::to_vec)
            .ok_or_else(|| {
                LowerError::incomplete(
                    format!("inferred type arguments for call to '{}'", self.file.decl(base).name),
                    span,
                )
            })?;
        // 合成的类型表达式节点记下的类型已经规范化
        let mut targs = Vec::with_capacity(inferred.len());
        for t in inferred {
            let node = self.type_to_expr(t, span)?;
            targs.push(self.info.type_of(node).unwrap_or(t));
        }
        let (name, typ) = self.instantiate_func(base, &targs, span)?;
        self.file.replace_expr(fun, Expr::Ident(name));
        self.info.record_type(fun, typ);
        Ok(())
    }
}
