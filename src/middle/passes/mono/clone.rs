//! 声明复制与类型重建
//!
//! 实例化时复制泛型声明的语法树：类型参数名换成类型实参的类型表达式，
//! 每个复制出的节点都带上代入后的类型和推断实参，后续改写只看这些记录。

use std::collections::HashMap;

use indexmap::IndexMap;

use super::type_mono::TypeMonomorphizer;
use super::instance::{SubstRecord, TypeArgs};
use crate::frontend::ast::{
    CaseClause, CommClause, Decl, DeclId, DeclKind, Expr, ExprId, Field, FuncSig,
    InterfaceMethod, LitKind, Stmt, StmtId,
};
use crate::frontend::typecheck::decl::Color;
use crate::frontend::typecheck::errors::{LowerError, LowerResult};
use crate::frontend::typecheck::types::{
    BasicKind, Completion, NamedObj, NamedType, Signature, TypeData, TypeId,
};
use crate::session::Session;
use crate::util::span::Span;

/// `unsafe` 伪模块
pub const UNSAFE_PATH: &str = "unsafe";

/// 一次复制的代入上下文
#[derive(Debug, Clone)]
pub(crate) struct CopyCtx {
    pub params: Vec<TypeId>,
    pub args: Vec<TypeId>,
    /// 类型参数名 -> 类型实参
    pub names: HashMap<String, TypeId>,
}

impl CopyCtx {
    /// 按位置把 `scope` 中的类型参数对应到 `args`
    pub fn new(
        scope: &IndexMap<String, TypeId>,
        args: &[TypeId],
    ) -> Self {
        Self {
            params: scope.values().copied().collect(),
            args: args.to_vec(),
            names: scope.keys().cloned().zip(args.iter().copied()).collect(),
        }
    }
}

impl Session<'_> {
    pub(crate) fn copy_expr(
        &mut self,
        expr: ExprId,
        ctx: &CopyCtx,
    ) -> LowerResult<ExprId> {
        let span = self.file.expr_span(expr);
        let copied = match self.file.expr(expr).clone() {
            Expr::Ident(name) => {
                if let Some(&arg) = ctx.names.get(&name) {
                    return self.type_to_expr(arg, span);
                }
                Expr::Ident(name)
            }
            e @ Expr::BasicLit { .. } => e,
            Expr::Composite { typ, elts } => Expr::Composite {
                typ: self.copy_opt(typ, ctx)?,
                elts: self.copy_list(&elts, ctx)?,
            },
            Expr::KeyValue { key, value } => {
                // 字段名原样保留
                let key = match self.file.expr(key) {
                    Expr::Ident(name) => {
                        let name = name.clone();
                        let k = self.file.add_expr(Expr::Ident(name), self.file.expr_span(key));
                        self.copy_types(key, k, ctx)?;
                        k
                    }
                    _ => self.copy_expr(key, ctx)?,
                };
                Expr::KeyValue {
                    key,
                    value: self.copy_expr(value, ctx)?,
                }
            }
            Expr::FuncLit { sig, body } => Expr::FuncLit {
                sig: self.copy_sig(&sig, ctx)?,
                body: self.copy_stmt(body, ctx)?,
            },
            Expr::Paren(x) => Expr::Paren(self.copy_expr(x, ctx)?),
            Expr::Selector { x, sel } => Expr::Selector {
                x: self.copy_expr(x, ctx)?,
                sel,
            },
            Expr::Index { x, indices } => Expr::Index {
                x: self.copy_expr(x, ctx)?,
                indices: self.copy_list(&indices, ctx)?,
            },
            Expr::Slice { x, lo, hi, max } => Expr::Slice {
                x: self.copy_expr(x, ctx)?,
                lo: self.copy_opt(lo, ctx)?,
                hi: self.copy_opt(hi, ctx)?,
                max: self.copy_opt(max, ctx)?,
            },
            Expr::TypeAssert { x, typ } => Expr::TypeAssert {
                x: self.copy_expr(x, ctx)?,
                typ: self.copy_opt(typ, ctx)?,
            },
            Expr::Call {
                fun,
                args,
                ellipsis,
            } => Expr::Call {
                fun: self.copy_expr(fun, ctx)?,
                args: self.copy_list(&args, ctx)?,
                ellipsis,
            },
            Expr::Star(x) => Expr::Star(self.copy_expr(x, ctx)?),
            Expr::Unary { op, x } => Expr::Unary {
                op,
                x: self.copy_expr(x, ctx)?,
            },
            Expr::Binary { op, x, y } => Expr::Binary {
                op,
                x: self.copy_expr(x, ctx)?,
                y: self.copy_expr(y, ctx)?,
            },
            Expr::ArrayType { len, elem } => Expr::ArrayType {
                len: self.copy_opt(len, ctx)?,
                elem: self.copy_expr(elem, ctx)?,
            },
            Expr::StructType { fields } => Expr::StructType {
                fields: fields
                    .iter()
                    .map(|f| self.copy_field(f, ctx))
                    .collect::<LowerResult<_>>()?,
            },
            Expr::FuncType(sig) => Expr::FuncType(self.copy_sig(&sig, ctx)?),
            Expr::InterfaceType { methods, embeds } => {
                let mut copied = Vec::with_capacity(methods.len());
                for m in &methods {
                    copied.push(InterfaceMethod {
                        name: m.name.clone(),
                        sig: self.copy_sig(&m.sig, ctx)?,
                        span: m.span,
                    });
                }
                Expr::InterfaceType {
                    methods: copied,
                    embeds: self.copy_list(&embeds, ctx)?,
                }
            }
            Expr::MapType { key, value } => Expr::MapType {
                key: self.copy_expr(key, ctx)?,
                value: self.copy_expr(value, ctx)?,
            },
            Expr::ChanType { dir, elem } => Expr::ChanType {
                dir,
                elem: self.copy_expr(elem, ctx)?,
            },
            Expr::Bad => return Err(LowerError::unsupported("malformed expression", span)),
        };
        let new = self.file.add_expr(copied, span);
        self.copy_types(expr, new, ctx)?;
        Ok(new)
    }

    /// 把旧节点的类型、推断实参和常量值代入后记到新节点上
    fn copy_types(
        &mut self,
        old: ExprId,
        new: ExprId,
        ctx: &CopyCtx,
    ) -> LowerResult<()> {
        if let Some(t) = self.info.type_of(old) {
            let t = self.substitute(&ctx.params, &ctx.args, t)?;
            self.info.record_type(new, t);
        }
        if let Some(inferred) = self.info.inferred(old).map(<[TypeId]>::to_vec) {
            let mut targs = Vec::with_capacity(inferred.len());
            for t in inferred {
                targs.push(self.substitute(&ctx.params, &ctx.args, t)?);
            }
            self.info.record_inferred(new, targs);
        }
        if let Some(v) = self.info.value_of(old) {
            self.info.record_value(new, v);
        }
        Ok(())
    }

    fn copy_opt(
        &mut self,
        expr: Option<ExprId>,
        ctx: &CopyCtx,
    ) -> LowerResult<Option<ExprId>> {
        expr.map(|e| self.copy_expr(e, ctx)).transpose()
    }

    fn copy_list(
        &mut self,
        exprs: &[ExprId],
        ctx: &CopyCtx,
    ) -> LowerResult<Vec<ExprId>> {
        exprs.iter().map(|e| self.copy_expr(*e, ctx)).collect()
    }

    pub(crate) fn copy_field(
        &mut self,
        field: &Field,
        ctx: &CopyCtx,
    ) -> LowerResult<Field> {
        Ok(Field {
            typ: self.copy_expr(field.typ, ctx)?,
            ..field.clone()
        })
    }

    pub(crate) fn copy_sig(
        &mut self,
        sig: &FuncSig,
        ctx: &CopyCtx,
    ) -> LowerResult<FuncSig> {
        let params = sig
            .params
            .iter()
            .map(|f| self.copy_field(f, ctx))
            .collect::<LowerResult<_>>()?;
        let results = sig
            .results
            .iter()
            .map(|f| self.copy_field(f, ctx))
            .collect::<LowerResult<_>>()?;
        Ok(FuncSig {
            params,
            results,
            variadic: sig.variadic,
        })
    }

    pub(crate) fn copy_stmt(
        &mut self,
        stmt: StmtId,
        ctx: &CopyCtx,
    ) -> LowerResult<StmtId> {
        let span = self.file.stmt_span(stmt);
        let copied = match self.file.stmt(stmt).clone() {
            Stmt::Block(stmts) => Stmt::Block(
                stmts
                    .iter()
                    .map(|s| self.copy_stmt(*s, ctx))
                    .collect::<LowerResult<_>>()?,
            ),
            Stmt::Expr(x) => Stmt::Expr(self.copy_expr(x, ctx)?),
            Stmt::Decl(decl) => Stmt::Decl(self.copy_local_decl(decl, ctx)?),
            Stmt::Assign { lhs, rhs, define } => Stmt::Assign {
                lhs: self.copy_list(&lhs, ctx)?,
                rhs: self.copy_list(&rhs, ctx)?,
                define,
            },
            Stmt::IncDec { x, inc } => Stmt::IncDec {
                x: self.copy_expr(x, ctx)?,
                inc,
            },
            Stmt::Return(results) => Stmt::Return(self.copy_list(&results, ctx)?),
            Stmt::If {
                init,
                cond,
                then,
                els,
            } => Stmt::If {
                init: init.map(|s| self.copy_stmt(s, ctx)).transpose()?,
                cond: self.copy_expr(cond, ctx)?,
                then: self.copy_stmt(then, ctx)?,
                els: els.map(|s| self.copy_stmt(s, ctx)).transpose()?,
            },
            Stmt::For {
                init,
                cond,
                post,
                body,
            } => Stmt::For {
                init: init.map(|s| self.copy_stmt(s, ctx)).transpose()?,
                cond: self.copy_opt(cond, ctx)?,
                post: post.map(|s| self.copy_stmt(s, ctx)).transpose()?,
                body: self.copy_stmt(body, ctx)?,
            },
            Stmt::Range {
                key,
                value,
                define,
                x,
                body,
            } => Stmt::Range {
                key: self.copy_opt(key, ctx)?,
                value: self.copy_opt(value, ctx)?,
                define,
                x: self.copy_expr(x, ctx)?,
                body: self.copy_stmt(body, ctx)?,
            },
            Stmt::Send { chan, value } => Stmt::Send {
                chan: self.copy_expr(chan, ctx)?,
                value: self.copy_expr(value, ctx)?,
            },
            Stmt::Switch { init, tag, clauses } => Stmt::Switch {
                init: init.map(|s| self.copy_stmt(s, ctx)).transpose()?,
                tag: self.copy_opt(tag, ctx)?,
                clauses: self.copy_clauses(&clauses, ctx)?,
            },
            Stmt::TypeSwitch {
                init,
                bind,
                x,
                clauses,
            } => Stmt::TypeSwitch {
                init: init.map(|s| self.copy_stmt(s, ctx)).transpose()?,
                bind,
                x: self.copy_expr(x, ctx)?,
                clauses: self.copy_clauses(&clauses, ctx)?,
            },
            Stmt::Select(clauses) => {
                let mut copied = Vec::with_capacity(clauses.len());
                for clause in &clauses {
                    copied.push(CommClause {
                        comm: clause.comm.map(|s| self.copy_stmt(s, ctx)).transpose()?,
                        body: self.copy_stmts(&clause.body, ctx)?,
                    });
                }
                Stmt::Select(copied)
            }
            Stmt::Labeled { label, stmt } => Stmt::Labeled {
                label,
                stmt: self.copy_stmt(stmt, ctx)?,
            },
            Stmt::Go(x) => Stmt::Go(self.copy_expr(x, ctx)?),
            Stmt::Defer(x) => Stmt::Defer(self.copy_expr(x, ctx)?),
            s @ (Stmt::Break(_) | Stmt::Continue(_) | Stmt::Goto(_) | Stmt::Fallthrough) => s,
            Stmt::Bad => return Err(LowerError::unsupported("malformed statement", span)),
        };
        Ok(self.file.add_stmt(copied, span))
    }

    fn copy_stmts(
        &mut self,
        stmts: &[StmtId],
        ctx: &CopyCtx,
    ) -> LowerResult<Vec<StmtId>> {
        stmts.iter().map(|s| self.copy_stmt(*s, ctx)).collect()
    }

    fn copy_clauses(
        &mut self,
        clauses: &[CaseClause],
        ctx: &CopyCtx,
    ) -> LowerResult<Vec<CaseClause>> {
        let mut copied = Vec::with_capacity(clauses.len());
        for clause in clauses {
            copied.push(CaseClause {
                list: self.copy_list(&clause.list, ctx)?,
                body: self.copy_stmts(&clause.body, ctx)?,
            });
        }
        Ok(copied)
    }

    fn copy_local_decl(
        &mut self,
        decl: DeclId,
        ctx: &CopyCtx,
    ) -> LowerResult<DeclId> {
        let d = self.file.decl(decl).clone();
        let span = self.file.decl_span(decl);
        let kind = match d.kind {
            DeclKind::Var { typ, value } => DeclKind::Var {
                typ: self.copy_opt(typ, ctx)?,
                value: self.copy_opt(value, ctx)?,
            },
            DeclKind::Const { typ, value } => DeclKind::Const {
                typ: self.copy_opt(typ, ctx)?,
                value: self.copy_opt(value, ctx)?,
            },
            DeclKind::Type {
                tparams,
                alias,
                typ,
            } if tparams.is_empty() => return self.copy_local_type(decl, alias, typ, ctx),
            _ => {
                return Err(LowerError::unsupported(
                    format!("local declaration of '{}'", d.name),
                    span,
                ))
            }
        };
        Ok(self.file.add_decl(Decl { name: d.name, kind }, span))
    }

    /// 复制局部类型声明
    ///
    /// 局部的定义类型在每个实例里都是新的名义类型。先登记旧类型到新类型的
    /// 代入结果，再复制类型体，体内对自身的引用就落到新类型上。
    fn copy_local_type(
        &mut self,
        decl: DeclId,
        alias: bool,
        typ: ExprId,
        ctx: &CopyCtx,
    ) -> LowerResult<DeclId> {
        let name = self.file.decl(decl).name.clone();
        let span = self.file.decl_span(decl);
        let new_decl = self.file.add_decl(
            Decl {
                name: name.clone(),
                kind: DeclKind::Type {
                    tparams: Vec::new(),
                    alias,
                    typ,
                },
            },
            span,
        );

        let old = self.decl_type(decl);
        let named = match old {
            Some(old) if !alias && self.store.named(old).is_some() => {
                let fresh = self.store.alloc(TypeData::Named(NamedType {
                    obj: NamedObj::Decl(new_decl),
                    origin: None,
                    name,
                    orig: None,
                    underlying: None,
                    tparams: Vec::new(),
                    targs: Vec::new(),
                    methods: Vec::new(),
                    mark: Completion::Valid,
                }));
                self.mono.local_types.entry(old).or_default().push(SubstRecord {
                    params: ctx.params.clone(),
                    args: TypeArgs::from_slice(&ctx.args),
                    result: fresh,
                });
                Some((old, fresh))
            }
            _ => None,
        };

        let new_typ = self.copy_expr(typ, ctx)?;
        if let DeclKind::Type { typ, .. } = &mut self.file.decl_mut(new_decl).kind {
            *typ = new_typ;
        }

        let resolved = match (named, old) {
            (Some((old, fresh)), _) => {
                let under = self.store.named(old).and_then(|n| n.underlying);
                let under = match under {
                    Some(u) => Some(self.substitute(&ctx.params, &ctx.args, u)?),
                    None => None,
                };
                if let Some(n) = self.store.named_mut(fresh) {
                    n.orig = self.info.type_of(new_typ);
                    n.underlying = under;
                }
                Some(fresh)
            }
            (None, Some(old)) => Some(self.substitute(&ctx.params, &ctx.args, old)?),
            (None, None) => None,
        };
        if let Some(t) = resolved {
            self.resolver.decl_types.insert(new_decl, t);
        }
        self.resolver.mark_local_decl(new_decl);
        self.resolver.set_color(new_decl, Color::Black);
        Ok(new_decl)
    }

    // ------------------------------------------------------------------ types

    /// 为类型合成类型表达式
    ///
    /// 带实参的本地泛型类型会先实例化，表达式引用生成的声明。
    /// 每个合成的节点都记下类型。
    pub(crate) fn type_to_expr(
        &mut self,
        t: TypeId,
        span: Span,
    ) -> LowerResult<ExprId> {
        let (expr, typ) = match self.store.get(t).clone() {
            TypeData::Basic(BasicKind::Invalid) => {
                return Err(LowerError::unsupported("invalid type as type argument", span))
            }
            TypeData::Basic(BasicKind::UnsafePointer) => {
                let pkg = self.synth(Expr::Ident(UNSAFE_PATH.to_string()), span);
                self.require_import(UNSAFE_PATH);
                (
                    Expr::Selector {
                        x: pkg,
                        sel: "Pointer".to_string(),
                    },
                    t,
                )
            }
            TypeData::Basic(kind) => (Expr::Ident(kind.name().to_string()), t),
            TypeData::Named(named) => match &named.obj {
                NamedObj::Universe => (Expr::Ident(named.name.clone()), t),
                NamedObj::External { path } => {
                    let local = self.require_import(path);
                    let pkg = self.synth(Expr::Ident(local), span);
                    (
                        Expr::Selector {
                            x: pkg,
                            sel: named.name.clone(),
                        },
                        t,
                    )
                }
                NamedObj::Decl(decl) if self.resolver.is_local_decl(*decl) => {
                    return Err(LowerError::unsupported(
                        format!("local type '{}' as type argument", named.name),
                        span,
                    ));
                }
                NamedObj::Decl(decl) if !named.targs.is_empty() && named.origin.is_none() => {
                    let (name, inst) = self.instantiate_type(*decl, &named.targs, span)?;
                    (Expr::Ident(name), inst)
                }
                NamedObj::Decl(decl) => (Expr::Ident(self.file.decl(*decl).name.clone()), t),
            },
            TypeData::Pointer(elem) => (Expr::Star(self.type_to_expr(elem, span)?), t),
            TypeData::Slice(elem) => (
                Expr::ArrayType {
                    len: None,
                    elem: self.type_to_expr(elem, span)?,
                },
                t,
            ),
            TypeData::Array { len, elem } => {
                let n = self.synth(
                    Expr::BasicLit {
                        kind: LitKind::Int,
                        value: len.to_string(),
                    },
                    span,
                );
                let int = self.store.basic(BasicKind::Int);
                self.info.record_type(n, int);
                self.info.record_value(n, len);
                (
                    Expr::ArrayType {
                        len: Some(n),
                        elem: self.type_to_expr(elem, span)?,
                    },
                    t,
                )
            }
            TypeData::Map { key, value } => (
                Expr::MapType {
                    key: self.type_to_expr(key, span)?,
                    value: self.type_to_expr(value, span)?,
                },
                t,
            ),
            TypeData::Chan { dir, elem } => (
                Expr::ChanType {
                    dir,
                    elem: self.type_to_expr(elem, span)?,
                },
                t,
            ),
            TypeData::Struct { fields, tags } => {
                let mut out = Vec::with_capacity(fields.len());
                for (i, var) in fields.iter().enumerate() {
                    out.push(Field {
                        name: (!var.embedded).then(|| var.name.clone()),
                        typ: self.type_to_expr(var.typ, span)?,
                        tag: tags
                            .as_ref()
                            .and_then(|t| t.get(i))
                            .filter(|tag| !tag.is_empty())
                            .cloned(),
                        span,
                    });
                }
                (Expr::StructType { fields: out }, t)
            }
            TypeData::Signature(sig) => (Expr::FuncType(self.sig_to_ast(&sig, span)?), t),
            TypeData::Interface(iface) => {
                let mut methods = Vec::with_capacity(iface.methods.len());
                for m in iface.methods {
                    let func = self.store.func(m).clone();
                    let TypeData::Signature(sig) = self.store.get(func.typ).clone() else {
                        return Err(LowerError::unsupported(
                            format!("interface method '{}' without a signature", func.name),
                            span,
                        ));
                    };
                    methods.push(InterfaceMethod {
                        name: func.name,
                        sig: self.sig_to_ast(&sig, span)?,
                        span,
                    });
                }
                let mut embeds = Vec::with_capacity(iface.embeddeds.len());
                for e in iface.embeddeds {
                    embeds.push(self.type_to_expr(e, span)?);
                }
                (Expr::InterfaceType { methods, embeds }, t)
            }
            TypeData::Tuple(_) => {
                return Err(LowerError::unsupported("tuple as type argument", span));
            }
            TypeData::TypeParam(tp) => {
                return Err(LowerError::unsupported(
                    format!("type parameter '{}' as type argument", tp.name),
                    span,
                ));
            }
        };
        let id = self.synth(expr, span);
        self.info.record_type(id, typ);
        Ok(id)
    }

    fn sig_to_ast(
        &mut self,
        sig: &Signature,
        span: Span,
    ) -> LowerResult<FuncSig> {
        let params = self.store.tuple_vars(sig.params).to_vec();
        let results = self.store.tuple_vars(sig.results).to_vec();
        let n = params.len();
        let mut out = FuncSig {
            params: Vec::with_capacity(n),
            results: Vec::with_capacity(results.len()),
            variadic: sig.variadic,
        };
        for (i, var) in params.iter().enumerate() {
            let mut typ = var.typ;
            // 变长参数在语法上写元素类型
            if sig.variadic && i + 1 == n {
                if let TypeData::Slice(elem) = self.store.get(typ) {
                    typ = *elem;
                }
            }
            out.params.push(Field {
                name: (!var.name.is_empty()).then(|| var.name.clone()),
                typ: self.type_to_expr(typ, span)?,
                tag: None,
                span,
            });
        }
        for var in &results {
            out.results.push(Field {
                name: (!var.name.is_empty()).then(|| var.name.clone()),
                typ: self.type_to_expr(var.typ, span)?,
                tag: None,
                span,
            });
        }
        Ok(out)
    }

    fn synth(
        &mut self,
        expr: Expr,
        span: Span,
    ) -> ExprId {
        self.file.add_expr(expr, span)
    }

    /// 返回引用 `path` 用的本地名；文件没有导入它时记为额外导入
    fn require_import(
        &mut self,
        path: &str,
    ) -> String {
        if let Some(spec) = self
            .file
            .imports
            .iter()
            .find(|s| s.path == path && !s.is_blank() && !s.is_dot())
        {
            return spec.local_name().to_string();
        }
        if !self.mono.extra_imports.iter().any(|p| p == path) {
            self.mono.extra_imports.push(path.to_string());
        }
        path.rsplit('/').next().unwrap_or(path).to_string()
    }
}
