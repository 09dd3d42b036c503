//! 类型单态化
//!
//! 泛型类型按类型实参生成一个新的类型声明，泛型类型上声明的每个方法
//! 也一起复制到新类型上。生成期间实例登记为“进行中”：类型体里对
//! 同一实例的引用（`Node[T]` 中的 `*Node[T]`）直接解析到正在生成的类型。

use tracing::{debug, trace};

use super::clone::CopyCtx;
use super::instance::{find_instance, InFlight, TypeArgs, TypeInstantiation};
use crate::frontend::ast::{Decl, DeclId, DeclKind, Expr, Field};
use crate::frontend::typecheck::decl::{receiver_base, Color};
use crate::frontend::typecheck::errors::{LowerError, LowerResult};
use crate::frontend::typecheck::identical::identical_list;
use crate::frontend::typecheck::types::{
    Completion, Func, NamedObj, NamedType, Signature, TypeData, TypeId, Var,
};
use crate::session::Session;
use crate::util::span::Span;

/// 类型单态化相关trait
pub trait TypeMonomorphizer {
    /// 取得 `generic[targs]` 的实例，返回生成的类型名和名义类型
    fn instantiate_type(
        &mut self,
        generic: DeclId,
        targs: &[TypeId],
        span: Span,
    ) -> LowerResult<(String, TypeId)>;

    /// 泛型类型已有的实例
    fn type_instances(
        &self,
        generic: DeclId,
    ) -> &[TypeInstantiation];
}

impl TypeMonomorphizer for Session<'_> {
    fn instantiate_type(
        &mut self,
        generic: DeclId,
        targs: &[TypeId],
        span: Span,
    ) -> LowerResult<(String, TypeId)> {
        let args = self.canonical_args(targs, span)?;
        if let Some(hit) = find_instance(&self.store, self.type_instances(generic), &args, |r| &r.types) {
            trace!("reuse type instance '{}'", hit.name);
            return Ok((hit.name.clone(), hit.typ));
        }
        let store = &self.store;
        if let Some(f) = self
            .mono
            .in_flight
            .iter()
            .find(|f| f.base == generic && identical_list(store, &f.types, &args))
        {
            trace!("self reference to '{}'", f.name);
            return Ok((f.name.clone(), f.typ));
        }

        let d = self.file.decl(generic).clone();
        let DeclKind::Type { typ: texpr, .. } = d.kind else {
            return Err(LowerError::unsupported(
                format!("instantiation of '{}'", d.name),
                span,
            ));
        };
        let generic_type = self.resolve(generic)?;
        let params = self
            .store
            .named(generic_type)
            .map(|n| n.tparams.clone())
            .unwrap_or_default();
        if params.len() != args.len() {
            return Err(LowerError::unsupported(
                format!(
                    "{} type arguments for '{}' with {} type parameters",
                    args.len(),
                    d.name,
                    params.len()
                ),
                span,
            ));
        }
        let scope = self
            .resolver
            .decl_tparams
            .get(&generic)
            .cloned()
            .unwrap_or_default();
        let ctx = CopyCtx::new(&scope, &args);

        let name = self.fresh_name(&d.name, &args);
        debug!("instantiate type '{}' as '{}'", d.name, name);
        // 类型表达式先借用泛型声明的，复制完再换掉
        let decl = self.file.add_decl(
            Decl {
                name: name.clone(),
                kind: DeclKind::Type {
                    tparams: Vec::new(),
                    alias: false,
                    typ: texpr,
                },
            },
            self.file.decl_span(generic),
        );
        let typ = self.store.alloc(TypeData::Named(NamedType {
            obj: NamedObj::Decl(decl),
            origin: Some(generic),
            name: name.clone(),
            orig: None,
            underlying: None,
            tparams: Vec::new(),
            targs: args.to_vec(),
            methods: Vec::new(),
            mark: Completion::Valid,
        }));
        self.resolver.decl_types.insert(decl, typ);
        self.resolver.set_color(decl, Color::Black);
        self.resolver.scope.insert(name.clone(), decl);

        self.mono.in_flight.push(InFlight {
            base: generic,
            types: args.clone(),
            typ,
            name: name.clone(),
        });
        let body = self.instance_body(generic_type, texpr, &ctx);
        self.mono.in_flight.pop();
        let (new_expr, orig, underlying) = body?;

        if let DeclKind::Type { typ: t, .. } = &mut self.file.decl_mut(decl).kind {
            *t = new_expr;
        }
        if let Some(n) = self.store.named_mut(typ) {
            n.orig = Some(orig);
            n.underlying = Some(underlying);
        }
        self.mono
            .type_insts
            .entry(generic)
            .or_default()
            .push(TypeInstantiation {
                types: args.clone(),
                decl,
                name: name.clone(),
                typ,
            });
        self.mono.queue.push_back(decl);

        self.instantiate_methods(&d.name, typ, &ctx, &args)?;
        Ok((name, typ))
    }

    fn type_instances(
        &self,
        generic: DeclId,
    ) -> &[TypeInstantiation] {
        self.mono
            .type_insts
            .get(&generic)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl Session<'_> {
    /// 复制类型表达式，代入右侧类型和底层类型
    fn instance_body(
        &mut self,
        generic_type: TypeId,
        texpr: crate::frontend::ast::ExprId,
        ctx: &CopyCtx,
    ) -> LowerResult<(crate::frontend::ast::ExprId, TypeId, TypeId)> {
        let new_expr = self.copy_expr(texpr, ctx)?;
        let base_orig = self
            .store
            .named(generic_type)
            .and_then(|n| n.orig)
            .unwrap_or_else(|| self.store.invalid());
        let orig = self.substitute(&ctx.params, &ctx.args, base_orig)?;
        let base_under = self.under(generic_type)?;
        let underlying = self.substitute(&ctx.params, &ctx.args, base_under)?;
        Ok((new_expr, orig, underlying))
    }

    /// 把泛型类型的方法复制到实例上，按声明顺序
    fn instantiate_methods(
        &mut self,
        base_name: &str,
        inst: TypeId,
        ctx: &CopyCtx,
        args: &TypeArgs,
    ) -> LowerResult<()> {
        let Some(inst_name) = self.store.named(inst).map(|n| n.name.clone()) else {
            return Ok(());
        };
        let mut methods = self
            .resolver
            .methods
            .get(base_name)
            .cloned()
            .unwrap_or_default();
        methods.sort();
        for method in methods {
            let Some(generic_sig) = self.decl_type(method) else {
                continue;
            };
            let d = self.file.decl(method).clone();
            let DeclKind::Func {
                recv: Some(recv),
                sig,
                body,
                ..
            } = d.kind
            else {
                continue;
            };
            let Some(base) = receiver_base(&self.file, recv.typ) else {
                continue;
            };
            let span = self.file.decl_span(method);

            // 接收者里写的类型参数名按位置对应到实参
            let mut mctx = ctx.clone();
            mctx.names = base
                .params
                .iter()
                .zip(args.iter())
                .filter(|((name, _), _)| name != "_")
                .map(|((name, _), arg)| (name.clone(), *arg))
                .collect();

            let ident = self.file.add_expr(Expr::Ident(inst_name.clone()), recv.span);
            self.info.record_type(ident, inst);
            let (recv_expr, recv_type) = if base.pointer {
                let ptr = self.store.pointer(inst);
                let star = self.file.add_expr(Expr::Star(ident), recv.span);
                self.info.record_type(star, ptr);
                (star, ptr)
            } else {
                (ident, inst)
            };

            let new_sig = self.copy_sig(&sig, &mctx)?;
            let new_body = body.map(|b| self.copy_stmt(b, &mctx)).transpose()?;
            let decl = self.file.add_decl(
                Decl {
                    name: d.name.clone(),
                    kind: DeclKind::Func {
                        recv: Some(Field {
                            typ: recv_expr,
                            ..recv.clone()
                        }),
                        tparams: Vec::new(),
                        sig: new_sig,
                        body: new_body,
                    },
                },
                span,
            );

            let typ = self.substitute(&ctx.params, &ctx.args, generic_sig)?;
            let typ = match self.store.get(typ).clone() {
                TypeData::Signature(s) => self.store.alloc(TypeData::Signature(Signature {
                    recv: Some(Var::new(recv.name.clone().unwrap_or_default(), recv_type)),
                    tparams: Vec::new(),
                    ..s
                })),
                _ => typ,
            };
            let func = self.store.alloc_func(Func {
                name: d.name.clone(),
                typ,
                decl: Some(decl),
            });
            if let Some(n) = self.store.named_mut(inst) {
                n.methods.push(func);
            }
            trace!("method '{}' of '{}'", d.name, inst_name);
            self.resolver.decl_types.insert(decl, typ);
            self.resolver.set_color(decl, Color::Black);
            self.mono.queue.push_back(decl);
        }
        Ok(())
    }
}
