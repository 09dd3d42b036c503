//! 函数单态化
//!
//! 泛型函数按类型实参复制出普通函数。同一个函数的实例化记录按请求顺序
//! 保存，语义相同的实参列表共用一个声明。

use tracing::{debug, trace};

use super::clone::CopyCtx;
use super::instance::{find_instance, mangle_name, Instantiation, TypeArgs};
use super::type_mono::TypeMonomorphizer;
use crate::frontend::ast::{Decl, DeclId, DeclKind};
use crate::frontend::typecheck::decl::Color;
use crate::frontend::typecheck::errors::{LowerError, LowerResult};
use crate::frontend::typecheck::types::{NamedObj, Signature, TypeData, TypeId};
use crate::session::Session;
use crate::util::span::Span;

/// 函数单态化相关trait
pub trait FunctionMonomorphizer {
    /// 取得 `generic[targs]` 的实例，返回生成的函数名和签名
    fn instantiate_func(
        &mut self,
        generic: DeclId,
        targs: &[TypeId],
        span: Span,
    ) -> LowerResult<(String, TypeId)>;

    /// 泛型函数已有的实例
    fn func_instances(
        &self,
        generic: DeclId,
    ) -> &[Instantiation];
}

impl FunctionMonomorphizer for Session<'_> {
    fn instantiate_func(
        &mut self,
        generic: DeclId,
        targs: &[TypeId],
        span: Span,
    ) -> LowerResult<(String, TypeId)> {
        let args = self.canonical_args(targs, span)?;
        if let Some(hit) = find_instance(&self.store, self.func_instances(generic), &args, |r| &r.types) {
            trace!("reuse instance '{}'", hit.name);
            let name = hit.name.clone();
            let decl = hit.decl;
            return Ok((name, self.decl_type(decl).unwrap_or_else(|| self.store.invalid())));
        }

        let d = self.file.decl(generic).clone();
        let DeclKind::Func {
            recv: None,
            sig,
            body,
            ..
        } = d.kind
        else {
            return Err(LowerError::unsupported(
                format!("instantiation of '{}'", d.name),
                span,
            ));
        };
        let scope = self
            .resolver
            .decl_tparams
            .get(&generic)
            .cloned()
            .unwrap_or_default();
        if scope.len() != args.len() {
            return Err(LowerError::unsupported(
                format!(
                    "{} type arguments for '{}' with {} type parameters",
                    args.len(),
                    d.name,
                    scope.len()
                ),
                span,
            ));
        }
        let generic_sig = self.resolve(generic)?;

        let name = self.fresh_name(&d.name, &args);
        debug!("instantiate func '{}' as '{}'", d.name, name);
        let ctx = CopyCtx::new(&scope, &args);
        let sig = self.copy_sig(&sig, &ctx)?;
        let body = body.map(|b| self.copy_stmt(b, &ctx)).transpose()?;
        let decl = self.file.add_decl(
            Decl {
                name: name.clone(),
                kind: DeclKind::Func {
                    recv: None,
                    tparams: Vec::new(),
                    sig,
                    body,
                },
            },
            self.file.decl_span(generic),
        );

        let typ = self.substitute(&ctx.params, &ctx.args, generic_sig)?;
        let typ = match self.store.get(typ).clone() {
            TypeData::Signature(s) => self.store.alloc(TypeData::Signature(Signature {
                tparams: Vec::new(),
                ..s
            })),
            _ => typ,
        };
        self.resolver.decl_types.insert(decl, typ);
        self.resolver.set_color(decl, Color::Black);
        self.resolver.scope.insert(name.clone(), decl);
        self.mono
            .func_insts
            .entry(generic)
            .or_default()
            .push(Instantiation {
                types: args,
                decl,
                name: name.clone(),
            });
        self.mono.queue.push_back(decl);
        Ok((name, typ))
    }

    fn func_instances(
        &self,
        generic: DeclId,
    ) -> &[Instantiation] {
        self.mono
            .func_insts
            .get(&generic)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl Session<'_> {
    /// 规范化类型实参：本地泛型类型的重新打标签实例换成生成的名义类型
    pub(crate) fn canonical_args(
        &mut self,
        targs: &[TypeId],
        span: Span,
    ) -> LowerResult<TypeArgs> {
        let mut args = TypeArgs::with_capacity(targs.len());
        for &t in targs {
            let retag = self.store.named(t).and_then(|n| {
                let NamedObj::Decl(base) = &n.obj else {
                    return None;
                };
                (!n.targs.is_empty() && n.origin.is_none()).then(|| (*base, n.targs.clone()))
            });
            match retag {
                Some((base, inner)) => {
                    let (_, inst) = self.instantiate_type(base, &inner, span)?;
                    args.push(inst);
                }
                None => args.push(t),
            }
        }
        Ok(args)
    }

    /// 会话内唯一的生成名
    pub(crate) fn fresh_name(
        &mut self,
        base: &str,
        args: &[TypeId],
    ) -> String {
        let sep = self.config.name_separator.clone();
        let name = mangle_name(&self.store, base, args, &sep);
        let mut candidate = name.clone();
        let mut n = 2;
        while self.mono.used_names.contains(&candidate) || self.resolver.scope.contains_key(&candidate) {
            candidate = format!("{}{}{}", name, sep, n);
            n += 1;
        }
        self.mono.used_names.insert(candidate.clone());
        candidate
    }
}
