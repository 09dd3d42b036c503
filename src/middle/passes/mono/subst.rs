//! 类型代入
//!
//! 把类型形状中的类型参数替换成类型实参。没有任何变化时返回原来的
//! `TypeId`，不分配新形状。名义类型不展开：带类型实参的名义类型只替换
//! 实参，得到重新打标签的实例；若请求与正在生成的实例或已有的实例化
//! 记录相同，则直接返回那个名义类型。

use tracing::trace;

use super::instance::{SubstRecord, TypeArgs};
use crate::frontend::typecheck::errors::{LowerError, LowerResult};
use crate::frontend::typecheck::identical::identical_list;
use crate::frontend::typecheck::types::{
    Func, Interface, NamedType, Signature, TypeData, TypeId, Var,
};
use crate::session::Session;
use crate::util::span::Span;

impl Session<'_> {
    /// 在 `t` 中把 `params[i]` 替换为 `args[i]`
    pub fn substitute(
        &mut self,
        params: &[TypeId],
        args: &[TypeId],
        t: TypeId,
    ) -> LowerResult<TypeId> {
        if params.is_empty() {
            return Ok(t);
        }
        if let Some(records) = self.mono.local_types.get(&t) {
            let store = &self.store;
            if let Some(hit) = records
                .iter()
                .find(|r| r.params == params && identical_list(store, &r.args, args))
            {
                return Ok(hit.result);
            }
        }
        // 有实例正在生成时，结果可能指向它，不走缓存
        let memo = self.mono.in_flight.is_empty();
        if memo {
            if let Some(records) = self.mono.subst_memo.get(&t) {
                let store = &self.store;
                if let Some(hit) = records
                    .iter()
                    .find(|r| r.params == params && identical_list(store, &r.args, args))
                {
                    return Ok(hit.result);
                }
            }
        }
        let result = self.subst_inner(params, args, t)?;
        if memo {
            self.mono.subst_memo.entry(t).or_default().push(SubstRecord {
                params: params.to_vec(),
                args: TypeArgs::from_slice(args),
                result,
            });
        }
        Ok(result)
    }

    fn subst_inner(
        &mut self,
        params: &[TypeId],
        args: &[TypeId],
        t: TypeId,
    ) -> LowerResult<TypeId> {
        let typ = match self.store.get(t).clone() {
            TypeData::Basic(_) => return Ok(t),
            TypeData::TypeParam(_) => {
                return Ok(params
                    .iter()
                    .position(|p| *p == t)
                    .and_then(|i| args.get(i).copied())
                    .unwrap_or(t));
            }
            TypeData::Array { len, elem } => {
                let e = self.substitute(params, args, elem)?;
                if e == elem {
                    return Ok(t);
                }
                TypeData::Array { len, elem: e }
            }
            TypeData::Slice(elem) => {
                let e = self.substitute(params, args, elem)?;
                if e == elem {
                    return Ok(t);
                }
                TypeData::Slice(e)
            }
            TypeData::Pointer(elem) => {
                let e = self.substitute(params, args, elem)?;
                if e == elem {
                    return Ok(t);
                }
                TypeData::Pointer(e)
            }
            TypeData::Map { key, value } => {
                let k = self.substitute(params, args, key)?;
                let v = self.substitute(params, args, value)?;
                if k == key && v == value {
                    return Ok(t);
                }
                TypeData::Map { key: k, value: v }
            }
            TypeData::Chan { dir, elem } => {
                let e = self.substitute(params, args, elem)?;
                if e == elem {
                    return Ok(t);
                }
                TypeData::Chan { dir, elem: e }
            }
            TypeData::Struct { fields, tags } => {
                let Some(fields) = self.subst_vars(params, args, &fields)? else {
                    return Ok(t);
                };
                return Ok(self.store.structure(fields, tags.unwrap_or_default()));
            }
            TypeData::Tuple(vars) => {
                let Some(vars) = self.subst_vars(params, args, &vars)? else {
                    return Ok(t);
                };
                TypeData::Tuple(vars)
            }
            TypeData::Signature(sig) => {
                let p = self.substitute(params, args, sig.params)?;
                let r = self.substitute(params, args, sig.results)?;
                if p == sig.params && r == sig.results {
                    return Ok(t);
                }
                TypeData::Signature(Signature {
                    params: p,
                    results: r,
                    ..sig
                })
            }
            TypeData::Interface(iface) => match self.subst_interface(params, args, &iface)? {
                Some(iface) => TypeData::Interface(iface),
                None => return Ok(t),
            },
            TypeData::Named(named) => {
                if named.targs.is_empty() {
                    return Ok(t);
                }
                let mut targs = Vec::with_capacity(named.targs.len());
                let mut changed = false;
                for &a in &named.targs {
                    let s = self.substitute(params, args, a)?;
                    changed |= s != a;
                    targs.push(s);
                }
                if !changed {
                    return Ok(t);
                }
                return Ok(self.retag(&named, targs));
            }
        };
        Ok(self.store.alloc(typ))
    }

    /// 逐项代入；没有变化时返回 `None`
    fn subst_vars(
        &mut self,
        params: &[TypeId],
        args: &[TypeId],
        vars: &[Var],
    ) -> LowerResult<Option<Vec<Var>>> {
        let mut out = Vec::with_capacity(vars.len());
        let mut changed = false;
        for var in vars {
            let typ = self.substitute(params, args, var.typ)?;
            changed |= typ != var.typ;
            out.push(Var { typ, ..var.clone() });
        }
        Ok(changed.then_some(out))
    }

    fn subst_interface(
        &mut self,
        params: &[TypeId],
        args: &[TypeId],
        iface: &Interface,
    ) -> LowerResult<Option<Interface>> {
        let mut changed = false;
        let mut methods = Vec::with_capacity(iface.methods.len());
        for &m in &iface.methods {
            let func = self.store.func(m).clone();
            if !matches!(self.store.get(func.typ), TypeData::Signature(_)) {
                return Err(LowerError::unsupported(
                    format!("interface method '{}' without a signature", func.name),
                    Span::dummy(),
                ));
            }
            let typ = self.substitute(params, args, func.typ)?;
            if typ == func.typ {
                methods.push(m);
            } else {
                changed = true;
                methods.push(self.store.alloc_func(Func { typ, ..func }));
            }
        }
        let mut embeddeds = Vec::with_capacity(iface.embeddeds.len());
        for &e in &iface.embeddeds {
            let s = self.substitute(params, args, e)?;
            changed |= s != e;
            embeddeds.push(s);
        }
        Ok(changed.then_some(Interface { methods, embeddeds }))
    }

    /// 带新实参的名义类型：正在生成的实例 > 已有记录 > 新的重新打标签实例
    fn retag(
        &mut self,
        named: &NamedType,
        targs: Vec<TypeId>,
    ) -> TypeId {
        if let Some(base) = named.base_decl() {
            let store = &self.store;
            if let Some(f) = self
                .mono
                .in_flight
                .iter()
                .find(|f| f.base == base && identical_list(store, &f.types, &targs))
            {
                trace!("substitution hit in-flight instance '{}'", f.name);
                return f.typ;
            }
            if let Some(rec) = self
                .mono
                .type_insts
                .get(&base)
                .and_then(|recs| recs.iter().find(|r| identical_list(store, &r.types, &targs)))
            {
                return rec.typ;
            }
        }
        self.store.alloc(TypeData::Named(NamedType {
            orig: None,
            underlying: None,
            tparams: Vec::new(),
            targs,
            mark: Default::default(),
            ..named.clone()
        }))
    }
}
