//! 类型表达式求值
//!
//! 每个求值过的类型表达式节点都会把结果记进 `TypeInfo`，
//! 单态化时据此查找显式类型实参的类型。

use tracing::trace;

use super::Session;
use crate::frontend::ast::{DeclKind, Expr, ExprId, FuncSig, LitKind};
use crate::frontend::typecheck::errors::{LowerError, LowerResult};
use crate::frontend::typecheck::types::{
    BasicKind, Completion, Func, Interface, NamedObj, NamedType, Signature, TypeData, TypeId, Var,
};
use crate::frontend::module::ExportKind;
use crate::util::diagnostic::codes::ErrorCodeDefinition;
use crate::util::span::Span;

impl Session<'_> {
    /// 求值类型表达式并记录结果
    pub(crate) fn eval_type(
        &mut self,
        expr: ExprId,
    ) -> LowerResult<TypeId> {
        let typ = self.eval_type_inner(expr)?;
        self.info.record_type(expr, typ);
        Ok(typ)
    }

    fn eval_type_inner(
        &mut self,
        expr: ExprId,
    ) -> LowerResult<TypeId> {
        let span = self.file.expr_span(expr);
        match self.file.expr(expr).clone() {
            Expr::Ident(name) => self.lookup_type_name(&name, span),
            Expr::Paren(x) => self.eval_type(x),
            Expr::Star(x) => {
                let elem = self.eval_type(x)?;
                Ok(self.store.pointer(elem))
            }
            Expr::ArrayType { len: None, elem } => {
                let elem = self.eval_type(elem)?;
                Ok(self.store.slice(elem))
            }
            Expr::ArrayType {
                len: Some(len),
                elem,
            } => {
                let len = self.array_len(len)?;
                let elem = self.eval_type(elem)?;
                Ok(self.store.alloc(TypeData::Array { len, elem }))
            }
            Expr::MapType { key, value } => {
                let key = self.eval_type(key)?;
                let value = self.eval_type(value)?;
                Ok(self.store.alloc(TypeData::Map { key, value }))
            }
            Expr::ChanType { dir, elem } => {
                let elem = self.eval_type(elem)?;
                Ok(self.store.alloc(TypeData::Chan { dir, elem }))
            }
            Expr::StructType { fields } => {
                let mut vars = Vec::with_capacity(fields.len());
                let mut tags = Vec::with_capacity(fields.len());
                for field in &fields {
                    let typ = self.eval_type(field.typ)?;
                    let var = match &field.name {
                        Some(name) => Var::new(name.clone(), typ),
                        None => Var {
                            name: self.embedded_name(field.typ),
                            typ,
                            embedded: true,
                        },
                    };
                    vars.push(var);
                    tags.push(field.tag.clone().unwrap_or_default());
                }
                Ok(self.store.structure(vars, tags))
            }
            Expr::FuncType(sig) => self.eval_signature(&sig, None, Vec::new()),
            Expr::InterfaceType { methods, embeds } => {
                let mut iface = Interface::default();
                for method in &methods {
                    let typ = self.eval_signature(&method.sig, None, Vec::new())?;
                    iface.methods.push(self.store.alloc_func(Func {
                        name: method.name.clone(),
                        typ,
                        decl: None,
                    }));
                }
                for embed in embeds {
                    iface.embeddeds.push(self.eval_type(embed)?);
                }
                Ok(self.store.alloc(TypeData::Interface(iface)))
            }
            Expr::Selector { x, sel } => {
                let pkg = match self.file.expr(self.file.unparen(x)) {
                    Expr::Ident(pkg) if !self.resolver.scope.contains_key(pkg) => pkg.clone(),
                    _ => return Ok(self.not_a_type(&sel, span)),
                };
                match self.import_path(&pkg) {
                    Some(path) => self.external_type(&path, &sel, span),
                    None => {
                        let diagnostic = ErrorCodeDefinition::undeclared_name(&pkg).at(span).build();
                        self.diags.push(diagnostic);
                        Ok(self.store.invalid())
                    }
                }
            }
            Expr::Index { x, indices } => self.eval_instance(x, &indices, span),
            Expr::Bad => Err(LowerError::unsupported("malformed type expression", span)),
            Expr::BasicLit { value, .. } => Ok(self.not_a_type(&value, span)),
            _ => Ok(self.not_a_type("expression", span)),
        }
    }

    /// 函数签名；变长参数的最后一个参数类型为切片
    pub(crate) fn eval_signature(
        &mut self,
        sig: &FuncSig,
        recv: Option<Var>,
        tparams: Vec<TypeId>,
    ) -> LowerResult<TypeId> {
        let n = sig.params.len();
        let mut params = Vec::with_capacity(n);
        for (i, p) in sig.params.iter().enumerate() {
            let mut typ = self.eval_type(p.typ)?;
            if sig.variadic && i + 1 == n {
                typ = self.store.slice(typ);
            }
            params.push(Var::new(p.name.clone().unwrap_or_default(), typ));
        }
        let mut results = Vec::with_capacity(sig.results.len());
        for r in &sig.results {
            let typ = self.eval_type(r.typ)?;
            results.push(Var::new(r.name.clone().unwrap_or_default(), typ));
        }
        let params = self.store.tuple(params);
        let results = self.store.tuple(results);
        Ok(self.store.alloc(TypeData::Signature(Signature {
            recv,
            params,
            results,
            variadic: sig.variadic,
            tparams,
        })))
    }

    /// 类型位置上的名字：局部类型、类型参数、包作用域、预声明类型
    fn lookup_type_name(
        &mut self,
        name: &str,
        span: Span,
    ) -> LowerResult<TypeId> {
        if name == "_" {
            if let Some(tp) = self.resolver.recv_blanks.pop_front() {
                return Ok(tp);
            }
        }
        if let Some(decl) = self.resolver.lookup_local_type(name) {
            return self.resolve(decl);
        }
        if let Some(tp) = self.resolver.lookup_tparam(name) {
            return Ok(tp);
        }
        if let Some(&decl) = self.resolver.scope.get(name) {
            return match &self.file.decl(decl).kind {
                DeclKind::Type { tparams, .. } if !tparams.is_empty() => {
                    let diagnostic = ErrorCodeDefinition::generic_without_instantiation(name)
                        .at(span)
                        .build();
                    self.diags.push(diagnostic);
                    Ok(self.store.invalid())
                }
                DeclKind::Type { .. } => self.resolve(decl),
                _ => Ok(self.not_a_type(name, span)),
            };
        }
        if let Some(t) = self.universe_type(name) {
            return Ok(t);
        }
        let diagnostic = ErrorCodeDefinition::undeclared_name(name).at(span).build();
        self.diags.push(diagnostic);
        Ok(self.store.invalid())
    }

    fn universe_type(
        &mut self,
        name: &str,
    ) -> Option<TypeId> {
        let kind = match name {
            "byte" => BasicKind::Uint8,
            "rune" => BasicKind::Int32,
            "error" => return Some(self.universe_error()),
            _ => *BasicKind::ALL
                .iter()
                .skip(1)
                .find(|k| k.name() == name)?,
        };
        Some(self.store.basic(kind))
    }

    /// 预声明的 `error` 接口
    fn universe_error(&mut self) -> TypeId {
        if let Some(t) = self.resolver.universe_error {
            return t;
        }
        let string = self.store.basic(BasicKind::String);
        let sig = self.store.signature(Vec::new(), vec![Var::new("", string)], false);
        let method = self.store.alloc_func(Func {
            name: "Error".to_string(),
            typ: sig,
            decl: None,
        });
        let iface = self.store.alloc(TypeData::Interface(Interface {
            methods: vec![method],
            embeddeds: Vec::new(),
        }));
        let t = self.store.alloc(TypeData::Named(NamedType {
            obj: NamedObj::Universe,
            origin: None,
            name: "error".to_string(),
            orig: Some(iface),
            underlying: Some(iface),
            tparams: Vec::new(),
            targs: Vec::new(),
            methods: Vec::new(),
            mark: Completion::Valid,
        }));
        self.resolver.universe_error = Some(t);
        t
    }

    /// 导入的本地名对应的路径
    pub(crate) fn import_path(
        &self,
        local: &str,
    ) -> Option<String> {
        self.file
            .imports
            .iter()
            .find(|spec| !spec.is_blank() && !spec.is_dot() && spec.local_name() == local)
            .map(|spec| spec.path.clone())
    }

    /// 其它模块导出的类型
    ///
    /// 外部类型的形状不可见，底层类型记为无效类型。
    fn external_type(
        &mut self,
        path: &str,
        name: &str,
        span: Span,
    ) -> LowerResult<TypeId> {
        let key = (path.to_string(), name.to_string());
        if let Some(&t) = self.resolver.externals.get(&key) {
            return Ok(t);
        }
        let export = self
            .importer
            .module(path)
            .ok()
            .and_then(|m| m.get_export(name))
            .cloned();
        let Some(export) = export else {
            let qualified = format!("{}.{}", path, name);
            let diagnostic = ErrorCodeDefinition::undeclared_name(&qualified).at(span).build();
            self.diags.push(diagnostic);
            return Ok(self.store.invalid());
        };
        if export.kind != ExportKind::Type {
            return Ok(self.not_a_type(name, span));
        }
        if export.generic {
            return Err(LowerError::unsupported(
                format!("generic type '{}' from another module", name),
                span,
            ));
        }
        let invalid = self.store.invalid();
        let t = self.store.alloc(TypeData::Named(NamedType {
            obj: NamedObj::External {
                path: path.to_string(),
            },
            origin: None,
            name: name.to_string(),
            orig: None,
            underlying: Some(invalid),
            tparams: Vec::new(),
            targs: Vec::new(),
            methods: Vec::new(),
            mark: Completion::Valid,
        }));
        trace!("external type {}.{}", path, name);
        self.resolver.externals.insert(key, t);
        Ok(t)
    }

    /// `List[int]`：重新打标签的实例，底层类型按需求出
    fn eval_instance(
        &mut self,
        x: ExprId,
        indices: &[ExprId],
        span: Span,
    ) -> LowerResult<TypeId> {
        let base = self.file.unparen(x);
        let name = match self.file.expr(base) {
            Expr::Ident(name) => name.clone(),
            Expr::Selector { sel, .. } => {
                return Err(LowerError::unsupported(
                    format!("instantiation of imported type '{}'", sel),
                    span,
                ))
            }
            _ => return Ok(self.not_a_type("expression", span)),
        };
        let decl = match self.resolver.scope.get(&name) {
            Some(&d) if matches!(self.file.decl(d).kind, DeclKind::Type { .. }) => d,
            Some(_) => return Ok(self.not_a_type(&name, span)),
            None => {
                let diagnostic = ErrorCodeDefinition::undeclared_name(&name).at(span).build();
                self.diags.push(diagnostic);
                return Ok(self.store.invalid());
            }
        };
        let generic = self.resolve(decl)?;
        let Some(named) = self.store.named(generic) else {
            return Ok(self.store.invalid());
        };
        let expected = named.tparams.len();
        let methods = named.methods.clone();
        if indices.len() != expected {
            let diagnostic = ErrorCodeDefinition::type_arg_count(&name, indices.len(), expected)
                .at(span)
                .build();
            self.diags.push(diagnostic);
            return Ok(self.store.invalid());
        }
        self.info.record_type(base, generic);
        let mut targs = Vec::with_capacity(indices.len());
        for &idx in indices {
            targs.push(self.eval_type(idx)?);
        }
        Ok(self.store.alloc(TypeData::Named(NamedType {
            obj: NamedObj::Decl(decl),
            origin: None,
            name,
            orig: None,
            underlying: None,
            tparams: Vec::new(),
            targs,
            methods,
            mark: Completion::Unmarked,
        })))
    }

    /// 数组长度：整数字面量或外部提供的常量值
    fn array_len(
        &mut self,
        len: ExprId,
    ) -> LowerResult<i64> {
        if let Expr::BasicLit {
            kind: LitKind::Int,
            value,
        } = self.file.expr(len)
        {
            if let Ok(n) = value.parse::<i64>() {
                return Ok(n);
            }
        }
        let mut locals = super::LocalScopes::new();
        self.walk_expr(len, &mut locals)?;
        self.info
            .value_of(len)
            .ok_or_else(|| LowerError::incomplete("array length", self.file.expr_span(len)))
    }

    /// 嵌入字段的名字
    fn embedded_name(
        &self,
        typ: ExprId,
    ) -> String {
        let mut e = self.file.unparen(typ);
        loop {
            match self.file.expr(e) {
                Expr::Star(x) | Expr::Paren(x) => e = *x,
                Expr::Index { x, .. } => e = *x,
                Expr::Selector { sel, .. } => return sel.clone(),
                Expr::Ident(name) => return name.clone(),
                _ => return String::new(),
            }
        }
    }

    fn not_a_type(
        &mut self,
        name: &str,
        span: Span,
    ) -> TypeId {
        let diagnostic = ErrorCodeDefinition::not_a_type(name).at(span).build();
        self.diags.push(diagnostic);
        self.store.invalid()
    }
}
