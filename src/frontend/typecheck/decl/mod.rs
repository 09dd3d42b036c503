//! 声明解析
//!
//! 包级声明按需解析，任何地方都可以调用 [`Session::resolve`]，结果幂等。
//! 每个声明有一个颜色（白、灰、黑），再加一条显式的解析栈：
//! 遇到灰色声明说明出现了循环，循环就是解析栈从该声明位置开始的后缀。
//!
//! 循环按参与者分类：
//! - 全部是值声明：无效，交给初始化顺序报告（见 [`initorder`]）
//! - 只有类型名且至少一个非别名定义：合法（如经由指针的递归类型）
//! - 其余情况：报告非法循环，参与者全部标为无效
//!
//! 类型体和函数体等不影响声明类型的检查放进延后队列，
//! 在全部顶层声明解析完之后统一执行。

mod body;
mod initorder;
mod tparams;
mod typexpr;
mod valid;

pub(crate) use body::{LocalScopes, Walk};

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::frontend::ast::{DeclId, DeclKind, Expr, ExprId, Field, File, FuncSig, TypeParamGroup};
use crate::frontend::typecheck::errors::{LowerError, LowerResult};
use crate::frontend::typecheck::types::{
    Completion, Func, FuncId, NamedObj, NamedType, TypeData, TypeId, Var,
};
use crate::session::Session;
use crate::util::diagnostic::codes::ErrorCodeDefinition;
use crate::util::diagnostic::Diagnostic;
use crate::util::span::Span;

/// 声明颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    /// 未开始
    #[default]
    White,
    /// 解析中，记录在解析栈中的位置
    Grey(usize),
    /// 已完成
    Black,
}

/// 解析后的合约
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractInfo {
    /// 合约自己的类型参数
    pub tparams: Vec<TypeId>,
    /// 每个参数的约束，可能引用 `tparams`
    pub bounds: Vec<TypeId>,
}

/// 延后的检查
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Later {
    /// 类型完整性检查
    ValidType(TypeId),
    /// 函数体
    FuncBody(DeclId),
}

/// 方法接收者的基类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReceiverBase {
    pub name: String,
    /// `List[T]` 中的 `T`
    pub params: Vec<(String, Span)>,
    pub pointer: bool,
}

/// 解析器状态
#[derive(Debug, Default)]
pub struct ResolverState {
    colors: HashMap<DeclId, Color>,
    /// 正在解析的声明
    obj_path: Vec<DeclId>,
    /// 已解析声明的类型（类型声明为其名义类型）
    pub(crate) decl_types: HashMap<DeclId, TypeId>,
    /// 包作用域（不含方法）
    pub(crate) scope: IndexMap<String, DeclId>,
    /// 接收者基类型名 -> 方法声明
    pub(crate) methods: HashMap<String, Vec<DeclId>>,
    /// 类型参数作用域栈，内层在后
    pub(crate) tparam_scopes: Vec<IndexMap<String, TypeId>>,
    /// 泛型声明的类型参数（方法为接收者绑定的名字）
    pub(crate) decl_tparams: HashMap<DeclId, IndexMap<String, TypeId>>,
    /// 接收者里 `_` 占位对应的类型参数，按出现顺序
    pub(crate) recv_blanks: VecDeque<TypeId>,
    /// 函数体内的局部类型作用域栈，内层在后
    local_types: Vec<HashMap<String, DeclId>>,
    /// 局部类型声明
    local_decls: HashSet<DeclId>,
    contracts: HashMap<DeclId, ContractInfo>,
    /// 处于非法循环中的声明
    invalid: HashSet<DeclId>,
    /// 已报告的循环（错误码 + 排序后的参与者）
    reported: HashSet<(&'static str, Vec<DeclId>)>,
    /// 只含值声明的循环，已旋转到最早的参与者
    init_cycles: Vec<Vec<DeclId>>,
    later: VecDeque<Later>,
    /// 外部类型 (path, name) -> 名义类型
    externals: HashMap<(String, String), TypeId>,
    universe_error: Option<TypeId>,
}

impl ResolverState {
    /// 收集包作用域和方法表
    pub fn new(file: &File) -> Self {
        let mut state = Self::default();
        for &decl in &file.decls {
            let d = file.decl(decl);
            if let Some(recv) = d.receiver() {
                if let Some(base) = receiver_base(file, recv.typ) {
                    state.methods.entry(base.name).or_default().push(decl);
                }
                continue;
            }
            if d.name != "_" {
                state.scope.entry(d.name.clone()).or_insert(decl);
            }
        }
        state
    }

    pub fn color(
        &self,
        decl: DeclId,
    ) -> Color {
        self.colors.get(&decl).copied().unwrap_or_default()
    }

    pub(crate) fn set_color(
        &mut self,
        decl: DeclId,
        color: Color,
    ) {
        self.colors.insert(decl, color);
    }

    /// 是否处于非法循环中
    pub fn is_invalid(
        &self,
        decl: DeclId,
    ) -> bool {
        self.invalid.contains(&decl)
    }

    pub fn contract(
        &self,
        decl: DeclId,
    ) -> Option<&ContractInfo> {
        self.contracts.get(&decl)
    }

    /// 在最内层局部作用域绑定类型名
    pub(crate) fn bind_local_type(
        &mut self,
        name: &str,
        decl: DeclId,
    ) {
        self.mark_local_decl(decl);
        if self.local_types.is_empty() {
            self.local_types.push(HashMap::new());
        }
        if let Some(scope) = self.local_types.last_mut() {
            scope.insert(name.to_string(), decl);
        }
    }

    /// 查找局部类型，内层作用域优先
    pub(crate) fn lookup_local_type(
        &self,
        name: &str,
    ) -> Option<DeclId> {
        self.local_types
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    pub(crate) fn push_local_types(&mut self) {
        self.local_types.push(HashMap::new());
    }

    pub(crate) fn pop_local_types(&mut self) {
        self.local_types.pop();
    }

    /// 换出整个局部类型栈；包级声明看不到函数体里的名字
    pub(crate) fn swap_local_types(
        &mut self,
        scopes: Vec<HashMap<String, DeclId>>,
    ) -> Vec<HashMap<String, DeclId>> {
        std::mem::replace(&mut self.local_types, scopes)
    }

    pub(crate) fn mark_local_decl(
        &mut self,
        decl: DeclId,
    ) {
        self.local_decls.insert(decl);
    }

    pub(crate) fn is_local_decl(
        &self,
        decl: DeclId,
    ) -> bool {
        self.local_decls.contains(&decl)
    }

    /// 查找类型参数，内层作用域优先
    pub(crate) fn lookup_tparam(
        &self,
        name: &str,
    ) -> Option<TypeId> {
        self.tparam_scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }
}

/// 解析方法接收者的基类型：`T`、`*T`、`List[T]`、`*List[T]`
pub(crate) fn receiver_base(
    file: &File,
    typ: ExprId,
) -> Option<ReceiverBase> {
    let mut pointer = false;
    let mut e = file.unparen(typ);
    if let Expr::Star(inner) = file.expr(e) {
        pointer = true;
        e = file.unparen(*inner);
    }
    let (base, indices) = match file.expr(e) {
        Expr::Index { x, indices } => (file.unparen(*x), indices.clone()),
        _ => (e, Vec::new()),
    };
    let Expr::Ident(name) = file.expr(base) else {
        return None;
    };
    let mut params = Vec::with_capacity(indices.len());
    for idx in indices {
        match file.expr(idx) {
            Expr::Ident(p) => params.push((p.clone(), file.expr_span(idx))),
            _ => return None,
        }
    }
    Some(ReceiverBase {
        name: name.clone(),
        params,
        pointer,
    })
}

impl Session<'_> {
    /// 解析声明，返回其类型
    ///
    /// 类型声明返回名义类型（别名返回目标类型）；函数返回签名；
    /// 合约没有类型，返回无效类型。
    pub fn resolve(
        &mut self,
        decl: DeclId,
    ) -> LowerResult<TypeId> {
        match self.resolver.color(decl) {
            Color::Black => return Ok(self.resolved_type(decl)),
            Color::Grey(start) => {
                let valid = self.classify_cycle(start);
                return Ok(if valid {
                    self.resolved_type(decl)
                } else {
                    self.store.invalid()
                });
            }
            Color::White => {}
        }

        trace!("resolving '{}'", self.file.decl(decl).name);
        let local = self.resolver.is_local_decl(decl);
        let outer = if local {
            None
        } else {
            Some(self.resolver.swap_local_types(Vec::new()))
        };
        let depth = self.resolver.obj_path.len();
        self.resolver.set_color(decl, Color::Grey(depth));
        self.resolver.obj_path.push(decl);

        let kind = self.file.decl(decl).kind.clone();
        let result = match kind {
            DeclKind::Const { typ, value } | DeclKind::Var { typ, value } => {
                self.resolve_value_decl(decl, typ, value)
            }
            DeclKind::Type {
                tparams,
                alias,
                typ,
            } => self.resolve_type_decl(decl, &tparams, alias, typ),
            DeclKind::Func {
                recv,
                tparams,
                sig,
                body,
            } => self.resolve_func_decl(decl, recv.as_ref(), &tparams, &sig, body.is_some()),
            DeclKind::Contract { tparams, bounds } => {
                self.resolve_contract_decl(decl, &tparams, &bounds)
            }
        };

        self.resolver.obj_path.truncate(depth);
        self.resolver.set_color(decl, Color::Black);
        if let Some(outer) = outer {
            self.resolver.swap_local_types(outer);
        }
        let mut typ = result?;

        if self.resolver.is_invalid(decl) {
            let is_value = self.file.decl(decl).is_value();
            if is_value {
                typ = self.store.invalid();
            } else {
                let invalid = self.store.invalid();
                if let Some(named) = self.store.named_mut(typ) {
                    named.underlying = Some(invalid);
                    named.mark = Completion::Invalid;
                }
            }
        }
        self.resolver.decl_types.insert(decl, typ);
        debug!("resolved '{}': {}", self.file.decl(decl).name, self.store.display(typ));

        // 局部类型没有方法
        if !local && self.file.decl(decl).is_type_definition() {
            self.collect_methods(decl)?;
        }
        Ok(typ)
    }

    /// 已记录的声明类型
    pub fn decl_type(
        &self,
        decl: DeclId,
    ) -> Option<TypeId> {
        self.resolver.decl_types.get(&decl).copied()
    }

    fn resolved_type(
        &self,
        decl: DeclId,
    ) -> TypeId {
        self.decl_type(decl).unwrap_or_else(|| self.store.invalid())
    }

    /// 泛型实体：带类型参数的函数或类型，或接收者基类型是泛型的方法
    pub(crate) fn is_generic_decl(
        &self,
        decl: DeclId,
    ) -> bool {
        let d = self.file.decl(decl);
        if !d.tparam_groups().is_empty() {
            return true;
        }
        let Some(recv) = d.receiver() else {
            return false;
        };
        receiver_base(&self.file, recv.typ)
            .and_then(|base| self.resolver.scope.get(&base.name).copied())
            .is_some_and(|base| !self.file.decl(base).tparam_groups().is_empty())
    }

    /// 执行延后的检查，直到队列为空
    pub(crate) fn drain_later(&mut self) -> LowerResult<()> {
        while let Some(action) = self.resolver.later.pop_front() {
            match action {
                Later::ValidType(named) => {
                    let mut path = Vec::new();
                    self.valid_type(named, &mut path)?;
                }
                Later::FuncBody(decl) => self.check_func_body(decl)?,
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------ cycles

    /// 对解析栈 `start..` 的循环分类，返回循环是否合法
    fn classify_cycle(
        &mut self,
        start: usize,
    ) -> bool {
        let cycle: Vec<DeclId> = self.resolver.obj_path[start..].to_vec();
        let mut nval = 0;
        let mut ndef = 0;
        for &d in &cycle {
            let decl = self.file.decl(d);
            if decl.is_value() {
                nval += 1;
            } else if decl.is_type_definition() {
                ndef += 1;
            }
        }
        debug!("cycle of {} decls ({} values, {} type definitions)", cycle.len(), nval, ndef);

        if nval == 0 && ndef > 0 {
            return true;
        }
        self.resolver.invalid.extend(cycle.iter().copied());
        if nval == cycle.len() {
            let rotated = self.rotate_to_earliest(&cycle);
            let mut key = rotated.clone();
            key.sort();
            if self.resolver.reported.insert(("E2103", key)) {
                self.resolver.init_cycles.push(rotated);
            }
            return false;
        }
        self.report_cycle("E2101", &cycle);
        false
    }

    /// 以源码位置最早的参与者为起点旋转循环
    pub(crate) fn rotate_to_earliest(
        &self,
        cycle: &[DeclId],
    ) -> Vec<DeclId> {
        let mut first = 0;
        for (i, &d) in cycle.iter().enumerate() {
            if self
                .file
                .decl_span(d)
                .precedes(&self.file.decl_span(cycle[first]))
            {
                first = i;
            }
        }
        let mut rotated = cycle[first..].to_vec();
        rotated.extend_from_slice(&cycle[..first]);
        rotated
    }

    /// 报告一个循环：锚定在最早的参与者，每条引用边一条附注
    pub(crate) fn report_cycle(
        &mut self,
        code: &'static str,
        cycle: &[DeclId],
    ) {
        let mut key = cycle.to_vec();
        key.sort();
        key.dedup();
        if !self.resolver.reported.insert((code, key)) {
            return;
        }
        let cycle = self.rotate_to_earliest(cycle);
        let anchor = cycle[0];
        let name = self.file.decl(anchor).name.clone();
        let notes = self.cycle_notes(&cycle);
        let builder = match code {
            "E2102" => ErrorCodeDefinition::invalid_recursive_type(&name),
            _ => ErrorCodeDefinition::illegal_cycle(&name),
        };
        let diagnostic = builder
            .at(self.file.decl_span(anchor))
            .with_related(notes)
            .build();
        self.diags.push(diagnostic);
    }

    fn cycle_notes(
        &self,
        cycle: &[DeclId],
    ) -> Vec<Diagnostic> {
        (0..cycle.len())
            .map(|i| {
                let from = cycle[i];
                let to = cycle[(i + 1) % cycle.len()];
                ErrorCodeDefinition::cycle_edge(
                    &self.file.decl(from).name,
                    &self.file.decl(to).name,
                )
                .at(self.file.decl_span(from))
                .build()
            })
            .collect()
    }

    // ------------------------------------------------------------------ decls

    fn resolve_value_decl(
        &mut self,
        decl: DeclId,
        typ: Option<ExprId>,
        value: Option<ExprId>,
    ) -> LowerResult<TypeId> {
        let declared = match typ {
            Some(t) => Some(self.eval_type(t)?),
            None => None,
        };
        if let Some(v) = value {
            let mut locals = LocalScopes::new();
            self.walk_expr(v, &mut locals)?;
        }
        if self.resolver.is_invalid(decl) {
            return Ok(self.store.invalid());
        }
        if let Some(t) = declared {
            return Ok(t);
        }
        value
            .and_then(|v| self.info.type_of(v))
            .ok_or_else(|| {
                LowerError::incomplete(
                    format!("type of '{}'", self.file.decl(decl).name),
                    self.file.decl_span(decl),
                )
            })
    }

    fn resolve_type_decl(
        &mut self,
        decl: DeclId,
        groups: &[TypeParamGroup],
        alias: bool,
        typ: ExprId,
    ) -> LowerResult<TypeId> {
        let name = self.file.decl(decl).name.clone();
        if alias {
            if !groups.is_empty() {
                let diagnostic = ErrorCodeDefinition::generic_alias(&name)
                    .at(self.file.decl_span(decl))
                    .build();
                self.diags.push(diagnostic);
            }
            return self.eval_type(typ);
        }

        let named = self.store.alloc(TypeData::Named(NamedType {
            obj: NamedObj::Decl(decl),
            origin: None,
            name,
            orig: None,
            underlying: None,
            tparams: Vec::new(),
            targs: Vec::new(),
            methods: Vec::new(),
            mark: Completion::Unmarked,
        }));
        self.resolver.decl_types.insert(decl, named);

        let generic = !groups.is_empty();
        if generic {
            let scope = self.collect_type_params(decl, groups)?;
            if let Some(n) = self.store.named_mut(named) {
                n.tparams = scope.values().copied().collect();
            }
            self.resolver.decl_tparams.insert(decl, scope.clone());
            self.resolver.tparam_scopes.push(scope);
        }
        let rhs = self.eval_type(typ);
        if generic {
            self.resolver.tparam_scopes.pop();
        }
        let rhs = rhs?;

        if let Some(n) = self.store.named_mut(named) {
            n.orig = Some(rhs);
        }
        self.set_underlying(decl, named)?;
        self.resolver.later.push_back(Later::ValidType(named));
        Ok(named)
    }

    /// 沿前向链确定底层类型；链上的循环报告为无限展开
    fn set_underlying(
        &mut self,
        decl: DeclId,
        named: TypeId,
    ) -> LowerResult<()> {
        let mut seen = vec![named];
        let mut cur = match self.store.named(named).and_then(|n| n.orig) {
            Some(orig) => orig,
            None => return Ok(()),
        };
        let under = loop {
            let Some(n) = self.store.named(cur) else {
                break Some(cur);
            };
            if let Some(u) = n.underlying {
                break Some(u);
            }
            if !n.targs.is_empty() && n.origin.is_none() {
                break self.try_under(cur)?;
            }
            if seen.contains(&cur) {
                let decls: Vec<DeclId> = seen
                    .iter()
                    .filter_map(|t| self.store.named(*t).and_then(|n| n.base_decl()))
                    .collect();
                debug!("forward chain cycle through '{}'", self.file.decl(decl).name);
                self.report_cycle("E2102", &decls);
                break Some(self.store.invalid());
            }
            match n.orig {
                Some(next) => {
                    seen.push(cur);
                    cur = next;
                }
                // 链上的类型还在解析中，底层类型稍后按需求出
                None => break None,
            }
        };
        if let Some(u) = under {
            for t in seen {
                if let Some(n) = self.store.named_mut(t) {
                    if n.underlying.is_none() {
                        n.underlying = Some(u);
                    }
                }
            }
        }
        Ok(())
    }

    fn resolve_func_decl(
        &mut self,
        decl: DeclId,
        recv: Option<&Field>,
        groups: &[TypeParamGroup],
        sig: &FuncSig,
        has_body: bool,
    ) -> LowerResult<TypeId> {
        // 签名期间涂黑，函数体里对自身的引用不构成循环
        self.resolver.set_color(decl, Color::Black);

        let mut scope = IndexMap::new();
        let mut base = None;
        let mut blanks = VecDeque::new();
        if let Some(recv) = recv {
            let (bound, base_type, recv_blanks) = self.bind_receiver(decl, recv)?;
            scope = bound;
            base = base_type;
            blanks = recv_blanks;
        }
        self.resolver.tparam_scopes.push(scope.clone());
        let own = if groups.is_empty() {
            Ok(IndexMap::new())
        } else {
            self.collect_type_params(decl, groups)
        };
        let own = match own {
            Ok(own) => own,
            Err(e) => {
                self.resolver.tparam_scopes.pop();
                return Err(e);
            }
        };
        let tparams: Vec<TypeId> = own.values().copied().collect();
        scope.extend(own);
        if let Some(top) = self.resolver.tparam_scopes.last_mut() {
            *top = scope.clone();
        }

        self.resolver.recv_blanks = blanks;
        let sig_type = self.build_func_signature(recv, sig, tparams);
        self.resolver.tparam_scopes.pop();
        let sig_type = sig_type?;

        if !scope.is_empty() {
            self.resolver.decl_tparams.insert(decl, scope);
        }
        if let Some(base) = base {
            self.attach_method(decl, base, sig_type);
        }
        if has_body {
            self.resolver.later.push_back(Later::FuncBody(decl));
        }
        Ok(sig_type)
    }

    fn build_func_signature(
        &mut self,
        recv: Option<&Field>,
        sig: &FuncSig,
        tparams: Vec<TypeId>,
    ) -> LowerResult<TypeId> {
        let recv = match recv {
            Some(r) => {
                let t = self.eval_type(r.typ);
                self.resolver.recv_blanks.clear();
                Some(Var::new(r.name.clone().unwrap_or_default(), t?))
            }
            None => None,
        };
        self.eval_signature(sig, recv, tparams)
    }

    /// 把接收者里的类型参数名绑定到基类型的类型参数
    fn bind_receiver(
        &mut self,
        decl: DeclId,
        recv: &Field,
    ) -> LowerResult<(IndexMap<String, TypeId>, Option<TypeId>, VecDeque<TypeId>)> {
        let mut scope = IndexMap::new();
        let mut blanks = VecDeque::new();
        let Some(base) = receiver_base(&self.file, recv.typ) else {
            return Err(LowerError::unsupported(
                format!("receiver of '{}'", self.file.decl(decl).name),
                recv.span,
            ));
        };
        let base_decl = match self.resolver.scope.get(&base.name) {
            Some(&d) if matches!(self.file.decl(d).kind, DeclKind::Type { .. }) => d,
            _ => {
                let diagnostic = ErrorCodeDefinition::undeclared_name(&base.name)
                    .at(recv.span)
                    .build();
                self.diags.push(diagnostic);
                return Ok((scope, None, blanks));
            }
        };
        let base_type = self.resolve(base_decl)?;
        let tparams = self
            .store
            .named(base_type)
            .map(|n| n.tparams.clone())
            .unwrap_or_default();
        if base.params.len() != tparams.len() {
            let diagnostic =
                ErrorCodeDefinition::type_arg_count(&base.name, base.params.len(), tparams.len())
                    .at(recv.span)
                    .build();
            self.diags.push(diagnostic);
            return Ok((scope, Some(base_type), blanks));
        }
        for ((name, _), tp) in base.params.iter().zip(tparams) {
            if name == "_" {
                blanks.push_back(tp);
            } else {
                scope.insert(name.clone(), tp);
            }
        }
        Ok((scope, Some(base_type), blanks))
    }

    /// 把方法加入基类型的方法集，按声明顺序
    fn attach_method(
        &mut self,
        decl: DeclId,
        base: TypeId,
        sig: TypeId,
    ) {
        let Some(named) = self.store.named(base) else {
            return;
        };
        if !matches!(named.obj, NamedObj::Decl(_)) {
            return;
        }
        let mut methods = named.methods.clone();
        let func = self.store.alloc_func(Func {
            name: self.file.decl(decl).name.clone(),
            typ: sig,
            decl: Some(decl),
        });
        methods.push(func);
        methods.sort_by_key(|m| self.store.func(*m).decl);
        if let Some(named) = self.store.named_mut(base) {
            named.methods = methods;
        }
    }

    /// 解析类型上声明的全部方法
    fn collect_methods(
        &mut self,
        decl: DeclId,
    ) -> LowerResult<()> {
        let name = self.file.decl(decl).name.clone();
        let methods = self.resolver.methods.get(&name).cloned().unwrap_or_default();
        for method in methods {
            self.resolve(method)?;
        }
        Ok(())
    }

    /// 方法对象
    pub fn method_func(
        &self,
        base: TypeId,
        name: &str,
    ) -> Option<FuncId> {
        self.store
            .named(base)?
            .methods
            .iter()
            .copied()
            .find(|m| self.store.func(*m).name == name)
    }

    // ------------------------------------------------------------------ under

    /// 底层类型；无法确定时为无效类型
    pub fn under(
        &mut self,
        t: TypeId,
    ) -> LowerResult<TypeId> {
        Ok(self.try_under(t)?.unwrap_or_else(|| self.store.invalid()))
    }

    /// 按需求出底层类型
    ///
    /// 重新打标签的实例用泛型声明的底层类型代入类型实参；
    /// 泛型声明的底层类型已知时结果会缓存下来。
    pub(crate) fn try_under(
        &mut self,
        t: TypeId,
    ) -> LowerResult<Option<TypeId>> {
        let Some(named) = self.store.named(t) else {
            return Ok(Some(t));
        };
        if let Some(u) = named.underlying {
            return Ok(Some(u));
        }
        if !named.targs.is_empty() && named.origin.is_none() {
            let targs = named.targs.clone();
            let NamedObj::Decl(base) = &named.obj else {
                return Ok(None);
            };
            let base = *base;
            let Some(base_type) = self.decl_type(base) else {
                return Ok(None);
            };
            let tparams = self
                .store
                .named(base_type)
                .map(|n| n.tparams.clone())
                .unwrap_or_default();
            let Some(base_under) = self.try_under(base_type)? else {
                return Ok(None);
            };
            let u = self.substitute(&tparams, &targs, base_under)?;
            if let Some(n) = self.store.named_mut(t) {
                n.underlying = Some(u);
            }
            return Ok(Some(u));
        }

        let mut seen = vec![t];
        let mut cur = named.orig;
        while let Some(next) = cur {
            let Some(n) = self.store.named(next) else {
                return Ok(Some(next));
            };
            if let Some(u) = n.underlying {
                return Ok(Some(u));
            }
            if seen.contains(&next) {
                return Ok(Some(self.store.invalid()));
            }
            if !n.targs.is_empty() && n.origin.is_none() {
                return self.try_under(next);
            }
            seen.push(next);
            cur = n.orig;
        }
        Ok(None)
    }
}
