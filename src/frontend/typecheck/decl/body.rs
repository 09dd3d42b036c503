//! 函数体与初始化表达式
//!
//! 遍历值表达式和语句：引用到的包级声明按需解析（形成依赖边），
//! 出现在体内的类型表达式求值并记录。局部名字会遮蔽包级声明。

use std::collections::HashSet;

use super::Session;
use crate::frontend::ast::{
    CaseClause, CommClause, DeclId, DeclKind, Expr, ExprId, FuncSig, Stmt, StmtId,
};
use crate::frontend::typecheck::errors::{LowerError, LowerResult};

/// 语句遍历的用途
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Walk {
    /// 解析引用到的声明，求值类型表达式
    Resolve,
    /// 改写泛型引用
    Rewrite,
}

/// 局部作用域栈
#[derive(Debug, Clone, Default)]
pub(crate) struct LocalScopes {
    scopes: Vec<HashSet<String>>,
}

impl LocalScopes {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashSet::new()],
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(HashSet::new());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// 在最内层作用域绑定名字
    pub fn bind(
        &mut self,
        name: &str,
    ) {
        if name == "_" {
            return;
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string());
        }
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.scopes.iter().any(|s| s.contains(name))
    }

    /// 绑定签名中的参数和结果名
    pub fn bind_sig(
        &mut self,
        sig: &FuncSig,
    ) {
        for field in sig.params.iter().chain(&sig.results) {
            if let Some(name) = &field.name {
                self.bind(name);
            }
        }
    }
}

impl Session<'_> {
    /// 表达式引用的未被遮蔽的泛型函数或泛型类型
    pub(crate) fn generic_base(
        &self,
        x: ExprId,
        locals: &LocalScopes,
    ) -> Option<DeclId> {
        let Expr::Ident(name) = self.file.expr(self.file.unparen(x)) else {
            return None;
        };
        if locals.contains(name) || self.resolver.lookup_tparam(name).is_some() {
            return None;
        }
        let decl = *self.resolver.scope.get(name)?;
        match &self.file.decl(decl).kind {
            DeclKind::Type { tparams, .. } | DeclKind::Func { tparams, .. } if !tparams.is_empty() => {
                Some(decl)
            }
            _ => None,
        }
    }

    /// 延后的函数体检查
    pub(super) fn check_func_body(
        &mut self,
        decl: DeclId,
    ) -> LowerResult<()> {
        let DeclKind::Func {
            recv,
            sig,
            body: Some(body),
            ..
        } = self.file.decl(decl).kind.clone()
        else {
            return Ok(());
        };
        let scope = self
            .resolver
            .decl_tparams
            .get(&decl)
            .cloned()
            .unwrap_or_default();
        self.resolver.tparam_scopes.push(scope);

        let mut locals = LocalScopes::new();
        if let Some(name) = recv.as_ref().and_then(|r| r.name.as_ref()) {
            locals.bind(name);
        }
        locals.bind_sig(&sig);
        let outer = self.resolver.swap_local_types(Vec::new());
        let result = self.walk_stmt(body, &mut locals, Walk::Resolve);
        self.resolver.swap_local_types(outer);
        self.resolver.tparam_scopes.pop();
        result
    }

    /// 进入块作用域；局部类型和局部值名同进同出
    fn enter_scope(
        &mut self,
        locals: &mut LocalScopes,
    ) {
        locals.push();
        self.resolver.push_local_types();
    }

    fn leave_scope(
        &mut self,
        locals: &mut LocalScopes,
    ) {
        locals.pop();
        self.resolver.pop_local_types();
    }

    fn visit_expr(
        &mut self,
        expr: ExprId,
        locals: &mut LocalScopes,
        mode: Walk,
    ) -> LowerResult<()> {
        match mode {
            Walk::Resolve => self.walk_expr(expr, locals),
            Walk::Rewrite => self.rewrite_expr(expr, locals),
        }
    }

    fn visit_type(
        &mut self,
        expr: ExprId,
        locals: &mut LocalScopes,
        mode: Walk,
    ) -> LowerResult<()> {
        match mode {
            Walk::Resolve => self.eval_type(expr).map(|_| ()),
            Walk::Rewrite => self.rewrite_expr(expr, locals),
        }
    }

    pub(crate) fn walk_stmt(
        &mut self,
        stmt: StmtId,
        locals: &mut LocalScopes,
        mode: Walk,
    ) -> LowerResult<()> {
        match self.file.stmt(stmt).clone() {
            Stmt::Block(stmts) => self.walk_scoped(&stmts, locals, mode),
            Stmt::Expr(x) | Stmt::Go(x) | Stmt::Defer(x) => self.visit_expr(x, locals, mode),
            Stmt::Decl(decl) => self.walk_local_decl(decl, locals, mode),
            Stmt::Send { chan, value } => {
                self.visit_expr(chan, locals, mode)?;
                self.visit_expr(value, locals, mode)
            }
            Stmt::Assign { lhs, rhs, define } => {
                for x in rhs {
                    self.visit_expr(x, locals, mode)?;
                }
                for x in lhs {
                    match self.file.expr(x) {
                        Expr::Ident(name) if define => {
                            let name = name.clone();
                            locals.bind(&name);
                        }
                        _ => self.visit_expr(x, locals, mode)?,
                    }
                }
                Ok(())
            }
            Stmt::IncDec { x, .. } => self.visit_expr(x, locals, mode),
            Stmt::Return(results) => results
                .iter()
                .try_for_each(|x| self.visit_expr(*x, locals, mode)),
            Stmt::If {
                init,
                cond,
                then,
                els,
            } => {
                self.enter_scope(locals);
                let result = self.walk_if(init, cond, then, els, locals, mode);
                self.leave_scope(locals);
                result
            }
            Stmt::For {
                init,
                cond,
                post,
                body,
            } => {
                self.enter_scope(locals);
                let result = self.walk_for(init, cond, post, body, locals, mode);
                self.leave_scope(locals);
                result
            }
            Stmt::Range {
                key,
                value,
                define,
                x,
                body,
            } => {
                self.visit_expr(x, locals, mode)?;
                self.enter_scope(locals);
                let result = self.walk_range(key, value, define, body, locals, mode);
                self.leave_scope(locals);
                result
            }
            Stmt::Switch { init, tag, clauses } => {
                self.enter_scope(locals);
                let result = self.walk_switch(init, tag, &clauses, locals, mode);
                self.leave_scope(locals);
                result
            }
            Stmt::TypeSwitch {
                init,
                bind,
                x,
                clauses,
            } => {
                self.enter_scope(locals);
                let result = self.walk_type_switch(init, bind.as_deref(), x, &clauses, locals, mode);
                self.leave_scope(locals);
                result
            }
            Stmt::Select(clauses) => clauses
                .iter()
                .try_for_each(|c| self.walk_comm_clause(c, locals, mode)),
            Stmt::Labeled { stmt, .. } => self.walk_stmt(stmt, locals, mode),
            Stmt::Break(_) | Stmt::Continue(_) | Stmt::Goto(_) | Stmt::Fallthrough => Ok(()),
            Stmt::Bad => Err(LowerError::unsupported(
                "malformed statement",
                self.file.stmt_span(stmt),
            )),
        }
    }

    /// 在新的块作用域里依次遍历语句
    fn walk_scoped(
        &mut self,
        stmts: &[StmtId],
        locals: &mut LocalScopes,
        mode: Walk,
    ) -> LowerResult<()> {
        self.enter_scope(locals);
        let result = stmts.iter().try_for_each(|s| self.walk_stmt(*s, locals, mode));
        self.leave_scope(locals);
        result
    }

    fn walk_switch(
        &mut self,
        init: Option<StmtId>,
        tag: Option<ExprId>,
        clauses: &[CaseClause],
        locals: &mut LocalScopes,
        mode: Walk,
    ) -> LowerResult<()> {
        if let Some(init) = init {
            self.walk_stmt(init, locals, mode)?;
        }
        if let Some(tag) = tag {
            self.visit_expr(tag, locals, mode)?;
        }
        for clause in clauses {
            for &x in &clause.list {
                self.visit_expr(x, locals, mode)?;
            }
            self.walk_scoped(&clause.body, locals, mode)?;
        }
        Ok(())
    }

    /// 子句里的类型逐个求值；`bind` 在每个子句里重新绑定
    fn walk_type_switch(
        &mut self,
        init: Option<StmtId>,
        bind: Option<&str>,
        x: ExprId,
        clauses: &[CaseClause],
        locals: &mut LocalScopes,
        mode: Walk,
    ) -> LowerResult<()> {
        if let Some(init) = init {
            self.walk_stmt(init, locals, mode)?;
        }
        self.visit_expr(x, locals, mode)?;
        for clause in clauses {
            for &typ in &clause.list {
                // `case nil`
                if matches!(self.file.expr(typ), Expr::Ident(name) if name == "nil") {
                    continue;
                }
                self.visit_type(typ, locals, mode)?;
            }
            self.enter_scope(locals);
            if let Some(bind) = bind {
                locals.bind(bind);
            }
            let result = clause
                .body
                .iter()
                .try_for_each(|s| self.walk_stmt(*s, locals, mode));
            self.leave_scope(locals);
            result?;
        }
        Ok(())
    }

    /// 接收语句 `v := <-ch` 定义的名字只在本子句可见
    fn walk_comm_clause(
        &mut self,
        clause: &CommClause,
        locals: &mut LocalScopes,
        mode: Walk,
    ) -> LowerResult<()> {
        self.enter_scope(locals);
        let mut result = match clause.comm {
            Some(comm) => self.walk_stmt(comm, locals, mode),
            None => Ok(()),
        };
        if result.is_ok() {
            result = clause
                .body
                .iter()
                .try_for_each(|s| self.walk_stmt(*s, locals, mode));
        }
        self.leave_scope(locals);
        result
    }

    fn walk_if(
        &mut self,
        init: Option<StmtId>,
        cond: ExprId,
        then: StmtId,
        els: Option<StmtId>,
        locals: &mut LocalScopes,
        mode: Walk,
    ) -> LowerResult<()> {
        if let Some(init) = init {
            self.walk_stmt(init, locals, mode)?;
        }
        self.visit_expr(cond, locals, mode)?;
        self.walk_stmt(then, locals, mode)?;
        if let Some(els) = els {
            self.walk_stmt(els, locals, mode)?;
        }
        Ok(())
    }

    fn walk_for(
        &mut self,
        init: Option<StmtId>,
        cond: Option<ExprId>,
        post: Option<StmtId>,
        body: StmtId,
        locals: &mut LocalScopes,
        mode: Walk,
    ) -> LowerResult<()> {
        if let Some(init) = init {
            self.walk_stmt(init, locals, mode)?;
        }
        if let Some(cond) = cond {
            self.visit_expr(cond, locals, mode)?;
        }
        if let Some(post) = post {
            self.walk_stmt(post, locals, mode)?;
        }
        self.walk_stmt(body, locals, mode)
    }

    fn walk_range(
        &mut self,
        key: Option<ExprId>,
        value: Option<ExprId>,
        define: bool,
        body: StmtId,
        locals: &mut LocalScopes,
        mode: Walk,
    ) -> LowerResult<()> {
        for x in [key, value].into_iter().flatten() {
            match self.file.expr(x) {
                Expr::Ident(name) if define => {
                    let name = name.clone();
                    locals.bind(&name);
                }
                _ => self.visit_expr(x, locals, mode)?,
            }
        }
        self.walk_stmt(body, locals, mode)
    }

    fn walk_local_decl(
        &mut self,
        decl: DeclId,
        locals: &mut LocalScopes,
        mode: Walk,
    ) -> LowerResult<()> {
        let d = self.file.decl(decl).clone();
        match d.kind {
            DeclKind::Var { typ, value } | DeclKind::Const { typ, value } => {
                if let Some(typ) = typ {
                    self.visit_type(typ, locals, mode)?;
                }
                if let Some(value) = value {
                    self.visit_expr(value, locals, mode)?;
                }
                locals.bind(&d.name);
                Ok(())
            }
            DeclKind::Type { tparams, .. } if !tparams.is_empty() => Err(LowerError::unsupported(
                format!("generic local type '{}'", d.name),
                self.file.decl_span(decl),
            )),
            // 作用域从名字开始，类型体里可以引用自己
            DeclKind::Type { typ, .. } => {
                locals.bind(&d.name);
                match mode {
                    Walk::Resolve => {
                        self.resolver.bind_local_type(&d.name, decl);
                        self.resolve(decl).map(|_| ())
                    }
                    Walk::Rewrite => self.rewrite_expr(typ, locals),
                }
            }
            _ => Err(LowerError::unsupported(
                format!("local declaration of '{}'", d.name),
                self.file.decl_span(decl),
            )),
        }
    }

    /// 值表达式：解析引用到的包级声明，求值出现的类型表达式
    pub(crate) fn walk_expr(
        &mut self,
        expr: ExprId,
        locals: &mut LocalScopes,
    ) -> LowerResult<()> {
        match self.file.expr(expr).clone() {
            Expr::Ident(name) => {
                if locals.contains(&name) || self.resolver.lookup_tparam(&name).is_some() {
                    return Ok(());
                }
                if let Some(&decl) = self.resolver.scope.get(&name) {
                    self.resolve(decl)?;
                }
                Ok(())
            }
            Expr::BasicLit { .. } => Ok(()),
            Expr::Composite { typ, elts } => {
                if let Some(typ) = typ {
                    self.eval_type(typ)?;
                }
                for elt in elts {
                    self.walk_expr(elt, locals)?;
                }
                Ok(())
            }
            Expr::KeyValue { key, value } => {
                // 结构体字面量的字段名
                if !matches!(self.file.expr(key), Expr::Ident(_)) {
                    self.walk_expr(key, locals)?;
                }
                self.walk_expr(value, locals)
            }
            Expr::FuncLit { sig, body } => {
                self.eval_signature(&sig, None, Vec::new())?;
                self.enter_scope(locals);
                locals.bind_sig(&sig);
                let result = self.walk_stmt(body, locals, Walk::Resolve);
                self.leave_scope(locals);
                result
            }
            Expr::Paren(x) | Expr::Star(x) | Expr::Unary { x, .. } => self.walk_expr(x, locals),
            Expr::Binary { x, y, .. } => {
                self.walk_expr(x, locals)?;
                self.walk_expr(y, locals)
            }
            Expr::Selector { x, .. } => {
                if let Expr::Ident(pkg) = self.file.expr(self.file.unparen(x)) {
                    if !locals.contains(pkg)
                        && !self.resolver.scope.contains_key(pkg)
                        && self.import_path(pkg).is_some()
                    {
                        return Ok(());
                    }
                }
                self.walk_expr(x, locals)
            }
            Expr::Index { x, indices } => match self.generic_base(x, locals) {
                Some(base) if matches!(self.file.decl(base).kind, DeclKind::Type { .. }) => {
                    self.eval_type(expr).map(|_| ())
                }
                Some(base) => {
                    self.resolve(base)?;
                    for idx in indices {
                        self.eval_type(idx)?;
                    }
                    Ok(())
                }
                None => {
                    self.walk_expr(x, locals)?;
                    indices.iter().try_for_each(|i| self.walk_expr(*i, locals))
                }
            },
            Expr::Slice { x, lo, hi, max } => {
                self.walk_expr(x, locals)?;
                for e in [lo, hi, max].into_iter().flatten() {
                    self.walk_expr(e, locals)?;
                }
                Ok(())
            }
            Expr::TypeAssert { x, typ } => {
                self.walk_expr(x, locals)?;
                if let Some(typ) = typ {
                    self.eval_type(typ)?;
                }
                Ok(())
            }
            Expr::Call { fun, args, .. } => {
                self.walk_expr(fun, locals)?;
                args.iter().try_for_each(|a| self.walk_expr(*a, locals))
            }
            Expr::ArrayType { .. }
            | Expr::StructType { .. }
            | Expr::FuncType(_)
            | Expr::InterfaceType { .. }
            | Expr::MapType { .. }
            | Expr::ChanType { .. } => self.eval_type(expr).map(|_| ()),
            Expr::Bad => Err(LowerError::unsupported(
                "malformed expression",
                self.file.expr_span(expr),
            )),
        }
    }
}
