//! 语法树构建器
//!
//! 解析器之外构造语法树的唯一入口，测试和基准都用它。每个顶层声明
//! 占新的一行，所以声明的先后就是源码位置的先后。

use super::*;
use crate::util::span::Position;

/// 文件构建器
#[derive(Debug)]
pub struct FileBuilder {
    file: File,
    line: usize,
    column: usize,
    offset: usize,
}

impl FileBuilder {
    /// 为模块 `package` 创建构建器
    pub fn new(package: &str) -> Self {
        Self {
            file: File::new(package),
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// 完成构建
    pub fn finish(self) -> File {
        self.file
    }

    /// 构建中的文件
    pub fn file(&self) -> &File {
        &self.file
    }

    fn span(&mut self) -> Span {
        let start = Position::with_offset(self.line, self.column, self.offset);
        self.column += 1;
        self.offset += 1;
        let end = Position::with_offset(self.line, self.column, self.offset);
        Span::new(start, end)
    }

    fn new_line(&mut self) -> Span {
        self.line += 1;
        self.column = 1;
        self.offset += 1;
        self.span()
    }

    // ---------------------------------------------------------------- imports

    pub fn import(
        &mut self,
        path: &str,
    ) -> &mut Self {
        let mut spec = ImportSpec::new(path);
        spec.span = self.new_line();
        self.file.imports.push(spec);
        self
    }

    pub fn import_as(
        &mut self,
        path: &str,
        name: &str,
    ) -> &mut Self {
        let mut spec = ImportSpec::named(path, name);
        spec.span = self.new_line();
        self.file.imports.push(spec);
        self
    }

    // ---------------------------------------------------------------- exprs

    pub fn expr(
        &mut self,
        expr: Expr,
    ) -> ExprId {
        let span = self.span();
        self.file.add_expr(expr, span)
    }

    pub fn ident(
        &mut self,
        name: &str,
    ) -> ExprId {
        self.expr(Expr::Ident(name.to_string()))
    }

    pub fn int(
        &mut self,
        value: i64,
    ) -> ExprId {
        self.expr(Expr::BasicLit {
            kind: LitKind::Int,
            value: value.to_string(),
        })
    }

    pub fn string(
        &mut self,
        value: &str,
    ) -> ExprId {
        self.expr(Expr::BasicLit {
            kind: LitKind::String,
            value: format!("{:?}", value),
        })
    }

    /// 显式实例化或下标 `x[indices...]`
    pub fn index(
        &mut self,
        x: ExprId,
        indices: Vec<ExprId>,
    ) -> ExprId {
        self.expr(Expr::Index { x, indices })
    }

    /// `name[args...]`
    pub fn inst(
        &mut self,
        name: &str,
        args: Vec<ExprId>,
    ) -> ExprId {
        let x = self.ident(name);
        self.index(x, args)
    }

    pub fn call(
        &mut self,
        fun: ExprId,
        args: Vec<ExprId>,
    ) -> ExprId {
        self.expr(Expr::Call {
            fun,
            args,
            ellipsis: false,
        })
    }

    /// `name(args...)`
    pub fn call_named(
        &mut self,
        name: &str,
        args: Vec<ExprId>,
    ) -> ExprId {
        let fun = self.ident(name);
        self.call(fun, args)
    }

    pub fn selector(
        &mut self,
        x: ExprId,
        sel: &str,
    ) -> ExprId {
        self.expr(Expr::Selector {
            x,
            sel: sel.to_string(),
        })
    }

    /// `pkg.Name`
    pub fn qualified(
        &mut self,
        pkg: &str,
        name: &str,
    ) -> ExprId {
        let x = self.ident(pkg);
        self.selector(x, name)
    }

    pub fn paren(
        &mut self,
        x: ExprId,
    ) -> ExprId {
        self.expr(Expr::Paren(x))
    }

    pub fn composite(
        &mut self,
        typ: Option<ExprId>,
        elts: Vec<ExprId>,
    ) -> ExprId {
        self.expr(Expr::Composite { typ, elts })
    }

    pub fn key_value(
        &mut self,
        key: ExprId,
        value: ExprId,
    ) -> ExprId {
        self.expr(Expr::KeyValue { key, value })
    }

    pub fn unary(
        &mut self,
        op: UnaryOp,
        x: ExprId,
    ) -> ExprId {
        self.expr(Expr::Unary { op, x })
    }

    pub fn binary(
        &mut self,
        op: BinaryOp,
        x: ExprId,
        y: ExprId,
    ) -> ExprId {
        self.expr(Expr::Binary { op, x, y })
    }

    pub fn func_lit(
        &mut self,
        sig: FuncSig,
        body: StmtId,
    ) -> ExprId {
        self.expr(Expr::FuncLit { sig, body })
    }

    // ---------------------------------------------------------------- types

    /// `*t`（指针类型或解引用）
    pub fn ptr(
        &mut self,
        t: ExprId,
    ) -> ExprId {
        self.expr(Expr::Star(t))
    }

    /// `[]elem`
    pub fn slice(
        &mut self,
        elem: ExprId,
    ) -> ExprId {
        self.expr(Expr::ArrayType { len: None, elem })
    }

    /// `[len]elem`
    pub fn array(
        &mut self,
        len: i64,
        elem: ExprId,
    ) -> ExprId {
        let len = self.int(len);
        self.expr(Expr::ArrayType {
            len: Some(len),
            elem,
        })
    }

    pub fn map(
        &mut self,
        key: ExprId,
        value: ExprId,
    ) -> ExprId {
        self.expr(Expr::MapType { key, value })
    }

    pub fn chan(
        &mut self,
        dir: ChanDir,
        elem: ExprId,
    ) -> ExprId {
        self.expr(Expr::ChanType { dir, elem })
    }

    pub fn struct_type(
        &mut self,
        fields: Vec<Field>,
    ) -> ExprId {
        self.expr(Expr::StructType { fields })
    }

    pub fn func_type(
        &mut self,
        sig: FuncSig,
    ) -> ExprId {
        self.expr(Expr::FuncType(sig))
    }

    pub fn interface(
        &mut self,
        methods: Vec<InterfaceMethod>,
        embeds: Vec<ExprId>,
    ) -> ExprId {
        self.expr(Expr::InterfaceType { methods, embeds })
    }

    pub fn empty_interface(&mut self) -> ExprId {
        self.interface(Vec::new(), Vec::new())
    }

    pub fn method_spec(
        &mut self,
        name: &str,
        sig: FuncSig,
    ) -> InterfaceMethod {
        InterfaceMethod {
            name: name.to_string(),
            sig,
            span: self.span(),
        }
    }

    // ---------------------------------------------------------------- fields

    pub fn field(
        &mut self,
        name: &str,
        typ: ExprId,
    ) -> Field {
        Field {
            name: Some(name.to_string()),
            typ,
            tag: None,
            span: self.span(),
        }
    }

    pub fn tagged_field(
        &mut self,
        name: &str,
        typ: ExprId,
        tag: &str,
    ) -> Field {
        Field {
            name: Some(name.to_string()),
            typ,
            tag: Some(tag.to_string()),
            span: self.span(),
        }
    }

    /// 匿名参数或嵌入字段
    pub fn anon(
        &mut self,
        typ: ExprId,
    ) -> Field {
        Field {
            name: None,
            typ,
            tag: None,
            span: self.span(),
        }
    }

    pub fn sig(
        &mut self,
        params: Vec<Field>,
        results: Vec<Field>,
    ) -> FuncSig {
        FuncSig {
            params,
            results,
            variadic: false,
        }
    }

    /// 一组共享约束的类型参数
    pub fn tparams(
        &mut self,
        names: &[&str],
        bound: Option<ExprId>,
    ) -> TypeParamGroup {
        TypeParamGroup {
            names: names
                .iter()
                .map(|n| (n.to_string(), self.span()))
                .collect(),
            bound,
        }
    }

    // ---------------------------------------------------------------- stmts

    pub fn stmt(
        &mut self,
        stmt: Stmt,
    ) -> StmtId {
        let span = self.span();
        self.file.add_stmt(stmt, span)
    }

    pub fn block(
        &mut self,
        stmts: Vec<StmtId>,
    ) -> StmtId {
        self.stmt(Stmt::Block(stmts))
    }

    pub fn expr_stmt(
        &mut self,
        x: ExprId,
    ) -> StmtId {
        self.stmt(Stmt::Expr(x))
    }

    pub fn ret(
        &mut self,
        results: Vec<ExprId>,
    ) -> StmtId {
        self.stmt(Stmt::Return(results))
    }

    pub fn assign(
        &mut self,
        lhs: Vec<ExprId>,
        rhs: Vec<ExprId>,
    ) -> StmtId {
        self.stmt(Stmt::Assign {
            lhs,
            rhs,
            define: false,
        })
    }

    /// `names := rhs`
    pub fn define(
        &mut self,
        names: &[&str],
        rhs: Vec<ExprId>,
    ) -> StmtId {
        let lhs = names.iter().map(|n| self.ident(n)).collect();
        self.stmt(Stmt::Assign {
            lhs,
            rhs,
            define: true,
        })
    }

    /// 局部 `var name typ = value`
    pub fn local_var(
        &mut self,
        name: &str,
        typ: Option<ExprId>,
        value: Option<ExprId>,
    ) -> StmtId {
        let span = self.span();
        let decl = self.file.add_decl(
            Decl {
                name: name.to_string(),
                kind: DeclKind::Var { typ, value },
            },
            span,
        );
        self.stmt(Stmt::Decl(decl))
    }

    /// 局部 `type name typ`
    pub fn local_type(
        &mut self,
        name: &str,
        typ: ExprId,
    ) -> StmtId {
        let span = self.span();
        let decl = self.file.add_decl(
            Decl {
                name: name.to_string(),
                kind: DeclKind::Type {
                    tparams: Vec::new(),
                    alias: false,
                    typ,
                },
            },
            span,
        );
        self.stmt(Stmt::Decl(decl))
    }

    /// `ch <- value`
    pub fn send(
        &mut self,
        chan: ExprId,
        value: ExprId,
    ) -> StmtId {
        self.stmt(Stmt::Send { chan, value })
    }

    /// `case list...: body`，`list` 为空时是 `default`
    pub fn case(
        &mut self,
        list: Vec<ExprId>,
        body: Vec<StmtId>,
    ) -> CaseClause {
        CaseClause { list, body }
    }

    pub fn switch(
        &mut self,
        tag: Option<ExprId>,
        clauses: Vec<CaseClause>,
    ) -> StmtId {
        self.stmt(Stmt::Switch {
            init: None,
            tag,
            clauses,
        })
    }

    /// `switch bind := x.(type) { clauses }`
    pub fn type_switch(
        &mut self,
        bind: Option<&str>,
        x: ExprId,
        clauses: Vec<CaseClause>,
    ) -> StmtId {
        self.stmt(Stmt::TypeSwitch {
            init: None,
            bind: bind.map(str::to_string),
            x,
            clauses,
        })
    }

    /// `select` 子句，`comm` 为 `None` 时是 `default`
    pub fn comm(
        &mut self,
        comm: Option<StmtId>,
        body: Vec<StmtId>,
    ) -> CommClause {
        CommClause { comm, body }
    }

    pub fn select(
        &mut self,
        clauses: Vec<CommClause>,
    ) -> StmtId {
        self.stmt(Stmt::Select(clauses))
    }

    pub fn labeled(
        &mut self,
        label: &str,
        stmt: StmtId,
    ) -> StmtId {
        self.stmt(Stmt::Labeled {
            label: label.to_string(),
            stmt,
        })
    }

    pub fn break_stmt(
        &mut self,
        label: Option<&str>,
    ) -> StmtId {
        self.stmt(Stmt::Break(label.map(str::to_string)))
    }

    pub fn if_stmt(
        &mut self,
        cond: ExprId,
        then: StmtId,
        els: Option<StmtId>,
    ) -> StmtId {
        self.stmt(Stmt::If {
            init: None,
            cond,
            then,
            els,
        })
    }

    /// `for key, value := range x { body }`
    pub fn range(
        &mut self,
        key: Option<&str>,
        value: Option<&str>,
        x: ExprId,
        body: StmtId,
    ) -> StmtId {
        let key = key.map(|k| self.ident(k));
        let value = value.map(|v| self.ident(v));
        self.stmt(Stmt::Range {
            key,
            value,
            define: true,
            x,
            body,
        })
    }

    // ---------------------------------------------------------------- decls

    fn decl(
        &mut self,
        name: &str,
        kind: DeclKind,
    ) -> DeclId {
        let span = self.new_line();
        self.file.push_decl(
            Decl {
                name: name.to_string(),
                kind,
            },
            span,
        )
    }

    /// `type name typ`
    pub fn type_decl(
        &mut self,
        name: &str,
        typ: ExprId,
    ) -> DeclId {
        self.generic_type(name, Vec::new(), typ)
    }

    /// `type name[tparams] typ`
    pub fn generic_type(
        &mut self,
        name: &str,
        tparams: Vec<TypeParamGroup>,
        typ: ExprId,
    ) -> DeclId {
        self.decl(
            name,
            DeclKind::Type {
                tparams,
                alias: false,
                typ,
            },
        )
    }

    /// `type name = typ`
    pub fn alias(
        &mut self,
        name: &str,
        typ: ExprId,
    ) -> DeclId {
        self.decl(
            name,
            DeclKind::Type {
                tparams: Vec::new(),
                alias: true,
                typ,
            },
        )
    }

    pub fn var_decl(
        &mut self,
        name: &str,
        typ: Option<ExprId>,
        value: Option<ExprId>,
    ) -> DeclId {
        self.decl(name, DeclKind::Var { typ, value })
    }

    pub fn const_decl(
        &mut self,
        name: &str,
        typ: Option<ExprId>,
        value: Option<ExprId>,
    ) -> DeclId {
        self.decl(name, DeclKind::Const { typ, value })
    }

    /// 普通函数
    pub fn func(
        &mut self,
        name: &str,
        sig: FuncSig,
        body: Option<StmtId>,
    ) -> DeclId {
        self.generic_func(name, Vec::new(), sig, body)
    }

    /// 泛型函数
    pub fn generic_func(
        &mut self,
        name: &str,
        tparams: Vec<TypeParamGroup>,
        sig: FuncSig,
        body: Option<StmtId>,
    ) -> DeclId {
        self.decl(
            name,
            DeclKind::Func {
                recv: None,
                tparams,
                sig,
                body,
            },
        )
    }

    /// 方法
    pub fn method(
        &mut self,
        recv: Field,
        name: &str,
        sig: FuncSig,
        body: Option<StmtId>,
    ) -> DeclId {
        self.decl(
            name,
            DeclKind::Func {
                recv: Some(recv),
                tparams: Vec::new(),
                sig,
                body,
            },
        )
    }

    /// `contract name(params) { param bound ... }`
    pub fn contract(
        &mut self,
        name: &str,
        params: &[&str],
        bounds: Vec<Option<ExprId>>,
    ) -> DeclId {
        let tparams = params.iter().map(|p| (p.to_string(), self.span())).collect();
        self.decl(name, DeclKind::Contract { tparams, bounds })
    }
}
