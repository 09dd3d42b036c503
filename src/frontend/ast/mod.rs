//! 语法树
//!
//! 语法树由外部解析器提供。节点存放在 [`File`] 的三个 arena 中，
//! 通过 [`DeclId`]、[`ExprId`]、[`StmtId`] 引用。值表达式和类型表达式
//! 共用一个 arena：`List[int]` 既可能是实例化也可能是下标，由名字解析决定。
//!
//! 降级过程只做两种修改：把引用节点原地替换成标识符，以及追加新生成的声明。

pub mod build;

use crate::util::span::Span;
use crate::util::Spanned;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// arena 下标
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }
    };
}

define_id!(
    /// 声明节点 ID
    DeclId
);
define_id!(
    /// 表达式节点 ID
    ExprId
);
define_id!(
    /// 语句节点 ID
    StmtId
);

/// 导入声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// 导入路径
    pub path: String,
    /// 显式名字（别名、`_` 或 `.`）
    pub name: Option<String>,
    pub span: Span,
}

impl ImportSpec {
    /// 无名导入
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            span: Span::dummy(),
        }
    }

    /// 带名字的导入
    pub fn named(
        path: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: Some(name.into()),
            span: Span::dummy(),
        }
    }

    /// 文件内引用该包时使用的名字
    pub fn local_name(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }

    /// `_` 导入，不能被引用
    pub fn is_blank(&self) -> bool {
        self.name.as_deref() == Some("_")
    }

    /// `.` 导入
    pub fn is_dot(&self) -> bool {
        self.name.as_deref() == Some(".")
    }
}

/// 字段、参数或接收者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// 名字；结构体中 `None` 表示嵌入字段
    pub name: Option<String>,
    pub typ: ExprId,
    /// 结构体字段标签
    pub tag: Option<String>,
    pub span: Span,
}

/// 函数签名
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FuncSig {
    pub params: Vec<Field>,
    pub results: Vec<Field>,
    /// 最后一个参数是否为 `...T`（参数的 `typ` 是元素类型）
    pub variadic: bool,
}

/// 类型参数分组：`T, U C` 中的一组名字和它们共同的约束
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParamGroup {
    pub names: Vec<(String, Span)>,
    /// 约束：接口类型、合约名 `C`、或合约应用 `C(T, U)`；`None` 为空接口
    pub bound: Option<ExprId>,
}

/// 接口方法
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceMethod {
    pub name: String,
    pub sig: FuncSig,
    pub span: Span,
}

/// 声明种类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    Const {
        typ: Option<ExprId>,
        value: Option<ExprId>,
    },
    Var {
        typ: Option<ExprId>,
        value: Option<ExprId>,
    },
    Type {
        tparams: Vec<TypeParamGroup>,
        alias: bool,
        typ: ExprId,
    },
    Func {
        recv: Option<Field>,
        tparams: Vec<TypeParamGroup>,
        sig: FuncSig,
        body: Option<StmtId>,
    },
    /// `contract C(T, U) { T bound; U bound }`，`bounds[i]` 对应 `tparams[i]`
    Contract {
        tparams: Vec<(String, Span)>,
        bounds: Vec<Option<ExprId>>,
    },
}

/// 声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decl {
    pub name: String,
    pub kind: DeclKind,
}

impl Decl {
    /// 是否为值声明（常量或变量）
    pub fn is_value(&self) -> bool {
        matches!(self.kind, DeclKind::Const { .. } | DeclKind::Var { .. })
    }

    /// 是否为非别名的类型定义
    pub fn is_type_definition(&self) -> bool {
        matches!(self.kind, DeclKind::Type { alias: false, .. })
    }

    /// 声明自身的类型参数分组（方法的类型参数来自接收者，不在这里）
    pub fn tparam_groups(&self) -> &[TypeParamGroup] {
        match &self.kind {
            DeclKind::Type { tparams, .. } | DeclKind::Func { tparams, .. } => tparams,
            _ => &[],
        }
    }

    /// 方法的接收者
    pub fn receiver(&self) -> Option<&Field> {
        match &self.kind {
            DeclKind::Func { recv, .. } => recv.as_ref(),
            _ => None,
        }
    }
}

/// 字面量种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Char,
    String,
}

/// 一元运算符（解引用用 [`Expr::Star`] 表示）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Xor,
    Addr,
    Recv,
}

/// 二元运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
    LogAnd,
    LogOr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// 通道方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// 表达式（值表达式与类型表达式）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Ident(String),
    BasicLit {
        kind: LitKind,
        value: String,
    },
    Composite {
        typ: Option<ExprId>,
        elts: Vec<ExprId>,
    },
    KeyValue {
        key: ExprId,
        value: ExprId,
    },
    FuncLit {
        sig: FuncSig,
        body: StmtId,
    },
    Paren(ExprId),
    Selector {
        x: ExprId,
        sel: String,
    },
    /// 下标或显式实例化 `F[int]`
    Index {
        x: ExprId,
        indices: Vec<ExprId>,
    },
    Slice {
        x: ExprId,
        lo: Option<ExprId>,
        hi: Option<ExprId>,
        max: Option<ExprId>,
    },
    TypeAssert {
        x: ExprId,
        typ: Option<ExprId>,
    },
    Call {
        fun: ExprId,
        args: Vec<ExprId>,
        ellipsis: bool,
    },
    /// 解引用或指针类型
    Star(ExprId),
    Unary {
        op: UnaryOp,
        x: ExprId,
    },
    Binary {
        op: BinaryOp,
        x: ExprId,
        y: ExprId,
    },
    /// `len` 为 `None` 时是切片类型
    ArrayType {
        len: Option<ExprId>,
        elem: ExprId,
    },
    StructType {
        fields: Vec<Field>,
    },
    FuncType(FuncSig),
    InterfaceType {
        methods: Vec<InterfaceMethod>,
        embeds: Vec<ExprId>,
    },
    MapType {
        key: ExprId,
        value: ExprId,
    },
    ChanType {
        dir: ChanDir,
        elem: ExprId,
    },
    /// 解析失败留下的节点
    Bad,
}

/// `switch` 的一个子句
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseClause {
    /// 值或类型列表，为空时是 `default`
    pub list: Vec<ExprId>,
    pub body: Vec<StmtId>,
}

impl CaseClause {
    pub fn is_default(&self) -> bool {
        self.list.is_empty()
    }
}

/// `select` 的一个子句
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommClause {
    /// 发送或接收语句，`None` 时是 `default`
    pub comm: Option<StmtId>,
    pub body: Vec<StmtId>,
}

/// 语句
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Block(Vec<StmtId>),
    Expr(ExprId),
    /// 局部声明：`var`、`const` 或 `type`
    Decl(DeclId),
    /// `ch <- value`
    Send {
        chan: ExprId,
        value: ExprId,
    },
    Assign {
        lhs: Vec<ExprId>,
        rhs: Vec<ExprId>,
        /// `:=`
        define: bool,
    },
    IncDec {
        x: ExprId,
        inc: bool,
    },
    Return(Vec<ExprId>),
    If {
        init: Option<StmtId>,
        cond: ExprId,
        then: StmtId,
        els: Option<StmtId>,
    },
    For {
        init: Option<StmtId>,
        cond: Option<ExprId>,
        post: Option<StmtId>,
        body: StmtId,
    },
    Range {
        key: Option<ExprId>,
        value: Option<ExprId>,
        define: bool,
        x: ExprId,
        body: StmtId,
    },
    Switch {
        init: Option<StmtId>,
        tag: Option<ExprId>,
        clauses: Vec<CaseClause>,
    },
    /// `switch bind := x.(type)`，子句列表里是类型
    TypeSwitch {
        init: Option<StmtId>,
        bind: Option<String>,
        x: ExprId,
        clauses: Vec<CaseClause>,
    },
    Select(Vec<CommClause>),
    Labeled {
        label: String,
        stmt: StmtId,
    },
    Go(ExprId),
    Defer(ExprId),
    Break(Option<String>),
    Continue(Option<String>),
    Goto(String),
    Fallthrough,
    Bad,
}

/// 一个源文件的语法树
#[derive(Debug, Clone, Default)]
pub struct File {
    /// 本文件所属模块的导入路径
    pub package: String,
    pub imports: Vec<ImportSpec>,
    /// 顶层声明（源码顺序）
    pub decls: Vec<DeclId>,
    decl_arena: Vec<Spanned<Decl>>,
    expr_arena: Vec<Spanned<Expr>>,
    stmt_arena: Vec<Spanned<Stmt>>,
}

impl File {
    /// 创建空文件
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ..Self::default()
        }
    }

    /// 分配声明节点（不加入顶层列表）
    pub fn add_decl(
        &mut self,
        decl: Decl,
        span: Span,
    ) -> DeclId {
        self.decl_arena.push(Spanned::new(decl, span));
        DeclId::from_index(self.decl_arena.len() - 1)
    }

    /// 分配声明节点并加入顶层列表
    pub fn push_decl(
        &mut self,
        decl: Decl,
        span: Span,
    ) -> DeclId {
        let id = self.add_decl(decl, span);
        self.decls.push(id);
        id
    }

    pub fn decl(
        &self,
        id: DeclId,
    ) -> &Decl {
        &self.decl_arena[id.index()].value
    }

    pub fn decl_mut(
        &mut self,
        id: DeclId,
    ) -> &mut Decl {
        &mut self.decl_arena[id.index()].value
    }

    pub fn decl_span(
        &self,
        id: DeclId,
    ) -> Span {
        self.decl_arena[id.index()].span
    }

    pub fn add_expr(
        &mut self,
        expr: Expr,
        span: Span,
    ) -> ExprId {
        self.expr_arena.push(Spanned::new(expr, span));
        ExprId::from_index(self.expr_arena.len() - 1)
    }

    pub fn expr(
        &self,
        id: ExprId,
    ) -> &Expr {
        &self.expr_arena[id.index()].value
    }

    pub fn expr_span(
        &self,
        id: ExprId,
    ) -> Span {
        self.expr_arena[id.index()].span
    }

    /// 原地替换表达式节点，位置保持不变
    pub fn replace_expr(
        &mut self,
        id: ExprId,
        expr: Expr,
    ) {
        self.expr_arena[id.index()].value = expr;
    }

    pub fn add_stmt(
        &mut self,
        stmt: Stmt,
        span: Span,
    ) -> StmtId {
        self.stmt_arena.push(Spanned::new(stmt, span));
        StmtId::from_index(self.stmt_arena.len() - 1)
    }

    pub fn stmt(
        &self,
        id: StmtId,
    ) -> &Stmt {
        &self.stmt_arena[id.index()].value
    }

    pub fn stmt_span(
        &self,
        id: StmtId,
    ) -> Span {
        self.stmt_arena[id.index()].span
    }

    /// 表达式是否为指定名字的标识符
    pub fn is_ident(
        &self,
        id: ExprId,
        name: &str,
    ) -> bool {
        matches!(self.expr(id), Expr::Ident(n) if n == name)
    }

    /// 去掉括号
    pub fn unparen(
        &self,
        mut id: ExprId,
    ) -> ExprId {
        while let Expr::Paren(inner) = self.expr(id) {
            id = *inner;
        }
        id
    }
}
