//! 类型形状模型
//!
//! 所有类型都存放在 [`TypeStore`] 这个 arena 里，用 [`TypeId`] 引用。
//! 形状是一个封闭的变体集合（[`TypeData`]），新的形状只能整体分配，
//! 不会被就地修改；唯一的例外是名义类型，它在声明解析过程中先以
//! 占位符的形式出现，随后补齐底层类型和方法集。
//!
//! 语义相同不等于 `TypeId` 相同，比较请用 [`super::identical`]。

use crate::frontend::ast::{ChanDir, DeclId};
use std::fmt;

/// 类型 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 函数对象 ID（接口方法和具名类型的方法）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(u32);

impl FuncId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 基本类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    /// 出错后的类型，参与任何比较都不报二次错误
    Invalid,
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
}

impl BasicKind {
    /// 全部基本类型，顺序即 `TypeStore` 中的预分配顺序
    pub const ALL: [BasicKind; 19] = [
        BasicKind::Invalid,
        BasicKind::Bool,
        BasicKind::Int,
        BasicKind::Int8,
        BasicKind::Int16,
        BasicKind::Int32,
        BasicKind::Int64,
        BasicKind::Uint,
        BasicKind::Uint8,
        BasicKind::Uint16,
        BasicKind::Uint32,
        BasicKind::Uint64,
        BasicKind::Uintptr,
        BasicKind::Float32,
        BasicKind::Float64,
        BasicKind::Complex64,
        BasicKind::Complex128,
        BasicKind::String,
        BasicKind::UnsafePointer,
    ];

    /// 源码中的名字
    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Invalid => "invalid type",
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
        }
    }

    fn slot(self) -> usize {
        BasicKind::ALL
            .iter()
            .position(|k| *k == self)
            .unwrap_or_default()
    }
}

/// 结构体字段、元组元素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
    pub name: String,
    pub typ: TypeId,
    /// 嵌入字段
    pub embedded: bool,
}

impl Var {
    pub fn new(
        name: impl Into<String>,
        typ: TypeId,
    ) -> Self {
        Self {
            name: name.into(),
            typ,
            embedded: false,
        }
    }
}

/// 函数签名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub recv: Option<Var>,
    /// 参数元组
    pub params: TypeId,
    /// 结果元组
    pub results: TypeId,
    pub variadic: bool,
    /// 签名自身绑定的类型参数
    pub tparams: Vec<TypeId>,
}

/// 接口
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Interface {
    pub methods: Vec<FuncId>,
    pub embeddeds: Vec<TypeId>,
}

/// 类型完整性标记
///
/// 与声明颜色相互独立：颜色跟踪声明是否解析完，
/// 这里跟踪类型是否能在有限步内展开。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Completion {
    #[default]
    Unmarked,
    /// 正在检查
    Marked,
    Valid,
    Invalid,
}

/// 名义类型背后的对象
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NamedObj {
    /// 本文件中的类型声明（含生成的实例声明）
    Decl(DeclId),
    /// 其它模块导出的类型
    External { path: String },
    /// 预声明类型（`error`）
    Universe,
}

/// 名义类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    pub obj: NamedObj,
    /// 生成的实例指向其泛型声明
    pub origin: Option<DeclId>,
    pub name: String,
    /// 声明右侧的类型（可能是另一个名义类型，形成前向链）
    pub orig: Option<TypeId>,
    /// 最终的底层类型，`None` 表示尚未确定
    pub underlying: Option<TypeId>,
    /// 泛型声明的类型参数
    pub tparams: Vec<TypeId>,
    /// 实例化时的类型实参
    pub targs: Vec<TypeId>,
    pub methods: Vec<FuncId>,
    pub mark: Completion,
}

impl NamedType {
    /// 泛型声明（重新打标签的实例和生成的实例都指回它）
    pub fn base_decl(&self) -> Option<DeclId> {
        match (&self.obj, self.origin) {
            (_, Some(origin)) => Some(origin),
            (NamedObj::Decl(decl), None) => Some(*decl),
            _ => None,
        }
    }
}

/// 类型参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub name: String,
    /// 声明它的泛型实体或合约
    pub owner: DeclId,
    pub index: usize,
    /// 约束（接口）
    pub bound: TypeId,
}

/// 类型形状
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeData {
    Basic(BasicKind),
    Array { len: i64, elem: TypeId },
    Slice(TypeId),
    Struct {
        fields: Vec<Var>,
        /// 没有任何字段带标签时为 `None`
        tags: Option<Vec<String>>,
    },
    Pointer(TypeId),
    Tuple(Vec<Var>),
    Signature(Signature),
    Interface(Interface),
    Map { key: TypeId, value: TypeId },
    Chan { dir: ChanDir, elem: TypeId },
    Named(NamedType),
    TypeParam(TypeParam),
}

/// 函数对象
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Func {
    pub name: String,
    /// 签名类型
    pub typ: TypeId,
    /// 方法声明（接口方法为 `None`）
    pub decl: Option<DeclId>,
}

/// 类型 arena
#[derive(Debug, Clone)]
pub struct TypeStore {
    types: Vec<TypeData>,
    funcs: Vec<Func>,
    empty_tuple: TypeId,
    empty_interface: TypeId,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeStore {
    /// 创建类型 arena，预分配全部基本类型、空元组和空接口
    pub fn new() -> Self {
        let mut types: Vec<TypeData> = BasicKind::ALL.iter().map(|k| TypeData::Basic(*k)).collect();
        types.push(TypeData::Tuple(Vec::new()));
        types.push(TypeData::Interface(Interface::default()));
        let n = types.len() as u32;
        Self {
            types,
            funcs: Vec::new(),
            empty_tuple: TypeId(n - 2),
            empty_interface: TypeId(n - 1),
        }
    }

    /// 分配新形状
    pub fn alloc(
        &mut self,
        data: TypeData,
    ) -> TypeId {
        self.types.push(data);
        TypeId(self.types.len() as u32 - 1)
    }

    pub fn get(
        &self,
        id: TypeId,
    ) -> &TypeData {
        &self.types[id.index()]
    }

    pub fn basic(
        &self,
        kind: BasicKind,
    ) -> TypeId {
        TypeId(kind.slot() as u32)
    }

    pub fn invalid(&self) -> TypeId {
        self.basic(BasicKind::Invalid)
    }

    pub fn is_invalid(
        &self,
        id: TypeId,
    ) -> bool {
        matches!(self.get(id), TypeData::Basic(BasicKind::Invalid))
    }

    pub fn empty_tuple(&self) -> TypeId {
        self.empty_tuple
    }

    pub fn empty_interface(&self) -> TypeId {
        self.empty_interface
    }

    pub fn pointer(
        &mut self,
        elem: TypeId,
    ) -> TypeId {
        self.alloc(TypeData::Pointer(elem))
    }

    pub fn slice(
        &mut self,
        elem: TypeId,
    ) -> TypeId {
        self.alloc(TypeData::Slice(elem))
    }

    /// 元组；空元组复用预分配的那个
    pub fn tuple(
        &mut self,
        vars: Vec<Var>,
    ) -> TypeId {
        if vars.is_empty() {
            return self.empty_tuple;
        }
        self.alloc(TypeData::Tuple(vars))
    }

    /// 结构体；标签全空时丢掉标签表
    pub fn structure(
        &mut self,
        fields: Vec<Var>,
        tags: Vec<String>,
    ) -> TypeId {
        let tags = if tags.iter().any(|t| !t.is_empty()) {
            Some(tags)
        } else {
            None
        };
        self.alloc(TypeData::Struct { fields, tags })
    }

    pub fn signature(
        &mut self,
        params: Vec<Var>,
        results: Vec<Var>,
        variadic: bool,
    ) -> TypeId {
        let params = self.tuple(params);
        let results = self.tuple(results);
        self.alloc(TypeData::Signature(Signature {
            recv: None,
            params,
            results,
            variadic,
            tparams: Vec::new(),
        }))
    }

    pub fn alloc_func(
        &mut self,
        func: Func,
    ) -> FuncId {
        self.funcs.push(func);
        FuncId(self.funcs.len() as u32 - 1)
    }

    pub fn func(
        &self,
        id: FuncId,
    ) -> &Func {
        &self.funcs[id.index()]
    }

    pub fn named(
        &self,
        id: TypeId,
    ) -> Option<&NamedType> {
        match self.get(id) {
            TypeData::Named(named) => Some(named),
            _ => None,
        }
    }

    pub fn named_mut(
        &mut self,
        id: TypeId,
    ) -> Option<&mut NamedType> {
        match &mut self.types[id.index()] {
            TypeData::Named(named) => Some(named),
            _ => None,
        }
    }

    pub fn type_param(
        &self,
        id: TypeId,
    ) -> Option<&TypeParam> {
        match self.get(id) {
            TypeData::TypeParam(tp) => Some(tp),
            _ => None,
        }
    }

    /// 设置类型参数的约束
    pub fn set_bound(
        &mut self,
        id: TypeId,
        bound: TypeId,
    ) {
        if let TypeData::TypeParam(tp) = &mut self.types[id.index()] {
            tp.bound = bound;
        }
    }

    /// 已知的底层类型（不做任何求值）
    ///
    /// 名义类型的底层类型未确定时返回 `None`。
    pub fn known_under(
        &self,
        id: TypeId,
    ) -> Option<TypeId> {
        match self.get(id) {
            TypeData::Named(named) => named.underlying,
            _ => Some(id),
        }
    }

    /// 是否为接口形状（或因错误而无效）
    pub fn is_interface_like(
        &self,
        id: TypeId,
    ) -> bool {
        match self.known_under(id).map(|u| self.get(u)) {
            Some(TypeData::Interface(_)) => true,
            Some(TypeData::Basic(BasicKind::Invalid)) => true,
            _ => false,
        }
    }

    /// 元组元素
    pub fn tuple_vars(
        &self,
        id: TypeId,
    ) -> &[Var] {
        match self.get(id) {
            TypeData::Tuple(vars) => vars,
            _ => &[],
        }
    }

    /// 类型数量
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// 可读的类型字符串
    pub fn display(
        &self,
        id: TypeId,
    ) -> TypeDisplay<'_> {
        TypeDisplay { store: self, id }
    }
}

/// [`TypeStore::display`] 的返回值
pub struct TypeDisplay<'a> {
    store: &'a TypeStore,
    id: TypeId,
}

impl TypeDisplay<'_> {
    fn sub(
        &self,
        id: TypeId,
    ) -> Self {
        TypeDisplay {
            store: self.store,
            id,
        }
    }

    fn list(
        &self,
        f: &mut fmt::Formatter<'_>,
        vars: &[Var],
    ) -> fmt::Result {
        for (i, v) in vars.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if !v.name.is_empty() {
                write!(f, "{} ", v.name)?;
            }
            write!(f, "{}", self.sub(v.typ))?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.store.get(self.id) {
            TypeData::Basic(kind) => write!(f, "{}", kind.name()),
            TypeData::Array { len, elem } => write!(f, "[{}]{}", len, self.sub(*elem)),
            TypeData::Slice(elem) => write!(f, "[]{}", self.sub(*elem)),
            TypeData::Pointer(elem) => write!(f, "*{}", self.sub(*elem)),
            TypeData::Map { key, value } => {
                write!(f, "map[{}]{}", self.sub(*key), self.sub(*value))
            }
            TypeData::Chan { dir, elem } => match dir {
                ChanDir::Both => write!(f, "chan {}", self.sub(*elem)),
                ChanDir::Send => write!(f, "chan<- {}", self.sub(*elem)),
                ChanDir::Recv => write!(f, "<-chan {}", self.sub(*elem)),
            },
            TypeData::Struct { fields, tags } => {
                write!(f, "struct{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    if !field.embedded {
                        write!(f, "{} ", field.name)?;
                    }
                    write!(f, "{}", self.sub(field.typ))?;
                    if let Some(tag) = tags.as_ref().and_then(|t| t.get(i)) {
                        if !tag.is_empty() {
                            write!(f, " {:?}", tag)?;
                        }
                    }
                }
                write!(f, "}}")
            }
            TypeData::Tuple(vars) => {
                write!(f, "(")?;
                self.list(f, vars)?;
                write!(f, ")")
            }
            TypeData::Signature(sig) => {
                write!(f, "func(")?;
                self.list(f, self.store.tuple_vars(sig.params))?;
                write!(f, ")")?;
                let results = self.store.tuple_vars(sig.results);
                match results.len() {
                    0 => Ok(()),
                    1 if results[0].name.is_empty() => write!(f, " {}", self.sub(results[0].typ)),
                    _ => {
                        write!(f, " (")?;
                        self.list(f, results)?;
                        write!(f, ")")
                    }
                }
            }
            TypeData::Interface(iface) => {
                write!(f, "interface{{")?;
                let mut first = true;
                for m in &iface.methods {
                    if !first {
                        write!(f, "; ")?;
                    }
                    first = false;
                    let func = self.store.func(*m);
                    write!(f, "{}", func.name)?;
                    let sig = self.sub(func.typ).to_string();
                    write!(f, "{}", sig.strip_prefix("func").unwrap_or(&sig))?;
                }
                for e in &iface.embeddeds {
                    if !first {
                        write!(f, "; ")?;
                    }
                    first = false;
                    write!(f, "{}", self.sub(*e))?;
                }
                write!(f, "}}")
            }
            TypeData::Named(named) => {
                if let NamedObj::External { path } = &named.obj {
                    let pkg = path.rsplit('/').next().unwrap_or(path);
                    write!(f, "{}.", pkg)?;
                }
                write!(f, "{}", named.name)?;
                if !named.targs.is_empty() && named.origin.is_none() {
                    write!(f, "[")?;
                    for (i, t) in named.targs.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", self.sub(*t))?;
                    }
                    write!(f, "]")?;
                }
                Ok(())
            }
            TypeData::TypeParam(tp) => write!(f, "{}", tp.name),
        }
    }
}
