//! 实例化记录与命名
//!
//! 每个泛型实体一张有序的记录表，按请求顺序追加，
//! 查找时逐条用语义相等比较类型实参列表。

use smallvec::SmallVec;

use crate::frontend::ast::DeclId;
use crate::frontend::typecheck::identical::identical_list;
use crate::frontend::typecheck::types::{BasicKind, NamedObj, TypeData, TypeId, TypeStore};

/// 类型实参列表
pub type TypeArgs = SmallVec<[TypeId; 4]>;

/// 函数实例化记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instantiation {
    /// 类型实参
    pub types: TypeArgs,
    /// 生成的声明
    pub decl: DeclId,
    pub name: String,
}

/// 类型实例化记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInstantiation {
    pub types: TypeArgs,
    pub decl: DeclId,
    pub name: String,
    /// 生成的名义类型
    pub typ: TypeId,
}

/// 正在生成的类型实例（用于自引用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlight {
    /// 泛型声明
    pub base: DeclId,
    pub types: TypeArgs,
    pub typ: TypeId,
    pub name: String,
}

/// 代入缓存条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstRecord {
    pub params: Vec<TypeId>,
    pub args: TypeArgs,
    pub result: TypeId,
}

/// 在记录表中查找实参语义相同的一条
pub fn find_instance<'r, R>(
    store: &TypeStore,
    records: &'r [R],
    types: &[TypeId],
    key: impl Fn(&R) -> &[TypeId],
) -> Option<&'r R> {
    records
        .iter()
        .find(|r| identical_list(store, key(r), types))
}

/// 生成的声明名：`{base}{sep}{arg}{sep}{arg}...`
pub fn mangle_name(
    store: &TypeStore,
    base: &str,
    args: &[TypeId],
    sep: &str,
) -> String {
    let mut name = base.to_string();
    for &arg in args {
        name.push_str(sep);
        name.push_str(&mangle_type(store, arg));
    }
    name
}

/// 类型在名字中的拼写，只含字母、数字和下划线
fn mangle_type(
    store: &TypeStore,
    t: TypeId,
) -> String {
    match store.get(t) {
        TypeData::Basic(BasicKind::UnsafePointer) => "unsafe_Pointer".to_string(),
        TypeData::Basic(kind) => kind.name().replace(' ', "_"),
        TypeData::Named(named) => match &named.obj {
            NamedObj::External { path } => {
                let pkg = path.rsplit('/').next().unwrap_or(path);
                format!("{}_{}", sanitize(pkg), named.name)
            }
            _ if named.origin.is_none() && !named.targs.is_empty() => {
                mangle_name(store, &named.name, &named.targs, "_")
            }
            _ => named.name.clone(),
        },
        TypeData::Pointer(elem) => format!("ptr_{}", mangle_type(store, *elem)),
        TypeData::Slice(elem) => format!("slice_{}", mangle_type(store, *elem)),
        TypeData::Array { len, elem } => format!("arr{}_{}", len, mangle_type(store, *elem)),
        TypeData::Map { key, value } => format!(
            "map_{}_{}",
            mangle_type(store, *key),
            mangle_type(store, *value)
        ),
        TypeData::Chan { elem, .. } => format!("chan_{}", mangle_type(store, *elem)),
        TypeData::Struct { .. } => "struct".to_string(),
        TypeData::Signature(_) => "func".to_string(),
        TypeData::Interface(_) => "iface".to_string(),
        TypeData::Tuple(_) => "tuple".to_string(),
        TypeData::TypeParam(tp) => tp.name.clone(),
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}
