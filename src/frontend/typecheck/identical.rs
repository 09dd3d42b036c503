//! 类型的语义相等
//!
//! 名义类型按声明身份和类型实参比较：重新打标签的 `List[int]` 与生成的
//! 实例 `List_int` 身份相同（后者的 `origin` 指回 `List`）。结构类型逐项比较，
//! 字段名、嵌入标记和标签都参与比较；参数名不参与。
//! 递归只会穿过名义类型，而名义类型不展开，所以比较一定终止。

use super::types::{NamedObj, NamedType, TypeData, TypeId, TypeStore, Var};

/// `a` 与 `b` 是否表示同一个类型
pub fn identical(
    store: &TypeStore,
    a: TypeId,
    b: TypeId,
) -> bool {
    if a == b {
        return true;
    }
    match (store.get(a), store.get(b)) {
        (TypeData::Basic(x), TypeData::Basic(y)) => x == y,
        (TypeData::Array { len: l1, elem: e1 }, TypeData::Array { len: l2, elem: e2 }) => {
            l1 == l2 && identical(store, *e1, *e2)
        }
        (TypeData::Slice(x), TypeData::Slice(y)) | (TypeData::Pointer(x), TypeData::Pointer(y)) => {
            identical(store, *x, *y)
        }
        (TypeData::Map { key: k1, value: v1 }, TypeData::Map { key: k2, value: v2 }) => {
            identical(store, *k1, *k2) && identical(store, *v1, *v2)
        }
        (TypeData::Chan { dir: d1, elem: e1 }, TypeData::Chan { dir: d2, elem: e2 }) => {
            d1 == d2 && identical(store, *e1, *e2)
        }
        (
            TypeData::Struct {
                fields: f1,
                tags: t1,
            },
            TypeData::Struct {
                fields: f2,
                tags: t2,
            },
        ) => {
            f1.len() == f2.len()
                && f1.iter().zip(f2).enumerate().all(|(i, (x, y))| {
                    x.name == y.name
                        && x.embedded == y.embedded
                        && tag_at(t1, i) == tag_at(t2, i)
                        && identical(store, x.typ, y.typ)
                })
        }
        (TypeData::Tuple(x), TypeData::Tuple(y)) => identical_vars(store, x, y),
        (TypeData::Signature(s1), TypeData::Signature(s2)) => {
            s1.variadic == s2.variadic
                && s1.tparams.len() == s2.tparams.len()
                && identical(store, s1.params, s2.params)
                && identical(store, s1.results, s2.results)
        }
        (TypeData::Interface(i1), TypeData::Interface(i2)) => {
            if i1.methods.len() != i2.methods.len() || i1.embeddeds.len() != i2.embeddeds.len() {
                return false;
            }
            let mut m1: Vec<_> = i1.methods.iter().map(|m| store.func(*m)).collect();
            let mut m2: Vec<_> = i2.methods.iter().map(|m| store.func(*m)).collect();
            m1.sort_by(|x, y| x.name.cmp(&y.name));
            m2.sort_by(|x, y| x.name.cmp(&y.name));
            m1.iter()
                .zip(&m2)
                .all(|(x, y)| x.name == y.name && identical(store, x.typ, y.typ))
                && identical_list(store, &i1.embeddeds, &i2.embeddeds)
        }
        (TypeData::Named(n1), TypeData::Named(n2)) => identical_named(store, n1, n2),
        // 类型参数只与自己相同
        _ => false,
    }
}

/// 两个类型列表逐项相同
pub fn identical_list(
    store: &TypeStore,
    a: &[TypeId],
    b: &[TypeId],
) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| identical(store, *x, *y))
}

fn identical_vars(
    store: &TypeStore,
    a: &[Var],
    b: &[Var],
) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| identical(store, x.typ, y.typ))
}

fn identical_named(
    store: &TypeStore,
    a: &NamedType,
    b: &NamedType,
) -> bool {
    let same_decl = match (a.base_decl(), b.base_decl()) {
        (Some(x), Some(y)) => x == y,
        (None, None) => match (&a.obj, &b.obj) {
            (NamedObj::External { path: p1 }, NamedObj::External { path: p2 }) => {
                p1 == p2 && a.name == b.name
            }
            (NamedObj::Universe, NamedObj::Universe) => a.name == b.name,
            _ => false,
        },
        _ => false,
    };
    same_decl && identical_list(store, &a.targs, &b.targs)
}

fn tag_at(
    tags: &Option<Vec<String>>,
    i: usize,
) -> &str {
    tags.as_ref()
        .and_then(|t| t.get(i))
        .map(String::as_str)
        .unwrap_or("")
}
