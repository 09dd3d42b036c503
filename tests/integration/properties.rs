//! 类型代入的性质测试

use monolower::frontend::ast::build::FileBuilder;
use monolower::frontend::module::{ModuleInfo, ModuleRegistry, ModuleSource};
use monolower::frontend::typecheck::identical;
use monolower::frontend::typecheck::types::{BasicKind, TypeData, TypeId, TypeStore, Var};
use monolower::{LowerConfig, Session, TypeInfo};
use proptest::prelude::*;

const PKG: &str = "example.com/p";

/// 随机类型形状；`Param` 是泛型函数的类型参数
#[derive(Debug, Clone)]
enum Shape {
    Basic(usize),
    Param,
    Pointer(Box<Shape>),
    Slice(Box<Shape>),
    Array(i64, Box<Shape>),
    Map(Box<Shape>, Box<Shape>),
    Struct(Vec<Shape>),
}

impl Shape {
    fn has_param(&self) -> bool {
        match self {
            Shape::Basic(_) => false,
            Shape::Param => true,
            Shape::Pointer(s) | Shape::Slice(s) | Shape::Array(_, s) => s.has_param(),
            Shape::Map(k, v) => k.has_param() || v.has_param(),
            Shape::Struct(fields) => fields.iter().any(Shape::has_param),
        }
    }
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    // 跳过 invalid 和 unsafe.Pointer
    let leaf = prop_oneof![
        (1usize..18).prop_map(Shape::Basic),
        Just(Shape::Param),
    ];
    leaf.prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|s| Shape::Pointer(Box::new(s))),
            inner.clone().prop_map(|s| Shape::Slice(Box::new(s))),
            (0i64..16, inner.clone()).prop_map(|(n, s)| Shape::Array(n, Box::new(s))),
            (inner.clone(), inner.clone()).prop_map(|(k, v)| Shape::Map(Box::new(k), Box::new(v))),
            prop::collection::vec(inner, 1..4).prop_map(Shape::Struct),
        ]
    })
}

/// 在 arena 中构造形状，`Param` 落到 `param`
fn build(
    store: &mut TypeStore,
    shape: &Shape,
    param: TypeId,
) -> TypeId {
    match shape {
        Shape::Basic(i) => store.basic(BasicKind::ALL[*i]),
        Shape::Param => param,
        Shape::Pointer(s) => {
            let e = build(store, s, param);
            store.pointer(e)
        }
        Shape::Slice(s) => {
            let e = build(store, s, param);
            store.slice(e)
        }
        Shape::Array(len, s) => {
            let elem = build(store, s, param);
            store.alloc(TypeData::Array { len: *len, elem })
        }
        Shape::Map(k, v) => {
            let key = build(store, k, param);
            let value = build(store, v, param);
            store.alloc(TypeData::Map { key, value })
        }
        Shape::Struct(fields) => {
            let vars = fields
                .iter()
                .enumerate()
                .map(|(i, f)| Var::new(format!("f{i}"), build(store, f, param)))
                .collect::<Vec<_>>();
            let tags = vec![String::new(); vars.len()];
            store.structure(vars, tags)
        }
    }
}

fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register(ModuleInfo::new(PKG, ModuleSource::Batch));
    registry
}

/// 检查 `func Id[T any]()`，返回会话和 `T`
fn session(registry: &ModuleRegistry) -> (Session<'_>, TypeId) {
    let mut b = FileBuilder::new(PKG);
    let tp = b.tparams(&["T"], None);
    let sig = b.sig(Vec::new(), Vec::new());
    let id = b.generic_func("Id", vec![tp], sig, None);
    let mut s = Session::new(
        b.finish(),
        TypeStore::new(),
        TypeInfo::new(),
        registry,
        LowerConfig::default(),
    );
    s.check().unwrap();
    let t = s.type_param(id, "T").unwrap();
    (s, t)
}

proptest! {
    #[test]
    fn prop_substituting_params_for_themselves_is_identity(shape in shape_strategy()) {
        let registry = registry();
        let (mut s, t) = session(&registry);
        let typ = build(s.store_mut(), &shape, t);
        prop_assert_eq!(s.substitute(&[t], &[t], typ).unwrap(), typ);
    }

    #[test]
    fn prop_shapes_without_params_are_unchanged(shape in shape_strategy()) {
        prop_assume!(!shape.has_param());
        let registry = registry();
        let (mut s, t) = session(&registry);
        let int = s.store().basic(BasicKind::Int);
        let typ = build(s.store_mut(), &shape, t);
        let before = s.store().len();
        prop_assert_eq!(s.substitute(&[t], &[int], typ).unwrap(), typ);
        prop_assert_eq!(s.store().len(), before);
    }

    #[test]
    fn prop_substitution_matches_direct_construction(shape in shape_strategy()) {
        let registry = registry();
        let (mut s, t) = session(&registry);
        let int = s.store().basic(BasicKind::Int);
        let generic = build(s.store_mut(), &shape, t);
        let expected = build(s.store_mut(), &shape, int);
        let result = s.substitute(&[t], &[int], generic).unwrap();
        prop_assert!(identical(s.store(), result, expected));
        prop_assert_eq!(result == generic, !shape.has_param());
    }
}
