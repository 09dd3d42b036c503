//! 泛型声明解析测试

use super::{checked, count, registry, PKG};
use crate::frontend::ast::build::FileBuilder;
use crate::frontend::ast::DeclKind;
use crate::frontend::typecheck::info::TypeInfo;
use crate::frontend::typecheck::types::{BasicKind, TypeData};

#[test]
fn test_generic_type_without_instantiation() {
    let mut b = FileBuilder::new(PKG);
    let t = b.ident("T");
    let items = b.slice(t);
    let tp = b.tparams(&["T"], None);
    b.generic_type("List", vec![tp], items);
    let l = b.ident("List");
    let v = b.var_decl("v", Some(l), None);

    let registry = registry();
    let s = checked(b.finish(), TypeInfo::new(), &registry);
    assert_eq!(count(&s, "E4106"), 1);
    assert!(s.store().is_invalid(s.decl_type(v).unwrap()));
}

#[test]
fn test_type_argument_count() {
    let mut b = FileBuilder::new(PKG);
    let t = b.ident("T");
    let items = b.slice(t);
    let tp = b.tparams(&["T"], None);
    b.generic_type("List", vec![tp], items);
    let a1 = b.ident("int");
    let a2 = b.ident("string");
    let inst = b.inst("List", vec![a1, a2]);
    b.var_decl("v", Some(inst), None);

    let registry = registry();
    let s = checked(b.finish(), TypeInfo::new(), &registry);
    assert_eq!(count(&s, "E4107"), 1);
}

#[test]
fn test_generic_alias_reported() {
    let mut b = FileBuilder::new(PKG);
    let int = b.ident("int");
    let a = b.alias("A", int);
    let group = b.tparams(&["T"], None);
    let mut file = b.finish();
    if let DeclKind::Type { tparams, .. } = &mut file.decl_mut(a).kind {
        *tparams = vec![group];
    }

    let registry = registry();
    let s = checked(file, TypeInfo::new(), &registry);
    assert_eq!(count(&s, "E4108"), 1);
    // 类型参数被忽略，别名仍指向目标类型
    assert_eq!(s.decl_type(a), Some(s.store().basic(BasicKind::Int)));
}

#[test]
fn test_instance_underlying_is_substituted() {
    // type Pair[K, V any] struct { k K; v V }; var p Pair[string, int]
    let mut b = FileBuilder::new(PKG);
    let k = b.ident("K");
    let v = b.ident("V");
    let fk = b.field("k", k);
    let fv = b.field("v", v);
    let st = b.struct_type(vec![fk, fv]);
    let tp = b.tparams(&["K", "V"], None);
    b.generic_type("Pair", vec![tp], st);
    let a1 = b.ident("string");
    let a2 = b.ident("int");
    let inst = b.inst("Pair", vec![a1, a2]);
    let p = b.var_decl("p", Some(inst), None);

    let registry = registry();
    let mut s = checked(b.finish(), TypeInfo::new(), &registry);
    assert!(s.diagnostics().is_empty());
    let retag = s.decl_type(p).unwrap();
    let under = s.under(retag).unwrap();
    let TypeData::Struct { fields, .. } = s.store().get(under) else {
        panic!("expected struct");
    };
    assert_eq!(fields[0].typ, s.store().basic(BasicKind::String));
    assert_eq!(fields[1].typ, s.store().basic(BasicKind::Int));
}

#[test]
fn test_receiver_binds_type_parameters() {
    // type Map[K, V any] struct{}; func (m Map[_, E]) Get() E
    let mut b = FileBuilder::new(PKG);
    let st = b.struct_type(Vec::new());
    let tp = b.tparams(&["K", "V"], None);
    let map = b.generic_type("Map", vec![tp], st);
    let blank = b.ident("_");
    let e = b.ident("E");
    let recv_t = b.inst("Map", vec![blank, e]);
    let recv = b.field("m", recv_t);
    let et = b.ident("E");
    let r = b.anon(et);
    let sig = b.sig(Vec::new(), vec![r]);
    let get = b.method(recv, "Get", sig, None);

    let registry = registry();
    let s = checked(b.finish(), TypeInfo::new(), &registry);
    assert!(s.diagnostics().is_empty());
    assert!(s.type_param(get, "_").is_none());
    let bound_e = s.type_param(get, "E").unwrap();
    assert_eq!(s.type_param(map, "V"), Some(bound_e));

    let base = s.decl_type(map).unwrap();
    let func = s.method_func(base, "Get").unwrap();
    assert_eq!(s.store().func(func).decl, Some(get));
}

#[test]
fn test_local_type_scope_ends_with_block() {
    // func F() { { type t int; var a t }; var b t }
    let mut b = FileBuilder::new(PKG);
    let int = b.ident("int");
    let local = b.local_type("t", int);
    let inside = b.ident("t");
    let a = b.local_var("a", Some(inside), None);
    let inner = b.block(vec![local, a]);
    let outside = b.ident("t");
    let v = b.local_var("b", Some(outside), None);
    let body = b.block(vec![inner, v]);
    let sig = b.sig(Vec::new(), Vec::new());
    b.func("F", sig, Some(body));

    let registry = registry();
    let s = checked(b.finish(), TypeInfo::new(), &registry);
    assert_eq!(count(&s, "E2104"), 1);
    assert!(s.store().named(s.info().type_of(inside).unwrap()).is_some());
    assert!(s.store().is_invalid(s.info().type_of(outside).unwrap()));
}
