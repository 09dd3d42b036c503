//! 函数单态化测试

use super::{first_stmt, max_func, own_registry, plain_config, PKG};
use crate::frontend::ast::build::FileBuilder;
use crate::frontend::ast::{DeclKind, Expr, Stmt};
use crate::frontend::typecheck::errors::LowerError;
use crate::frontend::typecheck::info::TypeInfo;
use crate::frontend::typecheck::types::{BasicKind, TypeStore, Var};
use crate::session::{lower, Session};
use crate::util::config::LowerConfig;

/// 测试：相同推断实参的两次调用共用一个实例
#[test]
fn test_inferred_calls_share_one_instance() {
    let mut b = FileBuilder::new(PKG);
    max_func(&mut b);
    let f1 = b.ident("Max");
    let one = b.int(1);
    let two = b.int(2);
    let c1 = b.call(f1, vec![one, two]);
    b.var_decl("x", None, Some(c1));
    let f2 = b.ident("Max");
    let three = b.int(3);
    let four = b.int(4);
    let c2 = b.call(f2, vec![three, four]);
    b.var_decl("y", None, Some(c2));
    let file = b.finish();

    let store = TypeStore::new();
    let int = store.basic(BasicKind::Int);
    let mut info = TypeInfo::new();
    for c in [c1, c2] {
        info.record_type(c, int);
        info.record_inferred(c, vec![int]);
    }

    let registry = own_registry();
    let lowered = lower(file, store, info, &registry, plain_config()).unwrap();

    // 泛型声明不出现在输出里，实例排在引用它的声明之后
    assert_eq!(lowered.decl_names(), vec!["x", "y", "Max_int"]);
    assert!(lowered.file.is_ident(f1, "Max_int"));
    assert!(lowered.file.is_ident(f2, "Max_int"));
    assert!(lowered.diagnostics.is_empty());
}

/// 测试：实例化幂等，语义相同的实参命中同一条记录
#[test]
fn test_instantiate_is_idempotent() {
    let mut b = FileBuilder::new(PKG);
    let (max, _) = max_func(&mut b);
    let file = b.finish();
    let registry = own_registry();
    let mut s = Session::new(file, TypeStore::new(), TypeInfo::new(), &registry, plain_config());
    s.check().unwrap();

    let int = s.store().basic(BasicKind::Int);
    let first = s.instantiate(max, &[int]).unwrap();
    let again = s.instantiate(max, &[int]).unwrap();
    assert_eq!(first, "Max_int");
    assert_eq!(first, again);

    // 两个分别分配的 []int
    let a = s.store_mut().slice(int);
    let c = s.store_mut().slice(int);
    let sa = s.instantiate(max, &[a]).unwrap();
    let sc = s.instantiate(max, &[c]).unwrap();
    assert_eq!(sa, "Max_slice_int");
    assert_eq!(sa, sc);
    assert_eq!(s.mono_state().func_instance_count(), 2);
}

/// 测试：不同实参生成不同实例
#[test]
fn test_distinct_args_distinct_instances() {
    let mut b = FileBuilder::new(PKG);
    max_func(&mut b);
    let one = b.int(1);
    let c1 = b.call_named("Max", vec![one]);
    b.var_decl("x", None, Some(c1));
    let s = b.string("s");
    let c2 = b.call_named("Max", vec![s]);
    b.var_decl("y", None, Some(c2));
    let file = b.finish();

    let store = TypeStore::new();
    let int = store.basic(BasicKind::Int);
    let string = store.basic(BasicKind::String);
    let mut info = TypeInfo::new();
    info.record_type(c1, int);
    info.record_inferred(c1, vec![int]);
    info.record_type(c2, string);
    info.record_inferred(c2, vec![string]);

    let registry = own_registry();
    let lowered = lower(file, store, info, &registry, plain_config()).unwrap();
    assert_eq!(lowered.decl_names(), vec!["x", "y", "Max_int", "Max_string"]);
}

/// 测试：显式实例化与推断调用共用记录
#[test]
fn test_explicit_and_inferred_share_record() {
    let mut b = FileBuilder::new(PKG);
    max_func(&mut b);
    let int_expr = b.ident("int");
    let explicit = b.inst("Max", vec![int_expr]);
    b.var_decl("f", None, Some(explicit));
    let one = b.int(1);
    let fun = b.ident("Max");
    let call = b.call(fun, vec![one, one]);
    b.var_decl("x", None, Some(call));
    let file = b.finish();

    let mut store = TypeStore::new();
    let int = store.basic(BasicKind::Int);
    let sig = store.signature(
        vec![Var::new("a", int), Var::new("b", int)],
        vec![Var::new("", int)],
        false,
    );
    let mut info = TypeInfo::new();
    info.record_type(explicit, sig);
    info.record_type(call, int);
    info.record_inferred(call, vec![int]);

    let registry = own_registry();
    let lowered = lower(file, store, info, &registry, plain_config()).unwrap();
    assert_eq!(lowered.decl_names(), vec!["f", "x", "Max_int"]);
    assert!(lowered.file.is_ident(explicit, "Max_int"));
    assert!(lowered.file.is_ident(fun, "Max_int"));
}

/// 测试：复制的函数体带上代入后的类型
#[test]
fn test_copied_body_records_substituted_types() {
    let mut b = FileBuilder::new(PKG);
    let (max, a) = max_func(&mut b);
    let one = b.int(1);
    let call = b.call_named("Max", vec![one, one]);
    b.var_decl("x", None, Some(call));
    let file = b.finish();

    let store = TypeStore::new();
    let int = store.basic(BasicKind::Int);
    let mut info = TypeInfo::new();
    info.record_type(call, int);
    info.record_inferred(call, vec![int]);

    let registry = own_registry();
    let mut s = Session::new(file, store, info, &registry, plain_config());
    s.check().unwrap();
    // 函数体里 `a` 的类型是类型参数，只能在解析后补记
    let t = s.type_param(max, "T").unwrap();
    s.info_mut().record_type(a, t);
    let lowered = s.translate().unwrap();

    let inst = lowered.find_decl("Max_int").unwrap();
    let Stmt::Return(results) = first_stmt(&lowered, inst) else {
        panic!("expected return");
    };
    assert_ne!(results[0], a);
    assert_eq!(lowered.info.type_of(results[0]), Some(int));
    assert_eq!(lowered.info.type_of(a), Some(t));

    let DeclKind::Func { sig, tparams, .. } = &lowered.file.decl(inst).kind else {
        panic!("expected func");
    };
    assert!(tparams.is_empty());
    assert!(lowered.file.is_ident(sig.params[0].typ, "int"));
    assert!(lowered.file.is_ident(sig.results[0].typ, "int"));
}

/// 测试：泛型函数体内调用另一个泛型函数
#[test]
fn test_nested_generic_call() {
    let mut b = FileBuilder::new(PKG);
    max_func(&mut b);

    // func Twice[U any](v U) U { return Max(v, v) }
    let tp = b.tparams(&["U"], None);
    let ut = b.ident("U");
    let vf = b.field("v", ut);
    let ur = b.ident("U");
    let r = b.anon(ur);
    let sig = b.sig(vec![vf], vec![r]);
    let v1 = b.ident("v");
    let v2 = b.ident("v");
    let inner = b.call_named("Max", vec![v1, v2]);
    let ret = b.ret(vec![inner]);
    let body = b.block(vec![ret]);
    let twice = b.generic_func("Twice", vec![tp], sig, Some(body));

    let one = b.int(1);
    let outer = b.call_named("Twice", vec![one]);
    b.var_decl("z", None, Some(outer));
    let file = b.finish();

    let store = TypeStore::new();
    let int = store.basic(BasicKind::Int);
    let mut info = TypeInfo::new();
    info.record_type(outer, int);
    info.record_inferred(outer, vec![int]);

    let registry = own_registry();
    let mut s = Session::new(file, store, info, &registry, plain_config());
    s.check().unwrap();
    let u = s.type_param(twice, "U").unwrap();
    s.info_mut().record_type(inner, u);
    s.info_mut().record_inferred(inner, vec![u]);
    let lowered = s.translate().unwrap();

    assert_eq!(lowered.decl_names(), vec!["z", "Twice_int", "Max_int"]);
    let twice_int = lowered.find_decl("Twice_int").unwrap();
    let Stmt::Return(results) = first_stmt(&lowered, twice_int) else {
        panic!("expected return");
    };
    let Expr::Call { fun, .. } = lowered.file.expr(results[0]) else {
        panic!("expected call");
    };
    assert!(lowered.file.is_ident(*fun, "Max_int"));
}

/// 测试：缺少推断实参是致命错误
#[test]
fn test_missing_inferred_args_is_fatal() {
    let mut b = FileBuilder::new(PKG);
    max_func(&mut b);
    let one = b.int(1);
    let call = b.call_named("Max", vec![one, one]);
    b.var_decl("x", None, Some(call));
    let file = b.finish();

    let store = TypeStore::new();
    let int = store.basic(BasicKind::Int);
    let mut info = TypeInfo::new();
    info.record_type(call, int);

    let registry = own_registry();
    let err = lower(file, store, info, &registry, plain_config()).unwrap_err();
    assert!(matches!(err, LowerError::IncompleteResolution { .. }));
}

/// 测试：未实例化的泛型函数引用不支持
#[test]
fn test_bare_generic_reference_is_unsupported() {
    let mut b = FileBuilder::new(PKG);
    max_func(&mut b);
    let f = b.ident("Max");
    b.var_decl("f", None, Some(f));
    let file = b.finish();

    let store = TypeStore::new();
    let int = store.basic(BasicKind::Int);
    let mut info = TypeInfo::new();
    info.record_type(f, int);

    let registry = own_registry();
    let err = lower(file, store, info, &registry, plain_config()).unwrap_err();
    assert!(matches!(err, LowerError::UnsupportedConstruct { .. }));
}

/// 测试：遮蔽泛型函数名的参数不被改写
#[test]
fn test_shadowing_parameter_not_rewritten() {
    let mut b = FileBuilder::new(PKG);
    max_func(&mut b);

    // func Use(Max int) int { return Max }
    let it = b.ident("int");
    let p = b.field("Max", it);
    let rt = b.ident("int");
    let r = b.anon(rt);
    let sig = b.sig(vec![p], vec![r]);
    let m = b.ident("Max");
    let ret = b.ret(vec![m]);
    let body = b.block(vec![ret]);
    b.func("Use", sig, Some(body));
    let file = b.finish();

    let registry = own_registry();
    let lowered = lower(file, TypeStore::new(), TypeInfo::new(), &registry, plain_config()).unwrap();
    assert_eq!(lowered.decl_names(), vec!["Use"]);
    assert!(lowered.file.is_ident(m, "Max"));
}

/// 测试：生成名与已有声明冲突时追加序号
#[test]
fn test_generated_name_avoids_collision() {
    let mut b = FileBuilder::new(PKG);
    max_func(&mut b);
    let it = b.ident("int");
    b.var_decl("Max_int", Some(it), None);
    let one = b.int(1);
    let call = b.call_named("Max", vec![one, one]);
    b.var_decl("x", None, Some(call));
    let file = b.finish();

    let store = TypeStore::new();
    let int = store.basic(BasicKind::Int);
    let mut info = TypeInfo::new();
    info.record_type(call, int);
    info.record_inferred(call, vec![int]);

    let registry = own_registry();
    let lowered = lower(file, store, info, &registry, plain_config()).unwrap();
    assert_eq!(lowered.decl_names(), vec!["Max_int", "x", "Max_int_2"]);
}

/// 测试：生成名使用配置的分隔符
#[test]
fn test_name_separator_from_config() {
    let mut b = FileBuilder::new(PKG);
    let (max, _) = max_func(&mut b);
    let file = b.finish();
    let config = LowerConfig {
        name_separator: "__".to_string(),
        ..plain_config()
    };
    let registry = own_registry();
    let mut s = Session::new(file, TypeStore::new(), TypeInfo::new(), &registry, config);
    s.check().unwrap();
    let int = s.store().basic(BasicKind::Int);
    assert_eq!(s.instantiate(max, &[int]).unwrap(), "Max__int");
}
