//! 端到端降级测试
//!
//! 只使用公开接口：构造语法树、注册模块、调用 `lower`，检查输出声明和诊断。

use std::fs;

use monolower::frontend::ast::build::FileBuilder;
use monolower::frontend::ast::{DeclKind, Expr};
use monolower::frontend::module::{ModuleInfo, ModuleRegistry, ModuleSource};
use monolower::frontend::typecheck::types::{BasicKind, TypeData};
use monolower::util::config::{load_config, load_project_config, CONFIG_FILE_NAME};
use monolower::util::diagnostic::{JsonEmitter, TextEmitter};
use monolower::util::logger::{self, LogLevel};
use monolower::{lower, LowerConfig, Session, TypeInfo, TypeStore};
use tempfile::TempDir;

const PKG: &str = "example.com/shapes";

fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register(ModuleInfo::new(PKG, ModuleSource::Batch));
    registry
}

/// `type Stack[T any] struct { items []T; top *Stack[T] }`
fn stack_program(b: &mut FileBuilder) {
    let t = b.ident("T");
    let items = b.slice(t);
    let f_items = b.field("items", items);
    let t2 = b.ident("T");
    let inst = b.inst("Stack", vec![t2]);
    let ptr = b.ptr(inst);
    let f_top = b.field("top", ptr);
    let st = b.struct_type(vec![f_items, f_top]);
    let tp = b.tparams(&["T"], None);
    b.generic_type("Stack", vec![tp], st);
}

#[test]
fn test_lower_generic_program() {
    logger::try_init_with_level(LogLevel::Debug);

    let mut b = FileBuilder::new(PKG);
    stack_program(&mut b);
    let int_arg = b.ident("int");
    let ints = b.inst("Stack", vec![int_arg]);
    b.var_decl("ints", Some(ints), None);
    let str_arg = b.ident("string");
    let strs = b.inst("Stack", vec![str_arg]);
    b.var_decl("strs", Some(strs), None);
    let again = b.ident("int");
    let more = b.inst("Stack", vec![again]);
    b.var_decl("more", Some(more), None);

    let registry = registry();
    let lowered = lower(
        b.finish(),
        TypeStore::new(),
        TypeInfo::new(),
        &registry,
        LowerConfig::default(),
    )
    .unwrap();

    // 两种实参两个实例，重复的实参共用一个
    assert_eq!(
        lowered.decl_names(),
        vec!["ints", "strs", "more", "Stack_int", "Stack_string"]
    );
    assert!(lowered.diagnostics.is_empty());
    assert!(lowered.imports.is_empty());
    assert!(lowered.file.is_ident(ints, "Stack_int"));
    assert!(lowered.file.is_ident(more, "Stack_int"));
    assert!(lowered.file.is_ident(strs, "Stack_string"));

    // 实例只生成一次，字段 `top` 指回实例自身
    let stack_int = lowered.info.type_of(ints).unwrap();
    let named = lowered.store.named(stack_int).unwrap();
    let int = lowered.store.basic(BasicKind::Int);
    assert_eq!(named.name, "Stack_int");
    assert!(named.origin.is_some());
    assert!(named.tparams.is_empty());
    // 实参保留下来，同一实例的恒等比较靠它
    assert_eq!(named.targs, vec![int]);
    let TypeData::Struct { fields, .. } = lowered.store.get(named.underlying.unwrap()) else {
        panic!("expected struct");
    };
    assert_eq!(lowered.store.get(fields[0].typ), &TypeData::Slice(int));
    assert_eq!(lowered.store.get(fields[1].typ), &TypeData::Pointer(stack_int));
}

#[test]
fn test_lower_keeps_going_after_cycle_diagnostics() {
    // type A struct { b B }; type B struct { a A }; type P = Q; type Q = P
    let mut b = FileBuilder::new(PKG);
    let bt = b.ident("B");
    let fb = b.field("b", bt);
    let sa = b.struct_type(vec![fb]);
    b.type_decl("A", sa);
    let at = b.ident("A");
    let fa = b.field("a", at);
    let sb = b.struct_type(vec![fa]);
    b.type_decl("B", sb);
    let q = b.ident("Q");
    b.alias("P", q);
    let p = b.ident("P");
    b.alias("Q", p);

    let registry = registry();
    let lowered = lower(
        b.finish(),
        TypeStore::new(),
        TypeInfo::new(),
        &registry,
        LowerConfig::default(),
    )
    .unwrap();
    assert_eq!(lowered.decl_names(), vec!["A", "B", "P", "Q"]);

    let codes: Vec<&str> = lowered.diagnostics.iter().map(|d| d.code.as_str()).collect();
    // 别名循环在检查时报告，无限展开在延后的完整性检查中报告
    assert_eq!(codes, vec!["E2101", "E2102"]);

    let text = TextEmitter::new().render_all(&lowered.diagnostics, None);
    assert!(text.contains("E2102"), "{text}");
    assert!(text.contains("E2101"), "{text}");

    let json: serde_json::Value =
        serde_json::from_str(&JsonEmitter::render_all(&lowered.diagnostics)).unwrap();
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["code"], "E2101");
    assert_eq!(items[1]["code"], "E2102");
    assert_eq!(items[1]["relatedInformation"].as_array().unwrap().len(), 2);
}

#[test]
fn test_lower_with_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"
add_importable_name = true
importable_name = "Marker"
name_separator = "__"
log_level = "trace"
"#,
    )
    .unwrap();
    let config = load_project_config(dir.path()).unwrap();
    assert_eq!(config.log_level, LogLevel::Trace);
    logger::init_from_config(&config);
    assert!(config.discard_imports);

    let mut b = FileBuilder::new(PKG);
    b.import("example.com/geo");
    stack_program(&mut b);
    let arg = b.ident("bool");
    let typ = b.inst("Stack", vec![arg]);
    b.var_decl("flags", Some(typ), None);

    let mut registry = registry();
    registry.register(ModuleInfo::new("example.com/geo", ModuleSource::Batch));

    let lowered = lower(b.finish(), TypeStore::new(), TypeInfo::new(), &registry, config).unwrap();
    assert_eq!(
        lowered.decl_names(),
        vec!["flags", "Stack__bool", "Marker", "_"]
    );
    assert_eq!(lowered.imports.len(), 1);
    assert_eq!(lowered.imports[0].path, "example.com/geo");

    // type _ = geo.Marker
    let discard = lowered.find_decl("_").unwrap();
    let DeclKind::Type {
        alias: true,
        typ: value,
        ..
    } = &lowered.file.decl(discard).kind
    else {
        panic!("expected alias discard");
    };
    let Expr::Selector { x, sel } = lowered.file.expr(*value) else {
        panic!("expected selector");
    };
    assert!(lowered.file.is_ident(*x, "geo"));
    assert_eq!(sel, "Marker");
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = load_config(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, LowerConfig::default());
}

#[test]
fn test_invalid_config_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "importable_name = \"1bad\"\n").unwrap();
    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().contains("importable_name"), "{err}");
}

#[test]
fn test_session_instantiate_and_translate() {
    let mut b = FileBuilder::new(PKG);
    stack_program(&mut b);
    let stack = b.file().decls[0];
    let registry = registry();
    let mut session = Session::new(
        b.finish(),
        TypeStore::new(),
        TypeInfo::new(),
        &registry,
        LowerConfig::default(),
    );
    session.check().unwrap();

    let float = session.store().basic(BasicKind::Float64);
    assert_eq!(session.instantiate(stack, &[float]).unwrap(), "Stack_float64");
    assert_eq!(session.instantiate(stack, &[float]).unwrap(), "Stack_float64");
    assert_eq!(session.mono_state().type_instance_count(), 1);

    // 手动实例化的声明同样输出
    let lowered = session.translate().unwrap();
    assert_eq!(lowered.decl_names(), vec!["Stack_float64"]);
}
