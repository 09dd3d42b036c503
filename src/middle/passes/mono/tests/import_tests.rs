//! 导入整理测试

use super::{max_func, own_registry, plain_config, PKG};
use crate::frontend::ast::build::FileBuilder;
use crate::frontend::ast::{DeclKind, Expr, ExprId, File};
use crate::frontend::module::{Export, ExportKind, ModuleInfo, ModuleRegistry, ModuleSource};
use crate::frontend::typecheck::errors::LowerError;
use crate::frontend::typecheck::info::TypeInfo;
use crate::frontend::typecheck::types::{BasicKind, TypeStore};
use crate::session::{lower, LoweredFile, Session};
use crate::util::config::LowerConfig;

fn external(
    path: &str,
    imports: &[&str],
    exports: &[(&str, ExportKind)],
) -> ModuleInfo {
    let mut module = ModuleInfo::new(path, ModuleSource::External);
    for i in imports {
        module.add_import(*i);
    }
    for (name, kind) in exports {
        module.add_export(Export::new(*name, *kind));
    }
    module
}

fn import_paths(lowered: &LoweredFile) -> Vec<&str> {
    lowered.imports.iter().map(|s| s.path.as_str()).collect()
}

/// `_` 声明引用的 `pkg.Name`
fn discard_selector(
    file: &File,
    value: ExprId,
) -> (String, String) {
    let Expr::Selector { x, sel } = file.expr(value) else {
        panic!("expected selector");
    };
    let Expr::Ident(pkg) = file.expr(*x) else {
        panic!("expected package name");
    };
    (pkg.clone(), sel.clone())
}

/// 测试：导入取传递闭包，带名字的在前，其余排序
#[test]
fn test_imports_merged_and_sorted() {
    let mut b = FileBuilder::new(PKG);
    b.import_as("example.com/log", "l").import("strings").import("bytes");
    let file = b.finish();

    let mut registry = ModuleRegistry::new();
    let mut own = ModuleInfo::new(PKG, ModuleSource::Batch);
    own.add_import("strings").add_import("bytes").add_import("example.com/log");
    registry.register(own);
    registry.register(external("strings", &["unicode"], &[]));
    registry.register(external("bytes", &["io"], &[]));
    registry.register(external("example.com/log", &["fmt"], &[]));
    registry.register(external("unicode", &[], &[]));
    registry.register(external("io", &[], &[]));
    registry.register(external("fmt", &[], &[]));

    let lowered = lower(file, TypeStore::new(), TypeInfo::new(), &registry, plain_config()).unwrap();
    assert_eq!(
        import_paths(&lowered),
        vec!["example.com/log", "bytes", "example.com/log", "fmt", "io", "strings", "unicode"]
    );
    assert_eq!(lowered.imports[0].name.as_deref(), Some("l"));
    assert!(lowered.imports[1..].iter().all(|s| s.name.is_none()));
    assert_eq!(lowered.file.imports.len(), lowered.imports.len());
}

/// 测试：每个导入追加一个与导出种类相符的 `_` 声明
#[test]
fn test_discard_decls_follow_export_kind() {
    let mut b = FileBuilder::new(PKG);
    b.import("strings")
        .import("fmt")
        .import("math")
        .import("example.com/q")
        .import_as("os", "_");
    let int = b.ident("int");
    b.var_decl("x", Some(int), None);
    let file = b.finish();

    let mut registry = own_registry();
    registry.register(external(
        "strings",
        &[],
        &[("Contains", ExportKind::Func), ("Builder", ExportKind::Type)],
    ));
    registry.register(external("fmt", &[], &[("Println", ExportKind::Func)]));
    registry.register(external("math", &[], &[("Pi", ExportKind::Const)]));
    registry.register(external("os", &[], &[("Args", ExportKind::Var)]));
    registry.register(ModuleInfo::new("example.com/q", ModuleSource::Batch));

    let lowered = lower(file, TypeStore::new(), TypeInfo::new(), &registry, LowerConfig::default()).unwrap();
    assert_eq!(
        import_paths(&lowered),
        vec!["os", "example.com/q", "fmt", "math", "os", "strings"]
    );
    // 空白导入不需要引用
    assert_eq!(lowered.decl_names(), vec!["x", "_", "_", "_", "_", "_"]);

    let discards: Vec<(String, String, &'static str)> = lowered.decls[1..]
        .iter()
        .map(|d| match &lowered.file.decl(*d).kind {
            DeclKind::Type {
                alias: true, typ, ..
            } => {
                let (pkg, sel) = discard_selector(&lowered.file, *typ);
                (pkg, sel, "type")
            }
            DeclKind::Var {
                value: Some(v), ..
            } => {
                let (pkg, sel) = discard_selector(&lowered.file, *v);
                (pkg, sel, "var")
            }
            DeclKind::Const {
                value: Some(v), ..
            } => {
                let (pkg, sel) = discard_selector(&lowered.file, *v);
                (pkg, sel, "const")
            }
            other => panic!("unexpected discard decl {:?}", other),
        })
        .collect();
    let expected = [
        ("q", "Importable", "type"),
        ("fmt", "Println", "var"),
        ("math", "Pi", "const"),
        ("os", "Args", "var"),
        ("strings", "Builder", "type"),
    ];
    assert_eq!(discards.len(), expected.len());
    for ((pkg, sel, kind), (epkg, esel, ekind)) in discards.iter().zip(expected) {
        assert_eq!((pkg.as_str(), sel.as_str(), *kind), (epkg, esel, ekind));
    }
}

/// 测试：导入模块没有可引用的名字是致命错误
#[test]
fn test_no_importable_name_is_fatal() {
    let mut b = FileBuilder::new(PKG);
    b.import("example.com/hidden");
    let file = b.finish();

    let mut registry = own_registry();
    let mut hidden = ModuleInfo::new("example.com/hidden", ModuleSource::External);
    hidden
        .add_export(Export::new("internal", ExportKind::Func))
        .add_export(Export::generic("Map", ExportKind::Func));
    registry.register(hidden);

    let err = lower(file, TypeStore::new(), TypeInfo::new(), &registry, LowerConfig::default()).unwrap_err();
    match err {
        LowerError::ImportResolution { path, reason } => {
            assert_eq!(path, "example.com/hidden");
            assert!(reason.contains("can't find any importable name"), "{}", reason);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

/// 测试：按配置追加可引用的类型声明
#[test]
fn test_add_importable_name() {
    let mut b = FileBuilder::new(PKG);
    let int = b.ident("int");
    b.var_decl("x", Some(int), None);
    let file = b.finish();
    let config = LowerConfig {
        add_importable_name: true,
        importable_name: "Exported".to_string(),
        ..plain_config()
    };

    let registry = own_registry();
    let lowered = lower(file, TypeStore::new(), TypeInfo::new(), &registry, config).unwrap();
    assert_eq!(lowered.decl_names(), vec!["x", "Exported"]);
    let decl = lowered.find_decl("Exported").unwrap();
    let DeclKind::Type { alias, typ, .. } = &lowered.file.decl(decl).kind else {
        panic!("expected type");
    };
    assert!(!alias);
    assert!(lowered.file.is_ident(*typ, "int"));
}

/// 测试：本模块未注册时导入集合为空；直接导入未注册则失败
#[test]
fn test_unregistered_modules() {
    let b = FileBuilder::new(PKG);
    let registry = ModuleRegistry::new();
    let lowered = lower(b.finish(), TypeStore::new(), TypeInfo::new(), &registry, plain_config()).unwrap();
    assert!(lowered.imports.is_empty());

    let mut b = FileBuilder::new(PKG);
    b.import("example.com/missing");
    let err = lower(b.finish(), TypeStore::new(), TypeInfo::new(), &registry, plain_config()).unwrap_err();
    assert!(matches!(err, LowerError::ImportResolution { path, .. } if path == "example.com/missing"));
}

/// 测试：类型实参需要 `unsafe.Pointer` 时补上导入
#[test]
fn test_unsafe_pointer_argument_adds_import() {
    let mut b = FileBuilder::new(PKG);
    max_func(&mut b);
    let p = b.ident("p");
    let call = b.call_named("Max", vec![p, p]);
    b.var_decl("x", None, Some(call));
    let file = b.finish();

    let store = TypeStore::new();
    let ptr = store.basic(BasicKind::UnsafePointer);
    let mut info = TypeInfo::new();
    info.record_type(call, ptr);
    info.record_inferred(call, vec![ptr]);

    let registry = own_registry();
    let lowered = lower(file, store, info, &registry, LowerConfig::default()).unwrap();
    assert_eq!(import_paths(&lowered), vec!["unsafe"]);
    assert_eq!(lowered.decl_names(), vec!["x", "Max_unsafe_Pointer", "_"]);

    let inst = lowered.find_decl("Max_unsafe_Pointer").unwrap();
    let DeclKind::Func { sig, .. } = &lowered.file.decl(inst).kind else {
        panic!("expected func");
    };
    assert_eq!(
        discard_selector(&lowered.file, sig.params[0].typ),
        ("unsafe".to_string(), "Pointer".to_string())
    );
    let DeclKind::Type { typ, .. } = &lowered.file.decl(lowered.decls[2]).kind else {
        panic!("expected type");
    };
    assert_eq!(
        discard_selector(&lowered.file, *typ),
        ("unsafe".to_string(), "Pointer".to_string())
    );
}

/// 测试：外部类型实参用文件里的导入名引用
#[test]
fn test_external_type_argument_uses_local_name() {
    let mut b = FileBuilder::new(PKG);
    b.import_as("example.com/geo", "g");
    max_func(&mut b);
    let point = b.qualified("g", "Point");
    let p = b.var_decl("p", Some(point), None);
    let arg = b.ident("p");
    let call = b.call_named("Max", vec![arg, arg]);
    b.var_decl("x", None, Some(call));
    let file = b.finish();

    let store = TypeStore::new();
    let int = store.basic(BasicKind::Int);
    let mut info = TypeInfo::new();
    info.record_type(call, int);

    let mut registry = own_registry();
    registry.register(external("example.com/geo", &[], &[("Point", ExportKind::Type)]));

    let mut s = Session::new(file, store, info, &registry, plain_config());
    s.check().unwrap();
    let geo_point = s.decl_type(p).unwrap();
    s.info_mut().record_inferred(call, vec![geo_point]);
    let lowered = s.translate().unwrap();

    assert_eq!(lowered.decl_names(), vec!["p", "x", "Max_geo_Point"]);
    let inst = lowered.find_decl("Max_geo_Point").unwrap();
    let DeclKind::Func { sig, .. } = &lowered.file.decl(inst).kind else {
        panic!("expected func");
    };
    assert_eq!(
        discard_selector(&lowered.file, sig.params[0].typ),
        ("g".to_string(), "Point".to_string())
    );
    assert_eq!(import_paths(&lowered), vec!["example.com/geo", "example.com/geo"]);
}
