//! 单态化测试
//!
//! 语法树用 `FileBuilder` 构造，外部类型检查器的结果手工记进 `TypeInfo`。

mod function_tests;
mod import_tests;

use crate::frontend::ast::build::FileBuilder;
use crate::frontend::ast::{DeclId, ExprId, Stmt, StmtId};
use crate::frontend::module::{ModuleInfo, ModuleRegistry, ModuleSource};
use crate::session::LoweredFile;
use crate::util::config::LowerConfig;

/// 本文件的模块路径
const PKG: &str = "example.com/p";

/// 不追加引用声明，输出只含翻译出的声明
fn plain_config() -> LowerConfig {
    LowerConfig {
        discard_imports: false,
        ..LowerConfig::default()
    }
}

/// 只注册本模块的注册表
fn own_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register(ModuleInfo::new(PKG, ModuleSource::Batch));
    registry
}

/// `func Max[T any](a, b T) T { return a }`，返回声明和 `return a` 中的 `a`
fn max_func(b: &mut FileBuilder) -> (DeclId, ExprId) {
    let any = b.empty_interface();
    let tp = b.tparams(&["T"], Some(any));
    let ta = b.ident("T");
    let tb = b.ident("T");
    let tr = b.ident("T");
    let pa = b.field("a", ta);
    let pb = b.field("b", tb);
    let r = b.anon(tr);
    let sig = b.sig(vec![pa, pb], vec![r]);
    let a = b.ident("a");
    let ret = b.ret(vec![a]);
    let body = b.block(vec![ret]);
    (b.generic_func("Max", vec![tp], sig, Some(body)), a)
}

/// `type List[T any] struct { items []T }` 加上 `func (l *List[T]) Push(v T) {}`
fn list_type(b: &mut FileBuilder) -> (DeclId, DeclId) {
    let t = b.ident("T");
    let items = b.slice(t);
    let field = b.field("items", items);
    let st = b.struct_type(vec![field]);
    let tp = b.tparams(&["T"], None);
    let list = b.generic_type("List", vec![tp], st);

    let rt = b.ident("T");
    let recv_t = b.inst("List", vec![rt]);
    let recv_p = b.ptr(recv_t);
    let recv = b.field("l", recv_p);
    let vt = b.ident("T");
    let v = b.field("v", vt);
    let sig = b.sig(vec![v], Vec::new());
    let body = b.block(Vec::new());
    let push = b.method(recv, "Push", sig, Some(body));
    (list, push)
}

/// 函数体顶层块里的语句
fn body_stmts(
    lowered: &LoweredFile,
    decl: DeclId,
) -> Vec<StmtId> {
    let crate::frontend::ast::DeclKind::Func {
        body: Some(body), ..
    } = &lowered.file.decl(decl).kind
    else {
        panic!("expected a function with a body");
    };
    let Stmt::Block(stmts) = lowered.file.stmt(*body) else {
        panic!("expected a block");
    };
    stmts.clone()
}

/// 函数体的第一条语句
fn first_stmt(
    lowered: &LoweredFile,
    decl: DeclId,
) -> Stmt {
    let stmts = body_stmts(lowered, decl);
    lowered.file.stmt(stmts[0]).clone()
}
