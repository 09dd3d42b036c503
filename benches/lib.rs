//! # monolower 性能基准测试
//!
//! 使用 Criterion.rs 进行性能基准测试。
//!
//! ## 基准测试分组
//! - `subst`: 类型代入（嵌套形状、缓存命中）
//! - `lowering`: 整个文件的检查与单态化
//!
//! ## 使用方法
//! ```bash
//! cargo bench           # 运行所有
//! cargo bench subst     # 只运行代入
//! ```

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use monolower::frontend::ast::build::FileBuilder;
use monolower::frontend::ast::{DeclId, File};
use monolower::frontend::module::{ModuleInfo, ModuleRegistry, ModuleSource};
use monolower::frontend::typecheck::types::{BasicKind, TypeData, TypeId, TypeStore, Var};
use monolower::{lower, LowerConfig, Session, TypeInfo};

const PKG: &str = "example.com/bench";

fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register(ModuleInfo::new(PKG, ModuleSource::Batch));
    registry
}

fn quiet() {
    let _ = tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(tracing::Level::ERROR)
        .try_init();
}

/// `type Tree[T any] struct { val T; left, right *Tree[T]; kids []*Tree[T] }`
fn tree(b: &mut FileBuilder) -> DeclId {
    let t = b.ident("T");
    let val = b.field("val", t);
    let mut fields = vec![val];
    for name in ["left", "right"] {
        let t = b.ident("T");
        let inst = b.inst("Tree", vec![t]);
        let ptr = b.ptr(inst);
        fields.push(b.field(name, ptr));
    }
    let t = b.ident("T");
    let inst = b.inst("Tree", vec![t]);
    let ptr = b.ptr(inst);
    let kids = b.slice(ptr);
    fields.push(b.field("kids", kids));
    let st = b.struct_type(fields);
    let tp = b.tparams(&["T"], None);
    b.generic_type("Tree", vec![tp], st)
}

/// 一个泛型类型加上 `n` 个用不同实参引用它的变量
fn program(n: usize) -> File {
    const ARGS: [&str; 6] = ["int", "string", "bool", "float64", "uint8", "int64"];
    let mut b = FileBuilder::new(PKG);
    tree(&mut b);
    for i in 0..n {
        let arg = b.ident(ARGS[i % ARGS.len()]);
        let inst = b.inst("Tree", vec![arg]);
        b.var_decl(&format!("v{i}"), Some(inst), None);
    }
    b.finish()
}

/// 深度为 `depth` 的 `map[T]struct{ a T; b []*T }` 嵌套形状
fn nested_shape(
    store: &mut TypeStore,
    param: TypeId,
    depth: usize,
) -> TypeId {
    let mut t = param;
    for _ in 0..depth {
        let ptr = store.pointer(param);
        let slice = store.slice(ptr);
        let st = store.structure(
            vec![Var::new("a", t), Var::new("b", slice)],
            vec![String::new(), String::new()],
        );
        t = store.alloc(TypeData::Map { key: param, value: st });
    }
    t
}

// ============================================================================
// Substitution Benchmarks - 类型代入
// ============================================================================

fn bench_substitute_nested(c: &mut Criterion) {
    quiet();
    let registry = registry();
    let setup = || {
        let mut b = FileBuilder::new(PKG);
        let tp = b.tparams(&["T"], None);
        let sig = b.sig(Vec::new(), Vec::new());
        let id = b.generic_func("Id", vec![tp], sig, None);
        let mut s = Session::new(
            b.finish(),
            TypeStore::new(),
            TypeInfo::new(),
            &registry,
            LowerConfig::default(),
        );
        s.check().expect("check failed");
        let t = s.type_param(id, "T").expect("missing type parameter");
        let shape = nested_shape(s.store_mut(), t, 16);
        (s, t, shape)
    };

    c.bench_function("substitute_nested_16", |b| {
        b.iter_batched(
            &setup,
            |(mut s, t, shape)| {
                let int = s.store().basic(BasicKind::Int);
                black_box(s.substitute(&[t], &[int], shape).expect("substitute failed"))
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("substitute_memo_hit", |b| {
        let (mut s, t, shape) = setup();
        let int = s.store().basic(BasicKind::Int);
        s.substitute(&[t], &[int], shape).expect("substitute failed");
        b.iter(|| black_box(s.substitute(&[t], &[int], shape).expect("substitute failed")))
    });
}

// ============================================================================
// Lowering Benchmarks - 检查与单态化
// ============================================================================

fn bench_lower_program(c: &mut Criterion) {
    quiet();
    let registry = registry();
    for n in [8usize, 64] {
        c.bench_function(&format!("lower_tree_refs_{n}"), |b| {
            b.iter_batched(
                || program(n),
                |file| {
                    let lowered = lower(
                        file,
                        TypeStore::new(),
                        TypeInfo::new(),
                        &registry,
                        LowerConfig::default(),
                    )
                    .expect("lowering failed");
                    black_box(lowered.decls.len())
                },
                BatchSize::SmallInput,
            )
        });
    }
}

// ============================================================================
// Criterion Groups
// ============================================================================

criterion_group!(
    name = subst;
    config = Criterion::default().sample_size(50);
    targets = bench_substitute_nested
);

criterion_group!(
    name = lowering;
    config = Criterion::default().sample_size(30);
    targets = bench_lower_program
);

criterion_main!(subst, lowering);
