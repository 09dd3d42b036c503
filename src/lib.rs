//! monolower
//!
//! 把带合约约束的泛型声明降级为不含泛型的代码。
//!
//! 输入是一个已经过外部类型检查的源文件：语法树、类型 arena 和表达式类型信息表。
//! 降级分两步：
//! 1. 声明解析：按需解析包级声明，对声明循环分类，检查类型能否有限展开，
//!    把合约和接口约束落到类型参数上
//! 2. 单态化：每个实际引用到的类型实参组合生成一份具体声明，
//!    再合并导入并追加引用声明
//!
//! # Example
//!
//! ```rust
//! use monolower::frontend::ast::build::FileBuilder;
//! use monolower::frontend::module::{ModuleInfo, ModuleRegistry, ModuleSource};
//! use monolower::{lower, LowerConfig, TypeInfo, TypeStore};
//!
//! let mut b = FileBuilder::new("example.com/p");
//! let int = b.ident("int");
//! b.var_decl("x", Some(int), None);
//!
//! let mut registry = ModuleRegistry::new();
//! registry.register(ModuleInfo::new("example.com/p", ModuleSource::Batch));
//! let lowered = lower(
//!     b.finish(),
//!     TypeStore::new(),
//!     TypeInfo::new(),
//!     &registry,
//!     LowerConfig::default(),
//! )
//! .unwrap();
//! assert_eq!(lowered.decl_names(), vec!["x"]);
//! ```

#![warn(rust_2018_idioms)]

pub mod frontend;
pub mod middle;
pub mod session;
pub mod util;

// Re-exports
pub use frontend::module::{Importer, ModuleRegistry};
pub use frontend::typecheck::{LowerError, LowerResult, TypeInfo, TypeStore};
pub use middle::passes::mono::function::FunctionMonomorphizer;
pub use middle::passes::mono::type_mono::TypeMonomorphizer;
pub use session::{lower, LoweredFile, Session};
pub use util::config::LowerConfig;
pub use util::diagnostic::{Diagnostic, ErrorCollector, Severity};

/// 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
