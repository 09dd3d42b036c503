//! 类型与声明
//!
//! - [`types`] - 类型形状模型与类型 arena
//! - [`identical`] - 类型的语义相等
//! - [`info`] - 表达式类型信息表
//! - [`decl`] - 声明解析、类型参数与合约、类型完整性
//! - [`errors`] - 致命错误

pub mod decl;
pub mod errors;
pub mod identical;
pub mod info;
pub mod types;

#[cfg(test)]
mod tests;

pub use decl::{Color, ContractInfo};
pub use errors::{LowerError, LowerResult};
pub use identical::{identical, identical_list};
pub use info::TypeInfo;
pub use types::{TypeData, TypeId, TypeStore};
