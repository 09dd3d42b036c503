//! 降级阶段
//!
//! - [`mono`] - 泛型实例化与导入整理

pub mod mono;
