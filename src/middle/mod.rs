//! 中间层
//!
//! 语法树上的改写阶段。目前只有单态化，见 [`passes::mono`]。

pub mod passes;
