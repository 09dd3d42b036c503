//! 源码位置跟踪
//!
//! 语法树中每个节点都带一个 [`Span`]。解析器不在本 crate 中，
//! 位置由外部提供；这里只负责比较（循环报告要锚定在源码最靠前的参与者上）
//! 和渲染时的源码片段查找。

use std::cmp::Ordering;
use std::fmt;

/// 源码位置（行、列、字节偏移）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// 行号（从 1 开始）
    pub line: usize,
    /// 列号（从 1 开始）
    pub column: usize,
    /// 相对文件起始的字节偏移
    pub offset: usize,
}

impl Position {
    /// 创建位置
    #[inline]
    pub fn new(
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            line,
            column,
            offset: 0,
        }
    }

    /// 创建带偏移的位置
    #[inline]
    pub fn with_offset(
        line: usize,
        column: usize,
        offset: usize,
    ) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// 虚拟位置（生成代码使用）
    #[inline]
    pub fn dummy() -> Self {
        Self::default()
    }
}

impl PartialOrd for Position {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        (self.line, self.column, self.offset).cmp(&(other.line, other.column, other.offset))
    }
}

impl fmt::Display for Position {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// 源码区间（起始位置到结束位置）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// 起始位置（包含）
    pub start: Position,
    /// 结束位置（不包含）
    pub end: Position,
}

impl Span {
    /// 创建区间
    #[inline]
    pub fn new(
        start: Position,
        end: Position,
    ) -> Self {
        Self { start, end }
    }

    /// 虚拟区间
    #[inline]
    pub fn dummy() -> Self {
        Self::default()
    }

    /// 是否为虚拟区间
    #[inline]
    pub fn is_dummy(&self) -> bool {
        self.start.line == 0
    }

    /// 是否在源码中先于 `other` 出现
    ///
    /// 虚拟区间总是排在真实区间之后。
    pub fn precedes(
        &self,
        other: &Span,
    ) -> bool {
        match (self.is_dummy(), other.is_dummy()) {
            (false, true) => true,
            (true, _) => false,
            (false, false) => self.start < other.start,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "[{} - {}]", self.start, self.end)
    }
}

/// 源文件信息（仅用于诊断渲染）
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// 文件名
    pub name: String,
    /// 文件内容
    pub content: String,
}

impl SourceFile {
    /// 创建源文件
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// 取第 `line` 行（从 1 开始）
    pub fn line(
        &self,
        line: usize,
    ) -> Option<&str> {
        if line == 0 {
            return None;
        }
        self.content.lines().nth(line - 1)
    }
}

impl fmt::Display for SourceFile {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
