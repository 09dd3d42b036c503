//! 通用工具：位置、诊断、日志、配置

pub mod config;
pub mod diagnostic;
pub mod logger;
pub mod span;

/// 带位置的值
#[derive(Debug, Clone)]
pub struct Spanned<T> {
    /// 值
    pub value: T,
    /// 源码位置
    pub span: span::Span,
}

impl<T> Spanned<T> {
    /// 包装一个带位置的值
    #[inline]
    pub fn new(
        value: T,
        span: span::Span,
    ) -> Self {
        Self { value, span }
    }
}

impl<T> std::ops::Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T> std::ops::DerefMut for Spanned<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.value
    }
}
