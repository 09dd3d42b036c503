//! 类型信息表
//!
//! 值表达式的类型、调用点推断出的类型实参列表和常量值由外部类型检查器提供；
//! 类型表达式的类型以及生成节点的类型由降级过程自己记录。

use std::collections::HashMap;

use super::types::TypeId;
use crate::frontend::ast::ExprId;

/// 表达式到类型、推断实参、常量值的映射
#[derive(Debug, Clone, Default)]
pub struct TypeInfo {
    types: HashMap<ExprId, TypeId>,
    inferred: HashMap<ExprId, Vec<TypeId>>,
    values: HashMap<ExprId, i64>,
}

impl TypeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录表达式类型
    pub fn record_type(
        &mut self,
        expr: ExprId,
        typ: TypeId,
    ) {
        self.types.insert(expr, typ);
    }

    pub fn type_of(
        &self,
        expr: ExprId,
    ) -> Option<TypeId> {
        self.types.get(&expr).copied()
    }

    /// 记录调用点推断出的类型实参
    pub fn record_inferred(
        &mut self,
        call: ExprId,
        targs: Vec<TypeId>,
    ) {
        self.inferred.insert(call, targs);
    }

    pub fn inferred(
        &self,
        call: ExprId,
    ) -> Option<&[TypeId]> {
        self.inferred.get(&call).map(Vec::as_slice)
    }

    /// 记录常量表达式的值（数组长度）
    pub fn record_value(
        &mut self,
        expr: ExprId,
        value: i64,
    ) {
        self.values.insert(expr, value);
    }

    pub fn value_of(
        &self,
        expr: ExprId,
    ) -> Option<i64> {
        self.values.get(&expr).copied()
    }
}
