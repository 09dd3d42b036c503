//! 类型完整性检查
//!
//! 名义类型在不经过间接（指针、切片、映射、通道、函数）的情况下
//! 包含自己，就无法在有限步内展开。检查沿数组元素、结构体字段、
//! 接口嵌入和名义类型的底层类型递归，用完整性标记识别回到自身的路径。
//! 路径以声明身份为键，所以泛型类型的实例也能终止。

use tracing::debug;

use super::Session;
use crate::frontend::ast::DeclId;
use crate::frontend::typecheck::errors::LowerResult;
use crate::frontend::typecheck::types::{Completion, NamedObj, TypeData, TypeId};

impl Session<'_> {
    /// 检查 `t` 能否有限展开
    pub(crate) fn valid_type(
        &mut self,
        t: TypeId,
        path: &mut Vec<(DeclId, TypeId)>,
    ) -> LowerResult<Completion> {
        match self.store.get(t).clone() {
            TypeData::Array { elem, .. } => self.valid_type(elem, path),
            TypeData::Struct { fields, .. } => {
                let mut result = Completion::Valid;
                for field in fields {
                    if self.valid_type(field.typ, path)? == Completion::Invalid {
                        result = Completion::Invalid;
                    }
                }
                Ok(result)
            }
            TypeData::Interface(iface) => {
                let mut result = Completion::Valid;
                for embed in iface.embeddeds {
                    if self.valid_type(embed, path)? == Completion::Invalid {
                        result = Completion::Invalid;
                    }
                }
                Ok(result)
            }
            TypeData::Named(named) => {
                let decl = match (&named.obj, named.origin) {
                    (_, Some(origin)) => origin,
                    (NamedObj::Decl(d), None) => *d,
                    _ => return Ok(Completion::Valid),
                };
                if let Some(start) = path.iter().position(|(d, _)| *d == decl) {
                    self.invalid_expansion(path, start);
                    return Ok(Completion::Invalid);
                }
                match named.mark {
                    Completion::Valid | Completion::Invalid => return Ok(named.mark),
                    Completion::Marked | Completion::Unmarked => {}
                }
                if named.underlying.is_some_and(|u| self.store.is_invalid(u)) {
                    self.set_mark(t, Completion::Invalid);
                    return Ok(Completion::Invalid);
                }

                self.set_mark(t, Completion::Marked);
                path.push((decl, t));
                let under = self.under(t);
                let result = match under {
                    Ok(u) => self.valid_type(u, path),
                    Err(e) => Err(e),
                };
                path.pop();
                result?;

                // 只有循环上的类型标为无效
                let current = self.store.named(t).map(|n| n.mark);
                let mark = if current == Some(Completion::Invalid) {
                    Completion::Invalid
                } else {
                    Completion::Valid
                };
                self.set_mark(t, mark);
                Ok(mark)
            }
            // 其余形状都经过间接，或不含名义类型
            _ => Ok(Completion::Valid),
        }
    }

    /// 报告 `path[start..]` 构成的无限展开，并把每个参与者的底层类型换成无效类型
    ///
    /// 标记和底层类型必须一致：标为无效的类型底层一定是无效类型。
    fn invalid_expansion(
        &mut self,
        path: &[(DeclId, TypeId)],
        start: usize,
    ) {
        let cycle: Vec<DeclId> = path[start..].iter().map(|(d, _)| *d).collect();
        debug!("infinite expansion through {} types", cycle.len());
        self.report_cycle("E2102", &cycle);
        let invalid = self.store.invalid();
        for &(_, t) in &path[start..] {
            if let Some(named) = self.store.named_mut(t) {
                named.underlying = Some(invalid);
                named.mark = Completion::Invalid;
            }
        }
    }

    fn set_mark(
        &mut self,
        t: TypeId,
        mark: Completion,
    ) {
        if let Some(named) = self.store.named_mut(t) {
            named.mark = mark;
        }
    }
}
