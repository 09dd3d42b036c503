//! 初始化顺序
//!
//! 只由值声明构成的循环在解析时不报告，全部声明解析完后在这里
//! 统一报告为初始化循环，每个循环一次。

use tracing::debug;

use super::Session;
use crate::util::diagnostic::codes::ErrorCodeDefinition;

impl Session<'_> {
    /// 报告解析过程中发现的初始化循环
    pub(crate) fn report_init_cycles(&mut self) {
        let cycles = std::mem::take(&mut self.resolver.init_cycles);
        for cycle in cycles {
            debug!("initialization cycle of {} values", cycle.len());
            let anchor = cycle[0];
            let name = self.file.decl(anchor).name.clone();
            let notes = self.cycle_notes(&cycle);
            let diagnostic = ErrorCodeDefinition::initialization_cycle(&name)
                .at(self.file.decl_span(anchor))
                .with_related(notes)
                .build();
            self.diags.push(diagnostic);
        }
    }
}
