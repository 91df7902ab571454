// ==========================================
// 组合导入引擎 - 控制台进度输出
// ==========================================
// stdout: 进度流（分部、分块、子进程输出）
// 日志走 stderr，互不干扰
// ==========================================

use crate::engine::{ImportEvent, ImportProgressListener};
use std::io::Write;

/// 控制台进度监听者
#[derive(Debug, Clone, Default)]
pub struct ConsoleProgress;

impl ConsoleProgress {
    pub fn render(event: &ImportEvent) -> String {
        match event {
            ImportEvent::PartStarted { part, count, chunks } => {
                format!("Importing {} ({} entries, {} batches)", part, count, chunks)
            }
            ImportEvent::ChunkStarted { index, .. } => format!("  processing batch {}", index),
            ImportEvent::OutputLine { line, .. } => format!("    {}", line),
            ImportEvent::PartFinished { part } => format!("  {} done", part),
            ImportEvent::CleanupFinished { part, removed } => {
                format!("Removed {} orphaned {} rows", removed, part)
            }
        }
    }
}

impl ImportProgressListener for ConsoleProgress {
    fn notify(&self, event: &ImportEvent) {
        let mut out = std::io::stdout().lock();
        // stdout 被关闭时放弃进度输出
        let _ = writeln!(out, "{}", Self::render(event));
        let _ = out.flush();
    }
}
