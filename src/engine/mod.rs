// ==========================================
// 组合导入引擎 - 调度层
// ==========================================
// 职责: 分块规划、子进程调度、失败提取、运行编排
// 红线: 调度层不拼 SQL；对账逻辑全部在 importer 层
// ==========================================

pub mod chunk;
pub mod dispatcher;
pub mod events;
pub mod failure;
pub mod orchestrator;

// 重导出核心类型
pub use chunk::{plan_chunks, run_chunk, ChunkSpec};
pub use dispatcher::{ChunkDispatcher, InProcessDispatcher, ProcessDispatcher};
pub use events::{ImportEvent, ImportProgressListener, NoOpProgressListener, SharedProgressListener};
pub use failure::{extract_message, render_error_block, CommandExit, ERROR_CLOSE, ERROR_OPEN};
pub use orchestrator::{ImportOrchestrator, ImportSummary, PartState};
