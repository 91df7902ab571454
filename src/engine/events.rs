// ==========================================
// 组合导入引擎 - 导入进度事件
// ==========================================
// 职责: 定义进度监听 trait，编排器/调度器只发事件不做展示
// 说明: 控制台输出由 app 层实现
// ==========================================

use crate::domain::ImportPart;
use std::sync::Arc;

// ==========================================
// 导入事件
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportEvent {
    /// 分部开始（已统计数量并完成 prepare）
    PartStarted {
        part: ImportPart,
        count: usize,
        chunks: usize,
    },
    /// 分块开始（index 从 1 开始）
    ChunkStarted {
        part: ImportPart,
        index: usize,
        offset: usize,
        limit: usize,
    },
    /// 子进程输出的一行
    OutputLine { part: ImportPart, line: String },
    /// 分部全部分块完成
    PartFinished { part: ImportPart },
    /// 孤儿清理完成
    CleanupFinished { part: ImportPart, removed: usize },
}

// ==========================================
// 进度监听 Trait
// ==========================================

pub trait ImportProgressListener: Send + Sync {
    fn notify(&self, event: &ImportEvent);
}

/// 空操作监听者
///
/// 用于不需要进度输出的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpProgressListener;

impl ImportProgressListener for NoOpProgressListener {
    fn notify(&self, event: &ImportEvent) {
        tracing::trace!(?event, "NoOpProgressListener: 跳过进度事件");
    }
}

/// 共享监听者
pub type SharedProgressListener = Arc<dyn ImportProgressListener>;
