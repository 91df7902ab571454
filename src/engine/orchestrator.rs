// ==========================================
// 组合导入引擎 - 分块导入编排器
// ==========================================
// 用途: 按配置顺序驱动各分部的 prepare → 分块 → 清理
// 状态: NotStarted → Prepared → Chunk(i)… → CleanedUp → Done
//       任一分块失败 → Failed，整个运行中止（不自动重试）
// 约束: 分块严格顺序执行；清理仅在所有分部成功后按逆序执行
// ==========================================

use crate::config::ImportSettings;
use crate::domain::ImportPart;
use crate::engine::chunk::plan_chunks;
use crate::engine::dispatcher::ChunkDispatcher;
use crate::engine::events::{ImportEvent, ImportProgressListener};
use crate::export::ExportSnapshot;
use crate::importer::error::ImportResult;
use crate::repository::RepositoryError;
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

// ==========================================
// PartState - 单个分部的执行状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartState {
    NotStarted,
    Prepared,
    /// 正在/已完成第 i 个分块（从 1 开始）
    Chunk(usize),
    CleanedUp,
    Done,
    Failed,
}

/// 一次运行的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub states: BTreeMap<ImportPart, PartState>,
    pub chunks_dispatched: usize,
    pub orphans_removed: usize,
}

// ==========================================
// ImportOrchestrator - 分块导入编排器
// ==========================================
pub struct ImportOrchestrator {
    conn: Arc<Mutex<Connection>>,
    dispatcher: Arc<dyn ChunkDispatcher>,
    listener: Arc<dyn ImportProgressListener>,
    settings: ImportSettings,
}

impl ImportOrchestrator {
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        dispatcher: Arc<dyn ChunkDispatcher>,
        listener: Arc<dyn ImportProgressListener>,
        settings: ImportSettings,
    ) -> Self {
        Self {
            conn,
            dispatcher,
            listener,
            settings,
        }
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 执行完整导入
    ///
    /// 失败时返回第一个失败分块的错误；已提交的分块保持提交
    pub async fn run(&self, snapshot: &ExportSnapshot) -> ImportResult<ImportSummary> {
        let combination_id = snapshot.combination_id();
        let mut summary = ImportSummary {
            states: self
                .settings
                .parts
                .iter()
                .map(|part| (*part, PartState::NotStarted))
                .collect(),
            chunks_dispatched: 0,
            orphans_removed: 0,
        };

        info!(
            %combination_id,
            parts = ?self.settings.parts,
            chunk_size = self.settings.chunk_size,
            "开始组合导入"
        );

        for part in &self.settings.parts {
            let part = *part;
            let reconciler = part.reconciler();

            let count = reconciler.count(snapshot)?;
            {
                let mut conn = self.lock_conn()?;
                reconciler.prepare(&mut conn, combination_id)?;
            }
            summary.states.insert(part, PartState::Prepared);

            let chunks = plan_chunks(part, combination_id, count, self.settings.chunk_size);
            self.listener.notify(&ImportEvent::PartStarted {
                part,
                count,
                chunks: chunks.len(),
            });
            info!(part = %part, count, chunks = chunks.len(), "分部开始");

            for chunk in &chunks {
                summary.states.insert(part, PartState::Chunk(chunk.index));
                self.listener.notify(&ImportEvent::ChunkStarted {
                    part,
                    index: chunk.index,
                    offset: chunk.offset,
                    limit: chunk.limit,
                });

                if let Err(e) = self.dispatcher.dispatch(chunk, self.listener.as_ref()).await {
                    summary.states.insert(part, PartState::Failed);
                    error!(part = %part, index = chunk.index, error = %e, "分块失败，导入中止");
                    return Err(e);
                }
                summary.chunks_dispatched += 1;
            }

            self.listener.notify(&ImportEvent::PartFinished { part });
        }

        // 逆序清理（先删配方再删物品，避免仍被引用的行残留）
        for part in self.settings.parts.iter().rev() {
            if self.settings.orphan_parts.contains(part) {
                let removed = {
                    let mut conn = self.lock_conn()?;
                    part.reconciler().cleanup(&mut conn)?
                };
                summary.orphans_removed += removed;
                summary.states.insert(*part, PartState::CleanedUp);
                self.listener.notify(&ImportEvent::CleanupFinished {
                    part: *part,
                    removed,
                });
            }
        }

        for state in summary.states.values_mut() {
            *state = PartState::Done;
        }

        info!(
            %combination_id,
            chunks = summary.chunks_dispatched,
            orphans_removed = summary.orphans_removed,
            "组合导入完成"
        );
        Ok(summary)
    }
}
