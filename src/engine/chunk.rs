// ==========================================
// 组合导入引擎 - 分块规划与执行
// ==========================================
// 分块数 = ceil(count / chunk_size)，最后一块可能不满
// run_chunk 是子进程与进程内调度共用的执行入口
// ==========================================

use crate::domain::ImportPart;
use crate::export::{ExportRegistry, ExportSnapshot};
use crate::importer::error::ImportResult;
use crate::importer::reconciler::ChunkReport;
use rusqlite::Connection;
use std::sync::Arc;
use uuid::Uuid;

/// 单个分块的描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpec {
    pub part: ImportPart,
    pub combination_id: Uuid,
    /// 从 1 开始的序号
    pub index: usize,
    pub offset: usize,
    pub limit: usize,
}

/// 划分分块（chunk_size 为 0 时按 1 处理）
pub fn plan_chunks(
    part: ImportPart,
    combination_id: Uuid,
    count: usize,
    chunk_size: usize,
) -> Vec<ChunkSpec> {
    let chunk_size = chunk_size.max(1);
    let chunks = count.div_ceil(chunk_size);
    (0..chunks)
        .map(|i| ChunkSpec {
            part,
            combination_id,
            index: i + 1,
            offset: i * chunk_size,
            limit: chunk_size,
        })
        .collect()
}

/// 执行一个分块：加载快照并交给该分部的对账器
pub fn run_chunk(
    conn: &mut Connection,
    registry: Arc<dyn ExportRegistry>,
    part: ImportPart,
    combination_id: Uuid,
    offset: usize,
    limit: usize,
) -> ImportResult<ChunkReport> {
    let snapshot = ExportSnapshot::load(registry, combination_id)?;
    part.reconciler()
        .import_chunk(conn, &snapshot, offset, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_plan_chunks_partition_is_complete_and_disjoint() {
        for (count, size) in [(0, 256), (1, 256), (256, 256), (257, 256), (1000, 7), (5, 0)] {
            let chunks = plan_chunks(ImportPart::Item, Uuid::nil(), count, size);
            assert_eq!(chunks.len(), count.div_ceil(size.max(1)));

            let mut covered = HashSet::new();
            for chunk in &chunks {
                for i in chunk.offset..(chunk.offset + chunk.limit).min(count) {
                    assert!(covered.insert(i), "index {} covered twice", i);
                }
            }
            assert_eq!(covered.len(), count);
        }
    }

    #[test]
    fn test_plan_chunks_indices_start_at_one() {
        let chunks = plan_chunks(ImportPart::Recipe, Uuid::nil(), 10, 4);
        let indices: Vec<usize> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(chunks[2].offset, 8);
    }
}
