// ==========================================
// 组合导入引擎 - 通用实体对账器
// ==========================================
// 分块流程:
//   1. 按稳定顺序物化 [offset, offset+limit) 切片
//   2. 批量读取已有行（按标识集合）
//   3. 已有 → 字段级覆盖后保存；否则新建
//   4. 挂载到组合；每个分块一个事务
// 红线: 对账器不创建组合；缺失的跨类型引用使整个分块失败
// ==========================================

use crate::domain::{Identity, ImportPart};
use crate::export::ExportSnapshot;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::identity::Identifiable;
use crate::perf::PerfGuard;
use crate::repository::{CombinationRepository, EntityRepository};
use rusqlite::Connection;
use std::collections::HashMap;
use std::marker::PhantomData;
use tracing::{debug, info};
use uuid::Uuid;

// ==========================================
// ReconcileKind - 单一实体类型的对账规则
// ==========================================
pub trait ReconcileKind {
    const PART: ImportPart;

    type Entity: Identifiable;
    type Repo: EntityRepository<Entity = Self::Entity>;

    /// 快照中该类型的可枚举条目数
    fn count(snapshot: &ExportSnapshot) -> ImportResult<usize>;

    /// 物化切片并映射为带标识的数据库实体
    ///
    /// conn 处于分块事务内，可用于跨类型查找
    fn materialize(
        conn: &Connection,
        snapshot: &ExportSnapshot,
        offset: usize,
        limit: usize,
    ) -> ImportResult<Vec<Self::Entity>>;

    /// 将新实体覆盖到已有实体上（保留已有标识）
    fn apply_update(existing: &mut Self::Entity, incoming: Self::Entity) {
        let id = existing.id();
        *existing = incoming;
        existing.set_id(id);
    }
}

// ==========================================
// EntityReconciler - 对账器对象接口
// ==========================================
// 由 ImportPart 注册表分发，编排器与分块命令只依赖此接口
pub trait EntityReconciler: Send + Sync {
    fn part(&self) -> ImportPart;

    fn count(&self, snapshot: &ExportSnapshot) -> ImportResult<usize>;

    /// 清空组合在该类型上的关联（幂等）
    fn prepare(&self, conn: &mut Connection, combination_id: Uuid) -> ImportResult<()>;

    fn import_chunk(
        &self,
        conn: &mut Connection,
        snapshot: &ExportSnapshot,
        offset: usize,
        limit: usize,
    ) -> ImportResult<ChunkReport>;

    /// 删除孤儿行，返回删除数
    fn cleanup(&self, conn: &mut Connection) -> ImportResult<usize>;
}

/// 单个分块的对账结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkReport {
    pub part: ImportPart,
    pub offset: usize,
    pub limit: usize,
    pub created: usize,
    pub updated: usize,
}

/// 基于 ReconcileKind 的通用对账器
pub struct Reconciler<K> {
    _kind: PhantomData<fn() -> K>,
}

impl<K> Reconciler<K> {
    pub fn new() -> Self {
        Self { _kind: PhantomData }
    }
}

impl<K> Default for Reconciler<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// 分块内按标识去重：后写入者覆盖内容，位置保留首次出现处
pub fn dedupe_by_id<T: Identifiable>(entities: Vec<T>) -> Vec<T> {
    let mut positions: HashMap<Identity, usize> = HashMap::with_capacity(entities.len());
    let mut out: Vec<T> = Vec::with_capacity(entities.len());
    for entity in entities {
        match positions.get(&entity.id()) {
            Some(&index) => out[index] = entity,
            None => {
                positions.insert(entity.id(), out.len());
                out.push(entity);
            }
        }
    }
    out
}

/// 切片范围 [offset, offset+limit) 与长度求交
pub fn slice_range(len: usize, offset: usize, limit: usize) -> std::ops::Range<usize> {
    let start = offset.min(len);
    let end = offset.saturating_add(limit).min(len);
    start..end
}

impl<K> EntityReconciler for Reconciler<K>
where
    K: ReconcileKind,
{
    fn part(&self) -> ImportPart {
        K::PART
    }

    fn count(&self, snapshot: &ExportSnapshot) -> ImportResult<usize> {
        K::count(snapshot)
    }

    fn prepare(&self, conn: &mut Connection, combination_id: Uuid) -> ImportResult<()> {
        let detached = K::Repo::detach_combination_tx(conn, combination_id)?;
        debug!(part = %K::PART, %combination_id, detached, "清空组合关联");
        Ok(())
    }

    fn import_chunk(
        &self,
        conn: &mut Connection,
        snapshot: &ExportSnapshot,
        offset: usize,
        limit: usize,
    ) -> ImportResult<ChunkReport> {
        let _perf = PerfGuard::new("import_chunk", K::PART.as_str());
        let combination_id = snapshot.combination_id();

        let tx = conn.transaction()?;

        if CombinationRepository::find_by_id_tx(&tx, combination_id)?.is_none() {
            return Err(ImportError::missing("combination", combination_id.to_string()));
        }

        let entities = dedupe_by_id(K::materialize(&tx, snapshot, offset, limit)?);
        let ids: Vec<Identity> = entities.iter().map(|e| e.id()).collect();
        let mut existing = K::Repo::find_by_ids_tx(&tx, &ids)?;

        let mut report = ChunkReport {
            part: K::PART,
            offset,
            limit,
            created: 0,
            updated: 0,
        };

        for entity in entities {
            match existing.remove(&entity.id()) {
                Some(mut current) => {
                    K::apply_update(&mut current, entity);
                    K::Repo::save_tx(&tx, &current, false)?;
                    report.updated += 1;
                }
                None => {
                    K::Repo::save_tx(&tx, &entity, true)?;
                    report.created += 1;
                }
            }
        }

        K::Repo::attach_tx(&tx, combination_id, &ids)?;
        tx.commit()?;

        info!(
            part = %K::PART,
            offset,
            limit,
            created = report.created,
            updated = report.updated,
            "分块对账完成"
        );
        Ok(report)
    }

    fn cleanup(&self, conn: &mut Connection) -> ImportResult<usize> {
        let tx = conn.transaction()?;
        let removed = K::Repo::remove_orphans_tx(&tx)?;
        tx.commit()?;
        info!(part = %K::PART, removed, "孤儿清理完成");
        Ok(removed)
    }
}
