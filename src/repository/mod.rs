// ==========================================
// 组合导入引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含对账逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化; 分块内写入走 *_tx 关联函数
// ==========================================

pub mod combination_repo;
pub mod crafting_category_repo;
pub mod error;
pub mod icon_repo;
pub mod item_repo;
pub mod machine_repo;
pub mod mod_repo;
pub mod recipe_repo;
pub mod sql_utils;
pub mod translation_repo;

// 重导出核心仓储
pub use combination_repo::CombinationRepository;
pub use crafting_category_repo::CraftingCategoryRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use icon_repo::IconRepository;
pub use item_repo::ItemRepository;
pub use machine_repo::MachineRepository;
pub use mod_repo::ModRepository;
pub use recipe_repo::RecipeRepository;
pub use translation_repo::TranslationRepository;

use crate::domain::Identity;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use uuid::Uuid;

// ==========================================
// EntityRepository - 可对账实体的数据访问
// ==========================================
// 所有函数接收 &Connection，调用方决定事务边界
// （Transaction 通过 Deref 传入即在事务内执行）
pub trait EntityRepository {
    type Entity;

    /// 组合关联表，例如 combination_item
    const LINK_TABLE: &'static str;

    /// 关联表中指向实体的列，例如 item_id
    const LINK_COLUMN: &'static str;

    /// 按标识批量读取已有实体
    fn find_by_ids_tx(
        conn: &Connection,
        ids: &[Identity],
    ) -> RepositoryResult<HashMap<Identity, Self::Entity>>;

    /// 写入实体；is_new=false 时按标识覆盖已有行
    fn save_tx(conn: &Connection, entity: &Self::Entity, is_new: bool) -> RepositoryResult<()>;

    /// 删除不再被任何组合（及其它实体）引用的行
    fn remove_orphans_tx(conn: &Connection) -> RepositoryResult<usize>;

    /// 将实体挂到组合下（已挂载的忽略）
    fn attach_tx(
        conn: &Connection,
        combination_id: Uuid,
        ids: &[Identity],
    ) -> RepositoryResult<usize> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} (combination_id, {}) VALUES (?1, ?2)",
            Self::LINK_TABLE,
            Self::LINK_COLUMN
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let mut count = 0;
        for id in ids {
            count += stmt.execute(params![combination_id, id])?;
        }
        Ok(count)
    }

    /// 解除组合与该类实体的全部关联
    fn detach_combination_tx(conn: &Connection, combination_id: Uuid) -> RepositoryResult<usize> {
        let sql = format!("DELETE FROM {} WHERE combination_id = ?1", Self::LINK_TABLE);
        Ok(conn.execute(&sql, params![combination_id])?)
    }

    /// 组合当前挂载的实体标识
    fn linked_ids_tx(conn: &Connection, combination_id: Uuid) -> RepositoryResult<Vec<Identity>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE combination_id = ?1",
            Self::LINK_COLUMN,
            Self::LINK_TABLE
        );
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params![combination_id], |row| row.get::<_, Identity>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}
