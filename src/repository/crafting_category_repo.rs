use crate::domain::{CraftingCategory, Identity};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{build_in_clause, id_batches};
use crate::repository::EntityRepository;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// CraftingCategoryRepository - 制作类别仓储
// ==========================================
// 机器与配方通过标识引用类别；清理时这些引用同样算作“在用”
pub struct CraftingCategoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CraftingCategoryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 全部类别名称（按名称排序）
    pub fn list_names(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT name FROM crafting_category ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

impl EntityRepository for CraftingCategoryRepository {
    type Entity = CraftingCategory;

    const LINK_TABLE: &'static str = "combination_crafting_category";
    const LINK_COLUMN: &'static str = "crafting_category_id";

    fn find_by_ids_tx(
        conn: &Connection,
        ids: &[Identity],
    ) -> RepositoryResult<HashMap<Identity, CraftingCategory>> {
        let mut found = HashMap::with_capacity(ids.len());
        for batch in id_batches(ids) {
            let sql = format!(
                "SELECT id, name FROM crafting_category WHERE {}",
                build_in_clause("id", batch.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(batch.iter()), |row| {
                Ok(CraftingCategory {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?;
            for row in rows {
                let category = row?;
                found.insert(category.id, category);
            }
        }
        Ok(found)
    }

    fn save_tx(
        conn: &Connection,
        entity: &CraftingCategory,
        is_new: bool,
    ) -> RepositoryResult<()> {
        if is_new {
            conn.execute(
                "INSERT INTO crafting_category (id, name) VALUES (?1, ?2)",
                params![entity.id, entity.name],
            )?;
        } else {
            conn.execute(
                "UPDATE crafting_category SET name = ?2 WHERE id = ?1",
                params![entity.id, entity.name],
            )?;
        }
        Ok(())
    }

    fn remove_orphans_tx(conn: &Connection) -> RepositoryResult<usize> {
        let rows = conn.execute(
            r#"
            DELETE FROM crafting_category
            WHERE id NOT IN (SELECT crafting_category_id FROM combination_crafting_category)
              AND id NOT IN (SELECT crafting_category_id FROM machine_crafting_category)
              AND id NOT IN (SELECT crafting_category_id FROM recipe)
            "#,
            [],
        )?;
        Ok(rows)
    }
}
