use crate::domain::{Identity, Item, ItemType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{build_in_clause, id_batches, parse_text_column};
use crate::repository::EntityRepository;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[cfg(test)]
mod tests;

// ==========================================
// ItemRepository - 物品/流体仓储
// ==========================================
// 配方原料/产物引用物品；清理时这些引用同样算作“在用”
pub struct ItemRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ItemRepository {
    /// 创建新的物品仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按类型+名称查询物品
    pub fn find_by_name(&self, item_type: ItemType, name: &str) -> RepositoryResult<Option<Item>> {
        let conn = self.get_conn()?;
        let item = conn
            .query_row(
                "SELECT id, type, name FROM item WHERE type = ?1 AND name = ?2",
                params![item_type.as_str(), name],
                map_row,
            )
            .optional()?;
        Ok(item)
    }

    /// 物品总行数（跨组合）
    pub fn count_all(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM item", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

pub(crate) fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    let raw_type: String = row.get(1)?;
    Ok(Item {
        id: row.get(0)?,
        item_type: parse_text_column(1, "item.type", &raw_type, ItemType::parse)?,
        name: row.get(2)?,
    })
}

impl EntityRepository for ItemRepository {
    type Entity = Item;

    const LINK_TABLE: &'static str = "combination_item";
    const LINK_COLUMN: &'static str = "item_id";

    fn find_by_ids_tx(
        conn: &Connection,
        ids: &[Identity],
    ) -> RepositoryResult<HashMap<Identity, Item>> {
        let mut found = HashMap::with_capacity(ids.len());
        for batch in id_batches(ids) {
            let sql = format!(
                "SELECT id, type, name FROM item WHERE {}",
                build_in_clause("id", batch.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(batch.iter()), map_row)?;
            for row in rows {
                let item = row?;
                found.insert(item.id, item);
            }
        }
        Ok(found)
    }

    fn save_tx(conn: &Connection, entity: &Item, is_new: bool) -> RepositoryResult<()> {
        if is_new {
            conn.execute(
                "INSERT INTO item (id, type, name) VALUES (?1, ?2, ?3)",
                params![entity.id, entity.item_type.as_str(), entity.name],
            )?;
        } else {
            conn.execute(
                "UPDATE item SET type = ?2, name = ?3 WHERE id = ?1",
                params![entity.id, entity.item_type.as_str(), entity.name],
            )?;
        }
        Ok(())
    }

    fn remove_orphans_tx(conn: &Connection) -> RepositoryResult<usize> {
        let rows = conn.execute(
            r#"
            DELETE FROM item
            WHERE id NOT IN (SELECT item_id FROM combination_item)
              AND id NOT IN (SELECT item_id FROM recipe_ingredient)
              AND id NOT IN (SELECT item_id FROM recipe_product)
            "#,
            [],
        )?;
        Ok(rows)
    }
}
