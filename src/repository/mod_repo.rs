use crate::domain::{Identity, Mod};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{build_in_clause, id_batches};
use crate::repository::EntityRepository;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// ModRepository - 模组仓储
// ==========================================
pub struct ModRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ModRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询组合挂载的全部模组（按名称）
    pub fn list_for_combination(&self, combination_id: Uuid) -> RepositoryResult<Vec<Mod>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT m.id, m.name, m.version, m.author
            FROM game_mod m
            JOIN combination_mod cm ON cm.mod_id = m.id
            WHERE cm.combination_id = ?1
            ORDER BY m.name
            "#,
        )?;
        let mods = stmt
            .query_map(params![combination_id], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(mods)
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Mod> {
    Ok(Mod {
        id: row.get(0)?,
        name: row.get(1)?,
        version: row.get(2)?,
        author: row.get(3)?,
    })
}

impl EntityRepository for ModRepository {
    type Entity = Mod;

    const LINK_TABLE: &'static str = "combination_mod";
    const LINK_COLUMN: &'static str = "mod_id";

    fn find_by_ids_tx(
        conn: &Connection,
        ids: &[Identity],
    ) -> RepositoryResult<HashMap<Identity, Mod>> {
        let mut found = HashMap::with_capacity(ids.len());
        for batch in id_batches(ids) {
            let sql = format!(
                "SELECT id, name, version, author FROM game_mod WHERE {}",
                build_in_clause("id", batch.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(batch.iter()), map_row)?;
            for row in rows {
                let m = row?;
                found.insert(m.id, m);
            }
        }
        Ok(found)
    }

    fn save_tx(conn: &Connection, entity: &Mod, is_new: bool) -> RepositoryResult<()> {
        if is_new {
            conn.execute(
                "INSERT INTO game_mod (id, name, version, author) VALUES (?1, ?2, ?3, ?4)",
                params![entity.id, entity.name, entity.version, entity.author],
            )?;
        } else {
            conn.execute(
                "UPDATE game_mod SET name = ?2, version = ?3, author = ?4 WHERE id = ?1",
                params![entity.id, entity.name, entity.version, entity.author],
            )?;
        }
        Ok(())
    }

    fn remove_orphans_tx(conn: &Connection) -> RepositoryResult<usize> {
        let rows = conn.execute(
            "DELETE FROM game_mod WHERE id NOT IN (SELECT mod_id FROM combination_mod)",
            [],
        )?;
        Ok(rows)
    }
}
