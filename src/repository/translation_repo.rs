use crate::domain::{Identity, Translation, TranslationType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{build_in_clause, id_batches, parse_text_column};
use crate::repository::EntityRepository;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// TranslationRepository - 翻译仓储
// ==========================================
pub struct TranslationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TranslationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询组合挂载的翻译（按 locale/type/name 排序）
    pub fn list_for_combination(&self, combination_id: Uuid) -> RepositoryResult<Vec<Translation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.id, t.locale, t.type, t.name, t.value, t.description,
                   t.is_duplicated_by_machine, t.is_duplicated_by_recipe
            FROM translation t
            JOIN combination_translation ct ON ct.translation_id = t.id
            WHERE ct.combination_id = ?1
            ORDER BY t.locale, t.type, t.name
            "#,
        )?;
        let translations = stmt
            .query_map(params![combination_id], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(translations)
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Translation> {
    let raw_type: String = row.get(2)?;
    Ok(Translation {
        id: row.get(0)?,
        locale: row.get(1)?,
        translation_type: parse_text_column(2, "translation.type", &raw_type, TranslationType::parse)?,
        name: row.get(3)?,
        value: row.get(4)?,
        description: row.get(5)?,
        is_duplicated_by_machine: row.get(6)?,
        is_duplicated_by_recipe: row.get(7)?,
    })
}

impl EntityRepository for TranslationRepository {
    type Entity = Translation;

    const LINK_TABLE: &'static str = "combination_translation";
    const LINK_COLUMN: &'static str = "translation_id";

    fn find_by_ids_tx(
        conn: &Connection,
        ids: &[Identity],
    ) -> RepositoryResult<HashMap<Identity, Translation>> {
        let mut found = HashMap::with_capacity(ids.len());
        for batch in id_batches(ids) {
            let sql = format!(
                r#"
                SELECT id, locale, type, name, value, description,
                       is_duplicated_by_machine, is_duplicated_by_recipe
                FROM translation WHERE {}
                "#,
                build_in_clause("id", batch.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(batch.iter()), map_row)?;
            for row in rows {
                let translation = row?;
                found.insert(translation.id, translation);
            }
        }
        Ok(found)
    }

    fn save_tx(conn: &Connection, entity: &Translation, is_new: bool) -> RepositoryResult<()> {
        let values = params![
            entity.id,
            entity.locale,
            entity.translation_type.as_str(),
            entity.name,
            entity.value,
            entity.description,
            entity.is_duplicated_by_machine,
            entity.is_duplicated_by_recipe,
        ];

        if is_new {
            conn.execute(
                r#"
                INSERT INTO translation (
                    id, locale, type, name, value, description,
                    is_duplicated_by_machine, is_duplicated_by_recipe
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                values,
            )?;
        } else {
            conn.execute(
                r#"
                UPDATE translation SET
                    locale = ?2, type = ?3, name = ?4, value = ?5, description = ?6,
                    is_duplicated_by_machine = ?7, is_duplicated_by_recipe = ?8
                WHERE id = ?1
                "#,
                values,
            )?;
        }
        Ok(())
    }

    fn remove_orphans_tx(conn: &Connection) -> RepositoryResult<usize> {
        let rows = conn.execute(
            "DELETE FROM translation WHERE id NOT IN (SELECT translation_id FROM combination_translation)",
            [],
        )?;
        Ok(rows)
    }
}
