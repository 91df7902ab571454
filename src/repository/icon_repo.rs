use crate::domain::{Icon, IconImage, Identity};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// IconRepository - 图标仓储
// ==========================================
// icon_image 按内容标识共享；icon 行按组合整体替换
pub struct IconRepository {
    conn: Arc<Mutex<Connection>>,
}

impl IconRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询组合的图标（按 type/name 排序）
    pub fn list_for_combination(&self, combination_id: Uuid) -> RepositoryResult<Vec<Icon>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT combination_id, type, name, image_id
            FROM icon WHERE combination_id = ?1
            ORDER BY type, name
            "#,
        )?;
        let icons = stmt
            .query_map(params![combination_id], |row| {
                Ok(Icon {
                    combination_id: row.get(0)?,
                    icon_type: row.get(1)?,
                    name: row.get(2)?,
                    image_id: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(icons)
    }

    /// 按标识读取图片
    pub fn find_image(&self, id: Identity) -> RepositoryResult<Option<IconImage>> {
        let conn = self.get_conn()?;
        let image = conn
            .query_row(
                "SELECT id, size, contents FROM icon_image WHERE id = ?1",
                params![id],
                |row| {
                    Ok(IconImage {
                        id: row.get(0)?,
                        size: row.get(1)?,
                        contents: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(image)
    }

    // ==========================================
    // 事务内操作
    // ==========================================

    pub fn image_exists_tx(conn: &Connection, id: Identity) -> RepositoryResult<bool> {
        let exists = conn
            .query_row(
                "SELECT 1 FROM icon_image WHERE id = ?1",
                params![id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(exists)
    }

    pub fn save_image_tx(conn: &Connection, image: &IconImage) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO icon_image (id, size, contents) VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET size = excluded.size, contents = excluded.contents
            "#,
            params![image.id, image.size, image.contents],
        )?;
        Ok(())
    }

    pub fn clear_icons_tx(conn: &Connection, combination_id: Uuid) -> RepositoryResult<usize> {
        Ok(conn.execute(
            "DELETE FROM icon WHERE combination_id = ?1",
            params![combination_id],
        )?)
    }

    /// 写入图标行（同组合同 type/name 以后写入为准）
    pub fn save_icon_tx(conn: &Connection, icon: &Icon) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO icon (combination_id, type, name, image_id) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(combination_id, type, name) DO UPDATE SET image_id = excluded.image_id
            "#,
            params![icon.combination_id, icon.icon_type, icon.name, icon.image_id],
        )?;
        Ok(())
    }

    pub fn remove_orphan_images_tx(conn: &Connection) -> RepositoryResult<usize> {
        Ok(conn.execute(
            "DELETE FROM icon_image WHERE id NOT IN (SELECT image_id FROM icon)",
            [],
        )?)
    }
}
