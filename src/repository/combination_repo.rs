use crate::domain::Combination;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// CombinationRepository - 组合仓储
// ==========================================
// 组合行由 import 命令写入；分块对账只读取
pub struct CombinationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CombinationRepository {
    /// 创建新的组合仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按 ID 查询组合
    pub fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Combination>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, id)
    }

    /// 写入或刷新组合（导入时间更新为当前时间）
    pub fn upsert(&self, combination: &Combination) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::upsert_tx(&conn, combination)
    }

    /// 标记组合被使用
    pub fn touch_last_usage(&self, id: Uuid) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE combination SET last_usage_at = ?1 WHERE id = ?2",
            params![Utc::now(), id],
        )?;
        Ok(rows)
    }

    // ==========================================
    // 事务内操作
    // ==========================================

    pub fn find_by_id_tx(conn: &Connection, id: Uuid) -> RepositoryResult<Option<Combination>> {
        let raw = conn
            .query_row(
                "SELECT id, mod_names, imported_at, last_usage_at FROM combination WHERE id = ?1",
                params![id],
                map_row,
            )
            .optional()?;

        match raw {
            Some((combination, mod_names_json)) => Ok(Some(Combination {
                mod_names: serde_json::from_str(&mod_names_json)?,
                ..combination
            })),
            None => Ok(None),
        }
    }

    pub fn upsert_tx(conn: &Connection, combination: &Combination) -> RepositoryResult<()> {
        let mod_names = serde_json::to_string(&combination.mod_names)?;
        conn.execute(
            r#"
            INSERT INTO combination (id, mod_names, imported_at, last_usage_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                mod_names = excluded.mod_names,
                imported_at = excluded.imported_at,
                last_usage_at = excluded.last_usage_at
            "#,
            params![
                combination.id,
                mod_names,
                combination.imported_at,
                combination.last_usage_at,
            ],
        )?;
        Ok(())
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<(Combination, String)> {
    Ok((
        Combination {
            id: row.get(0)?,
            mod_names: Vec::new(),
            imported_at: row.get(2)?,
            last_usage_at: row.get(3)?,
        },
        row.get(1)?,
    ))
}
