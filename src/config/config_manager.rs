// ==========================================
// 组合导入引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// 解析: 宽松；无法识别的取值记录告警并回退默认值
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::config::DEFAULT_CHUNK_SIZE;
use crate::domain::ImportPart;
use crate::repository::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn get_parts_or_default(&self, key: &str) -> RepositoryResult<Vec<ImportPart>> {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(ImportPart::ALL.to_vec());
        };

        let mut parts = Vec::new();
        for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match ImportPart::parse(name) {
                Some(part) if !parts.contains(&part) => parts.push(part),
                Some(_) => {}
                None => warn!(key, value = name, "配置中存在未知分部，已忽略"),
            }
        }

        if parts.is_empty() {
            warn!(key, raw = %raw, "分部配置为空，使用默认值");
            Ok(ImportPart::ALL.to_vec())
        } else {
            Ok(parts)
        }
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_chunk_size(&self) -> RepositoryResult<usize> {
        let Some(raw) = self.get_config_value(config_keys::CHUNK_SIZE)? else {
            return Ok(DEFAULT_CHUNK_SIZE);
        };
        match raw.trim().parse::<usize>() {
            Ok(size) if size > 0 => Ok(size),
            _ => {
                warn!(value = %raw, "chunk_size 配置无效，使用默认值");
                Ok(DEFAULT_CHUNK_SIZE)
            }
        }
    }

    async fn get_import_parts(&self) -> RepositoryResult<Vec<ImportPart>> {
        self.get_parts_or_default(config_keys::PARTS)
    }

    async fn get_orphan_parts(&self) -> RepositoryResult<Vec<ImportPart>> {
        self.get_parts_or_default(config_keys::ORPHAN_PARTS)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const CHUNK_SIZE: &str = "import.chunk_size";
    /// 逗号分隔的分部名称
    pub const PARTS: &str = "import.parts";
    pub const ORPHAN_PARTS: &str = "import.orphan_parts";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportSettings;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let settings = ImportSettings::load(&manager()).await.unwrap();
        assert_eq!(settings, ImportSettings::default());
        assert_eq!(settings.chunk_size, 256);
    }

    #[tokio::test]
    async fn test_overrides_are_parsed() {
        let config = manager();
        config.set_config_value(config_keys::CHUNK_SIZE, "64").unwrap();
        config
            .set_config_value(config_keys::PARTS, "mod, item ,item,bogus")
            .unwrap();
        config.set_config_value(config_keys::ORPHAN_PARTS, "recipe").unwrap();

        let settings = ImportSettings::load(&config).await.unwrap();
        assert_eq!(settings.chunk_size, 64);
        assert_eq!(settings.parts, vec![ImportPart::Mod, ImportPart::Item]);
        assert_eq!(settings.orphan_parts, vec![ImportPart::Recipe]);
    }

    #[tokio::test]
    async fn test_invalid_values_fall_back() {
        let config = manager();
        config.set_config_value(config_keys::CHUNK_SIZE, "0").unwrap();
        config.set_config_value(config_keys::PARTS, "bogus").unwrap();

        assert_eq!(config.get_chunk_size().await.unwrap(), DEFAULT_CHUNK_SIZE);
        assert_eq!(config.get_import_parts().await.unwrap(), ImportPart::ALL.to_vec());
    }
}
