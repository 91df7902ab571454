// ==========================================
// 组合导入引擎 - 应用上下文
// ==========================================
// 职责: 解析路径、打开数据库、组装注册表与配置
// 说明: 每个命令（含分块子进程）各自构建一次
// ==========================================

use crate::config::ConfigManager;
use crate::db;
use crate::export::{ExportRegistry, FileExportRegistry};
use crate::importer::error::ImportResult;
use crate::repository::RepositoryError;
use rusqlite::Connection;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;

/// 数据库与导出目录路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub db_path: PathBuf,
    pub export_dir: PathBuf,
}

impl AppPaths {
    /// 未显式指定时回退到用户数据目录
    pub fn resolve(database: Option<PathBuf>, export_dir: Option<PathBuf>) -> Self {
        Self {
            db_path: database.unwrap_or_else(get_default_db_path),
            export_dir: export_dir.unwrap_or_else(get_default_export_dir),
        }
    }

    /// 传给分块子进程的全局参数
    pub fn child_args(&self) -> Vec<OsString> {
        vec![
            OsString::from("--database"),
            self.db_path.clone().into_os_string(),
            OsString::from("--export-dir"),
            self.export_dir.clone().into_os_string(),
        ]
    }
}

/// 应用上下文
pub struct AppContext {
    pub paths: AppPaths,
    pub conn: Arc<Mutex<Connection>>,
    pub registry: Arc<dyn ExportRegistry>,
    pub config: ConfigManager,
}

impl AppContext {
    /// 打开数据库（含 schema 初始化）并挂载目录注册表
    pub fn open(paths: AppPaths) -> ImportResult<Self> {
        let conn = db::open_and_migrate(&paths.db_path).map_err(RepositoryError::from)?;
        info!(db = %paths.db_path.display(), export = %paths.export_dir.display(), "应用上下文就绪");

        let registry: Arc<dyn ExportRegistry> =
            Arc::new(FileExportRegistry::new(paths.export_dir.clone()));
        Ok(Self::from_parts(paths, conn, registry))
    }

    /// 由已有连接与注册表组装（测试使用内存注册表）
    pub fn from_parts(
        paths: AppPaths,
        conn: Connection,
        registry: Arc<dyn ExportRegistry>,
    ) -> Self {
        let conn = Arc::new(Mutex::new(conn));
        Self {
            paths,
            config: ConfigManager::from_connection(Arc::clone(&conn)),
            conn,
            registry,
        }
    }
}

fn app_data_dir() -> Option<PathBuf> {
    let dir = dirs::data_local_dir()?.join("combination-import");
    // 确保目录存在
    std::fs::create_dir_all(&dir).ok();
    Some(dir)
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("COMBINATION_IMPORT_DB") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    app_data_dir()
        .map(|dir| dir.join("combinations.db"))
        .unwrap_or_else(|| PathBuf::from("./combinations.db"))
}

/// 获取默认导出目录
pub fn get_default_export_dir() -> PathBuf {
    app_data_dir()
        .map(|dir| dir.join("export"))
        .unwrap_or_else(|| PathBuf::from("./export"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(path.to_string_lossy().ends_with(".db"));
    }

    #[test]
    fn test_child_args_carry_resolved_paths() {
        let paths = AppPaths::resolve(Some("a.db".into()), Some("exports".into()));
        let args: Vec<String> = paths
            .child_args()
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();
        assert_eq!(args, vec!["--database", "a.db", "--export-dir", "exports"]);
    }

    #[test]
    fn test_open_creates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::resolve(
            Some(dir.path().join("test.db")),
            Some(dir.path().join("export")),
        );
        let ctx = AppContext::open(paths).unwrap();

        let conn = ctx.conn.lock().unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'combination'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }
}
