// ==========================================
// 组合导入引擎 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 传播: 分块内错误终止该分块事务；父进程只保留提取出的消息
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 对账错误 =====
    #[error("缺少实体 {kind}: {key}")]
    MissingEntity { kind: String, key: String },

    #[error("导出快照中不存在 {kind} 哈希: {hash}")]
    UnknownSnapshotKey { kind: String, hash: String },

    // ===== 调度错误 =====
    #[error("unknown part: {0}")]
    UnknownChunkSpec(String),

    #[error("{message}")]
    ChunkProcessFailure {
        part: String,
        offset: usize,
        limit: usize,
        message: String,
    },

    #[error("子进程启动失败: {0}")]
    ProcessSpawnError(String),

    // ===== 数据错误 =====
    #[error("导出数据格式错误 ({context}): {message}")]
    ExportFormatError { context: String, message: String },

    #[error("导出文件读取失败: {0}")]
    FileReadError(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ImportError {
    pub fn missing(kind: impl Into<String>, key: impl Into<String>) -> Self {
        ImportError::MissingEntity {
            kind: kind.into(),
            key: key.into(),
        }
    }

    pub fn unknown_hash(kind: impl Into<String>, hash: impl Into<String>) -> Self {
        ImportError::UnknownSnapshotKey {
            kind: kind.into(),
            hash: hash.into(),
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>（统一经仓储层分类）
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Repository(RepositoryError::from(err))
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
