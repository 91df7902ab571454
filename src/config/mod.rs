// ==========================================
// 组合导入引擎 - 配置层
// ==========================================
// 职责: 导入配置（分块大小、分部顺序、孤儿清理范围）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

/// 默认分块大小
pub const DEFAULT_CHUNK_SIZE: usize = 256;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::{ImportConfigReader, ImportSettings};
