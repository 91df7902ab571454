// ==========================================
// 组合导入引擎 - 对账层
// ==========================================
// 职责: 导出实体 → 数据库实体（标识计算、差异对账、翻译去重）
// 红线: 不含调度逻辑；每个分块自带事务
// ==========================================

// 模块声明
pub mod cache;
pub mod crafting_category;
pub mod error;
pub mod identity;
pub mod item;
pub mod machine;
pub mod mods;
pub mod recipe;
pub mod reconciler;
pub mod registry;
pub mod translation;
pub mod translation_aggregator;

// 重导出核心类型
pub use cache::IdentityCache;
pub use error::{ImportError, ImportResult};
pub use identity::{calculate_id, Identifiable};
pub use reconciler::{ChunkReport, EntityReconciler, ReconcileKind, Reconciler};
pub use translation_aggregator::{TranslationAggregator, TranslationKey};
