// ==========================================
// 组合导入引擎 - 核心库
// ==========================================
// 职责: 模组组合导出 → SQLite 关系库的对账与分块导入
// 技术栈: Rust + SQLite + tokio 子进程
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 对账层 - 标识计算与实体对账
pub mod importer;

// 导出注册表 - 只读快照
pub mod export;

// 调度层 - 分块编排与子进程
pub mod engine;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// SQL 性能追踪
pub mod perf;

// 日志系统
pub mod logging;

// 应用层 - 命令行
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ImportPart, ItemType, RecipeMode, TranslationType};

// 领域实体
pub use domain::{
    Combination, CraftingCategory, Icon, IconImage, Identity, Item, Machine, Mod, Recipe,
    Translation,
};

// 对账
pub use importer::{
    calculate_id, ChunkReport, EntityReconciler, ImportError, ImportResult, TranslationAggregator,
};

// 调度
pub use engine::{
    ChunkDispatcher, ImportEvent, ImportOrchestrator, ImportProgressListener, ImportSummary,
    InProcessDispatcher, ProcessDispatcher,
};

// 注册表
pub use export::{ExportRegistry, ExportSnapshot, FileExportRegistry, MemoryExportRegistry};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Combination Import";
