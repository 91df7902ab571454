// ==========================================
// 组合导入引擎 - 领域模型层
// ==========================================
// 职责: 定义导出实体、数据库实体与领域类型
// 红线: 不含数据访问逻辑,不含导入流程
// ==========================================

pub mod entity;
pub mod export;
pub mod types;

// 重导出核心类型
pub use entity::{
    Combination, CraftingCategory, Icon, IconImage, Identity, Item, Machine, Mod, Recipe,
    RecipeIngredient, RecipeProduct, Translation,
};
pub use export::{
    ExportCombination, ExportIcon, ExportIconEntry, ExportIngredient, ExportItem, ExportMachine,
    ExportMod, ExportProduct, ExportRecipe, LocalisedString,
};
pub use types::{ImportPart, ItemType, RecipeMode, TranslationType};
