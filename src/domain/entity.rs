// ==========================================
// 组合导入引擎 - 数据库实体
// ==========================================
// 用途: 导出实体的持久化对应物
// 标识: 由语义内容计算的确定性摘要（见 importer::identity）
// ==========================================

use crate::domain::types::{ItemType, RecipeMode, TranslationType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 实体标识（16 字节摘要，以 UUID 形式存储）
pub type Identity = Uuid;

// ==========================================
// Combination - 组合聚合根
// ==========================================
// 对账器只读取/挂载，不创建
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    pub id: Uuid,
    pub mod_names: Vec<String>,
    pub imported_at: DateTime<Utc>,
    pub last_usage_at: DateTime<Utc>,
}

// ==========================================
// Mod - 模组
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mod {
    pub id: Identity,
    pub name: String,
    pub version: String,
    pub author: String, // 不参与标识计算
}

// ==========================================
// CraftingCategory - 制作类别
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftingCategory {
    pub id: Identity,
    pub name: String,
}

// ==========================================
// Item - 物品/流体
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: Identity,
    pub item_type: ItemType,
    pub name: String,
}

// ==========================================
// Machine - 机器
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: Identity,
    pub name: String,
    pub crafting_categories: Vec<CraftingCategory>, // 按名称排序
    pub crafting_speed: f64,
    pub item_slots: u32,
    pub fluid_input_slots: u32,
    pub fluid_output_slots: u32,
    pub module_slots: u32,
    pub energy_usage: f64,
    pub energy_usage_unit: String,
}

// ==========================================
// Recipe - 配方（原料/产物有序）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Identity,
    pub name: String,
    pub mode: RecipeMode,
    pub crafting_time: f64,
    pub crafting_category: CraftingCategory,
    pub ingredients: Vec<RecipeIngredient>,
    pub products: Vec<RecipeProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub item: Item,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeProduct {
    pub item: Item,
    pub amount_min: f64,
    pub amount_max: f64,
    pub probability: f64,
}

// ==========================================
// Translation - 翻译
// ==========================================
// 键: (locale, type, name)
// 两个 duplicated 标志表示该文本与机器/配方的文本重复
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub id: Identity,
    pub locale: String,
    pub translation_type: TranslationType,
    pub name: String,
    pub value: String,
    pub description: String,
    pub is_duplicated_by_machine: bool,
    pub is_duplicated_by_recipe: bool,
}

// ==========================================
// IconImage / Icon - 图标
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub id: Identity,
    pub size: u32,
    pub contents: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    pub combination_id: Uuid,
    pub icon_type: String,
    pub name: String,
    pub image_id: Identity,
}
