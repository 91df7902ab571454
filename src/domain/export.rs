// ==========================================
// 组合导入引擎 - 导出快照数据模型
// ==========================================
// 用途: 外部导出注册表中的只读实体（按内容哈希寻址）
// 生命周期: 单次导入运行内不可变
// ==========================================

use crate::domain::types::{ItemType, RecipeMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 多语言文本: locale → 文本
///
/// 使用 BTreeMap 保证遍历顺序稳定
pub type LocalisedString = BTreeMap<String, String>;

// ==========================================
// ExportCombination - 组合（模组集合）
// ==========================================
// 各 *_hashes 列表的顺序即实体枚举顺序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportCombination {
    pub mod_names: Vec<String>,
    #[serde(default)]
    pub mod_hashes: Vec<String>,
    #[serde(default)]
    pub item_hashes: Vec<String>,
    #[serde(default)]
    pub machine_hashes: Vec<String>,
    #[serde(default)]
    pub recipe_hashes: Vec<String>,
    #[serde(default)]
    pub icon_hashes: Vec<String>,
}

// ==========================================
// ExportMod - 模组
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMod {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub titles: LocalisedString,
    #[serde(default)]
    pub descriptions: LocalisedString,
}

// ==========================================
// ExportItem - 物品/流体
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportItem {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub name: String,
    #[serde(default)]
    pub labels: LocalisedString,
    #[serde(default)]
    pub descriptions: LocalisedString,
}

// ==========================================
// ExportMachine - 机器
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMachine {
    pub name: String,
    #[serde(default)]
    pub labels: LocalisedString,
    #[serde(default)]
    pub descriptions: LocalisedString,
    #[serde(default)]
    pub crafting_categories: Vec<String>,
    pub crafting_speed: f64,
    #[serde(default)]
    pub item_slots: u32,
    #[serde(default)]
    pub fluid_input_slots: u32,
    #[serde(default)]
    pub fluid_output_slots: u32,
    #[serde(default)]
    pub module_slots: u32,
    #[serde(default)]
    pub energy_usage: f64,
    #[serde(default)]
    pub energy_usage_unit: String,
}

// ==========================================
// ExportRecipe - 配方
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecipe {
    pub name: String,
    pub mode: RecipeMode,
    #[serde(default)]
    pub labels: LocalisedString,
    #[serde(default)]
    pub descriptions: LocalisedString,
    pub crafting_time: f64,
    pub crafting_category: String,
    #[serde(default)]
    pub ingredients: Vec<ExportIngredient>,
    #[serde(default)]
    pub products: Vec<ExportProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportIngredient {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportProduct {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub name: String,
    pub amount_min: f64,
    pub amount_max: f64,
    #[serde(default = "default_probability")]
    pub probability: f64,
}

fn default_probability() -> f64 {
    1.0
}

// ==========================================
// ExportIcon - 图标（渲染结果单独按哈希读取）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportIcon {
    pub size: u32,
    #[serde(default)]
    pub entries: Vec<ExportIconEntry>,
}

/// 使用该图标的实体（type 可为 item/fluid/machine/recipe/mod）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportIconEntry {
    #[serde(rename = "type")]
    pub entry_type: String,
    pub name: String,
}
