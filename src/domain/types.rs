// ==========================================
// 组合导入引擎 - 领域类型定义
// ==========================================
// 职责: 导入分部（part）、物品类型、翻译类型、配方模式
// 序列化格式: kebab-case（与命令行/配置一致）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 导入分部 (Import Part)
// ==========================================
// 编译期注册表: 每个分部对应一个实体对账器
// 声明顺序即导入顺序，清理按逆序执行
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportPart {
    Mod,              // 模组
    CraftingCategory, // 制作类别
    Item,             // 物品/流体
    Machine,          // 机器
    Recipe,           // 配方
    Translation,      // 翻译
}

impl ImportPart {
    /// 全部分部（声明顺序）
    pub const ALL: [ImportPart; 6] = [
        ImportPart::Mod,
        ImportPart::CraftingCategory,
        ImportPart::Item,
        ImportPart::Machine,
        ImportPart::Recipe,
        ImportPart::Translation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportPart::Mod => "mod",
            ImportPart::CraftingCategory => "crafting-category",
            ImportPart::Item => "item",
            ImportPart::Machine => "machine",
            ImportPart::Recipe => "recipe",
            ImportPart::Translation => "translation",
        }
    }

    /// 按名称解析分部，未注册的名称返回 None
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim();
        Self::ALL.into_iter().find(|part| part.as_str() == normalized)
    }
}

impl fmt::Display for ImportPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 物品类型 (Item Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Item,
    Fluid,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Item => "item",
            ItemType::Fluid => "fluid",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "item" => Some(ItemType::Item),
            "fluid" => Some(ItemType::Fluid),
            _ => None,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 翻译类型 (Translation Type)
// ==========================================
// item/fluid 为去重目标，machine/recipe 为被消除的一方
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationType {
    Mod,
    Item,
    Fluid,
    Machine,
    Recipe,
}

impl TranslationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranslationType::Mod => "mod",
            TranslationType::Item => "item",
            TranslationType::Fluid => "fluid",
            TranslationType::Machine => "machine",
            TranslationType::Recipe => "recipe",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "mod" => Some(TranslationType::Mod),
            "item" => Some(TranslationType::Item),
            "fluid" => Some(TranslationType::Fluid),
            "machine" => Some(TranslationType::Machine),
            "recipe" => Some(TranslationType::Recipe),
            _ => None,
        }
    }
}

impl From<ItemType> for TranslationType {
    fn from(item_type: ItemType) -> Self {
        match item_type {
            ItemType::Item => TranslationType::Item,
            ItemType::Fluid => TranslationType::Fluid,
        }
    }
}

impl fmt::Display for TranslationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 配方模式 (Recipe Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeMode {
    Normal,
    Expensive,
}

impl RecipeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeMode::Normal => "normal",
            RecipeMode::Expensive => "expensive",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "normal" => Some(RecipeMode::Normal),
            "expensive" => Some(RecipeMode::Expensive),
            _ => None,
        }
    }
}

impl fmt::Display for RecipeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_part_parse_round_trip() {
        for part in ImportPart::ALL {
            assert_eq!(ImportPart::parse(part.as_str()), Some(part));
        }
        assert_eq!(ImportPart::parse("bogus"), None);
        assert_eq!(ImportPart::parse(" item "), Some(ImportPart::Item));
    }

    #[test]
    fn test_translation_type_from_item_type() {
        assert_eq!(TranslationType::from(ItemType::Fluid), TranslationType::Fluid);
        assert_eq!(TranslationType::from(ItemType::Item), TranslationType::Item);
    }
}
