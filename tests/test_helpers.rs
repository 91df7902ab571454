// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、应用上下文、示例导出数据
// ==========================================

#![allow(dead_code)]

use combination_import::app::{AppContext, AppPaths};
use combination_import::db;
use combination_import::domain::{
    ExportCombination, ExportIcon, ExportIconEntry, ExportIngredient, ExportItem, ExportMachine,
    ExportMod, ExportProduct, ExportRecipe, ItemType, LocalisedString, RecipeMode,
};
use combination_import::export::{ExportRegistry, MemoryExportRegistry};
use std::error::Error;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

/// 示例组合 ID
pub fn sample_combination_id() -> Uuid {
    Uuid::from_u128(0x5a3c_0000_0000_4000_8000_0000_0000_0001)
}

/// 创建临时目录中的数据库与应用上下文
///
/// # 返回
/// - TempDir: 临时目录（需要保持存活）
/// - AppContext: 使用给定注册表的上下文
pub fn create_test_context(
    registry: MemoryExportRegistry,
) -> Result<(TempDir, AppContext), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let paths = AppPaths::resolve(
        Some(dir.path().join("test.db")),
        Some(dir.path().join("export")),
    );
    let conn = db::open_and_migrate(&paths.db_path)?;
    let registry: Arc<dyn ExportRegistry> = Arc::new(registry);
    Ok((dir, AppContext::from_parts(paths, conn, registry)))
}

pub fn text(pairs: &[(&str, &str)]) -> LocalisedString {
    pairs
        .iter()
        .map(|(locale, value)| (locale.to_string(), value.to_string()))
        .collect()
}

pub fn export_item(item_type: ItemType, name: &str, label: &str) -> ExportItem {
    ExportItem {
        item_type,
        name: name.to_string(),
        labels: text(&[("en", label)]),
        descriptions: LocalisedString::new(),
    }
}

pub fn export_machine(name: &str, label: &str, categories: &[&str]) -> ExportMachine {
    ExportMachine {
        name: name.to_string(),
        labels: text(&[("en", label)]),
        descriptions: LocalisedString::new(),
        crafting_categories: categories.iter().map(|c| c.to_string()).collect(),
        crafting_speed: 0.75,
        item_slots: 4,
        fluid_input_slots: 0,
        fluid_output_slots: 0,
        module_slots: 2,
        energy_usage: 150.0,
        energy_usage_unit: "kW".to_string(),
    }
}

pub fn export_recipe(
    name: &str,
    label: &str,
    category: &str,
    ingredients: &[(&str, f64)],
    products: &[(&str, f64)],
) -> ExportRecipe {
    ExportRecipe {
        name: name.to_string(),
        mode: RecipeMode::Normal,
        labels: text(&[("en", label)]),
        descriptions: LocalisedString::new(),
        crafting_time: 0.5,
        crafting_category: category.to_string(),
        ingredients: ingredients
            .iter()
            .map(|(name, amount)| ExportIngredient {
                item_type: ItemType::Item,
                name: name.to_string(),
                amount: *amount,
            })
            .collect(),
        products: products
            .iter()
            .map(|(name, amount)| ExportProduct {
                item_type: ItemType::Item,
                name: name.to_string(),
                amount_min: *amount,
                amount_max: *amount,
                probability: 1.0,
            })
            .collect(),
    }
}

/// 示例导出数据构建器
pub struct SampleExport {
    pub registry: MemoryExportRegistry,
    pub combination: ExportCombination,
}

impl SampleExport {
    pub fn new() -> Self {
        Self {
            registry: MemoryExportRegistry::new(),
            combination: ExportCombination {
                mod_names: vec!["base".to_string()],
                ..Default::default()
            },
        }
    }

    pub fn with_mod(mut self, name: &str, title: &str) -> Self {
        let hash = self.registry.insert_mod(ExportMod {
            name: name.to_string(),
            version: "1.1.0".to_string(),
            author: "Wube".to_string(),
            titles: text(&[("en", title)]),
            descriptions: LocalisedString::new(),
        });
        self.combination.mod_hashes.push(hash);
        self
    }

    pub fn with_item(mut self, item: ExportItem) -> Self {
        let hash = self.registry.insert_item(item);
        self.combination.item_hashes.push(hash);
        self
    }

    pub fn with_machine(mut self, machine: ExportMachine) -> Self {
        let hash = self.registry.insert_machine(machine);
        self.combination.machine_hashes.push(hash);
        self
    }

    pub fn with_recipe(mut self, recipe: ExportRecipe) -> Self {
        let hash = self.registry.insert_recipe(recipe);
        self.combination.recipe_hashes.push(hash);
        self
    }

    pub fn with_icon(mut self, size: u32, entries: &[(&str, &str)], rendered: &[u8]) -> Self {
        let hash = self.registry.insert_icon(
            ExportIcon {
                size,
                entries: entries
                    .iter()
                    .map(|(entry_type, name)| ExportIconEntry {
                        entry_type: entry_type.to_string(),
                        name: name.to_string(),
                    })
                    .collect(),
            },
            rendered.to_vec(),
        );
        self.combination.icon_hashes.push(hash);
        self
    }

    pub fn build(mut self, combination_id: Uuid) -> MemoryExportRegistry {
        self.registry
            .insert_combination(combination_id, self.combination);
        self.registry
    }
}

/// 标准示例: 1 个模组、4 个物品/流体、3 台机器（其中一台无类别）、2 个配方
///
/// 机器 assembling-machine-1 与同名物品文本相同，翻译去重后只剩物品一侧
pub fn sample_export() -> SampleExport {
    SampleExport::new()
        .with_mod("base", "Base mod")
        .with_item(export_item(ItemType::Item, "iron-plate", "Iron plate"))
        .with_item(export_item(ItemType::Item, "iron-gear-wheel", "Iron gear wheel"))
        .with_item(export_item(
            ItemType::Item,
            "assembling-machine-1",
            "Assembling machine 1",
        ))
        .with_item(export_item(ItemType::Fluid, "water", "Water"))
        .with_machine(export_machine(
            "assembling-machine-1",
            "Assembling machine 1",
            &["crafting", "advanced-crafting"],
        ))
        .with_machine(export_machine("character", "Character", &["crafting"]))
        .with_machine(export_machine("burner-inserter", "Burner inserter", &[]))
        .with_recipe(export_recipe(
            "iron-gear-wheel",
            "Iron gear wheel",
            "crafting",
            &[("iron-plate", 2.0)],
            &[("iron-gear-wheel", 1.0)],
        ))
        .with_recipe(export_recipe(
            "assembling-machine-1",
            "Assembly recipe",
            "advanced-crafting",
            &[("iron-plate", 9.0), ("iron-gear-wheel", 5.0)],
            &[("assembling-machine-1", 1.0)],
        ))
}
