// ==========================================
// 内存导出注册表
// ==========================================
// 用途: 测试与单进程导入；写入时按 JSON 内容计算哈希
// ==========================================

use crate::domain::{ExportCombination, ExportIcon, ExportItem, ExportMachine, ExportMod, ExportRecipe};
use crate::export::{content_hash, ExportRegistry};
use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
pub struct MemoryExportRegistry {
    combinations: HashMap<String, ExportCombination>,
    mods: HashMap<String, ExportMod>,
    items: HashMap<String, ExportItem>,
    machines: HashMap<String, ExportMachine>,
    recipes: HashMap<String, ExportRecipe>,
    icons: HashMap<String, ExportIcon>,
    rendered_icons: HashMap<String, Vec<u8>>,
}

fn hash_of<T: serde::Serialize>(value: &T) -> String {
    content_hash(&serde_json::to_vec(value).unwrap_or_default())
}

fn lookup<T: Clone>(map: &HashMap<String, T>, kind: &str, hash: &str) -> ImportResult<T> {
    map.get(hash)
        .cloned()
        .ok_or_else(|| ImportError::unknown_hash(kind, hash))
}

impl MemoryExportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_combination(&mut self, id: Uuid, combination: ExportCombination) {
        self.combinations.insert(id.to_string(), combination);
    }

    pub fn insert_mod(&mut self, value: ExportMod) -> String {
        let hash = hash_of(&value);
        self.mods.insert(hash.clone(), value);
        hash
    }

    pub fn insert_item(&mut self, value: ExportItem) -> String {
        let hash = hash_of(&value);
        self.items.insert(hash.clone(), value);
        hash
    }

    pub fn insert_machine(&mut self, value: ExportMachine) -> String {
        let hash = hash_of(&value);
        self.machines.insert(hash.clone(), value);
        hash
    }

    pub fn insert_recipe(&mut self, value: ExportRecipe) -> String {
        let hash = hash_of(&value);
        self.recipes.insert(hash.clone(), value);
        hash
    }

    /// 写入图标及其渲染结果（两者共用同一哈希）
    pub fn insert_icon(&mut self, value: ExportIcon, rendered: Vec<u8>) -> String {
        let hash = hash_of(&value);
        self.icons.insert(hash.clone(), value);
        self.rendered_icons.insert(hash.clone(), rendered);
        hash
    }
}

impl ExportRegistry for MemoryExportRegistry {
    fn get_combination(&self, hash: &str) -> ImportResult<ExportCombination> {
        lookup(&self.combinations, "combination", hash)
    }

    fn get_mod(&self, hash: &str) -> ImportResult<ExportMod> {
        lookup(&self.mods, "mod", hash)
    }

    fn get_item(&self, hash: &str) -> ImportResult<ExportItem> {
        lookup(&self.items, "item", hash)
    }

    fn get_machine(&self, hash: &str) -> ImportResult<ExportMachine> {
        lookup(&self.machines, "machine", hash)
    }

    fn get_recipe(&self, hash: &str) -> ImportResult<ExportRecipe> {
        lookup(&self.recipes, "recipe", hash)
    }

    fn get_icon(&self, hash: &str) -> ImportResult<ExportIcon> {
        lookup(&self.icons, "icon", hash)
    }

    fn get_rendered_icon(&self, hash: &str) -> ImportResult<Vec<u8>> {
        lookup(&self.rendered_icons, "rendered-icon", hash)
    }
}
