// ==========================================
// 组合导入引擎 - 导出注册表
// ==========================================
// 职责: 按内容哈希读取只读导出实体
// 实现: 目录注册表（生产）/ 内存注册表（测试）
// ==========================================

pub mod file_registry;
pub mod memory_registry;

pub use file_registry::FileExportRegistry;
pub use memory_registry::MemoryExportRegistry;

use crate::domain::{ExportCombination, ExportIcon, ExportItem, ExportMachine, ExportMod, ExportRecipe};
use crate::importer::error::ImportResult;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// ExportRegistry Trait
// ==========================================
// 未知哈希一律返回 ImportError::UnknownSnapshotKey
pub trait ExportRegistry: Send + Sync {
    fn get_combination(&self, hash: &str) -> ImportResult<ExportCombination>;

    fn get_mod(&self, hash: &str) -> ImportResult<ExportMod>;

    fn get_item(&self, hash: &str) -> ImportResult<ExportItem>;

    fn get_machine(&self, hash: &str) -> ImportResult<ExportMachine>;

    fn get_recipe(&self, hash: &str) -> ImportResult<ExportRecipe>;

    fn get_icon(&self, hash: &str) -> ImportResult<ExportIcon>;

    /// 渲染后的图标（PNG 字节）
    fn get_rendered_icon(&self, hash: &str) -> ImportResult<Vec<u8>>;
}

/// 计算导出内容哈希（SHA-256 十六进制）
pub fn content_hash(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

// ==========================================
// ExportSnapshot - 单次导入运行的快照视图
// ==========================================
// 组合在构造时读取一次；实体按需经注册表加载
#[derive(Clone)]
pub struct ExportSnapshot {
    registry: Arc<dyn ExportRegistry>,
    combination_id: Uuid,
    combination: ExportCombination,
}

impl ExportSnapshot {
    /// 加载组合（组合哈希即组合 ID 的字符串形式）
    pub fn load(registry: Arc<dyn ExportRegistry>, combination_id: Uuid) -> ImportResult<Self> {
        let combination = registry.get_combination(&combination_id.to_string())?;
        Ok(Self {
            registry,
            combination_id,
            combination,
        })
    }

    pub fn combination_id(&self) -> Uuid {
        self.combination_id
    }

    pub fn combination(&self) -> &ExportCombination {
        &self.combination
    }

    pub fn registry(&self) -> &dyn ExportRegistry {
        self.registry.as_ref()
    }

    pub fn mods(&self) -> impl Iterator<Item = ImportResult<ExportMod>> + '_ {
        self.combination
            .mod_hashes
            .iter()
            .map(move |hash| self.registry.get_mod(hash))
    }

    pub fn items(&self) -> impl Iterator<Item = ImportResult<ExportItem>> + '_ {
        self.combination
            .item_hashes
            .iter()
            .map(move |hash| self.registry.get_item(hash))
    }

    pub fn machines(&self) -> impl Iterator<Item = ImportResult<ExportMachine>> + '_ {
        self.combination
            .machine_hashes
            .iter()
            .map(move |hash| self.registry.get_machine(hash))
    }

    pub fn recipes(&self) -> impl Iterator<Item = ImportResult<ExportRecipe>> + '_ {
        self.combination
            .recipe_hashes
            .iter()
            .map(move |hash| self.registry.get_recipe(hash))
    }
}
