// ==========================================
// 组合导入引擎 - 导入配置读取 Trait
// ==========================================
// 职责: 定义编排器所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含导入逻辑
// ==========================================

use crate::domain::ImportPart;
use crate::repository::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 每个分块的条目数
    ///
    /// # 默认值
    /// - 256
    async fn get_chunk_size(&self) -> RepositoryResult<usize>;

    /// 按导入顺序排列的分部列表
    ///
    /// # 默认值
    /// - mod, crafting-category, item, machine, recipe, translation
    async fn get_import_parts(&self) -> RepositoryResult<Vec<ImportPart>>;

    /// 需要孤儿清理的分部
    ///
    /// # 默认值
    /// - 全部分部
    async fn get_orphan_parts(&self) -> RepositoryResult<Vec<ImportPart>>;
}

// ==========================================
// ImportSettings - 一次运行的配置快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    pub chunk_size: usize,
    pub parts: Vec<ImportPart>,
    pub orphan_parts: Vec<ImportPart>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            chunk_size: crate::config::DEFAULT_CHUNK_SIZE,
            parts: ImportPart::ALL.to_vec(),
            orphan_parts: ImportPart::ALL.to_vec(),
        }
    }
}

impl ImportSettings {
    /// 运行开始时读取一次
    pub async fn load(reader: &dyn ImportConfigReader) -> RepositoryResult<Self> {
        Ok(Self {
            chunk_size: reader.get_chunk_size().await?,
            parts: reader.get_import_parts().await?,
            orphan_parts: reader.get_orphan_parts().await?,
        })
    }
}
