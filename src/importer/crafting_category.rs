use crate::domain::{CraftingCategory, ImportPart};
use crate::export::ExportSnapshot;
use crate::importer::error::ImportResult;
use crate::importer::identity::assign_id;
use crate::importer::reconciler::{slice_range, ReconcileKind};
use crate::repository::CraftingCategoryRepository;
use rusqlite::Connection;
use std::collections::HashSet;
use uuid::Uuid;

// ==========================================
// 制作类别对账
// ==========================================
// 类别没有独立的导出条目，来源于机器与配方
// 枚举顺序: 先机器后配方，按首次出现去重
pub struct CraftingCategoryKind;

/// 快照中出现的全部类别名称（稳定顺序）
pub fn category_names(snapshot: &ExportSnapshot) -> ImportResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for machine in snapshot.machines() {
        for name in machine?.crafting_categories {
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }
    }
    for recipe in snapshot.recipes() {
        let name = recipe?.crafting_category;
        if seen.insert(name.clone()) {
            names.push(name);
        }
    }
    Ok(names)
}

impl ReconcileKind for CraftingCategoryKind {
    const PART: ImportPart = ImportPart::CraftingCategory;

    type Entity = CraftingCategory;
    type Repo = CraftingCategoryRepository;

    fn count(snapshot: &ExportSnapshot) -> ImportResult<usize> {
        Ok(category_names(snapshot)?.len())
    }

    fn materialize(
        _conn: &Connection,
        snapshot: &ExportSnapshot,
        offset: usize,
        limit: usize,
    ) -> ImportResult<Vec<CraftingCategory>> {
        let names = category_names(snapshot)?;
        let range = slice_range(names.len(), offset, limit);
        Ok(names[range]
            .iter()
            .map(|name| {
                assign_id(CraftingCategory {
                    id: Uuid::nil(),
                    name: name.clone(),
                })
            })
            .collect())
    }
}
