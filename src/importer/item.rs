use crate::domain::{ImportPart, Item};
use crate::export::ExportSnapshot;
use crate::importer::error::ImportResult;
use crate::importer::identity::assign_id;
use crate::importer::reconciler::{slice_range, ReconcileKind};
use crate::repository::ItemRepository;
use rusqlite::Connection;
use uuid::Uuid;

// ==========================================
// 物品/流体对账（按组合 item_hashes 顺序）
// ==========================================
pub struct ItemKind;

impl ReconcileKind for ItemKind {
    const PART: ImportPart = ImportPart::Item;

    type Entity = Item;
    type Repo = ItemRepository;

    fn count(snapshot: &ExportSnapshot) -> ImportResult<usize> {
        Ok(snapshot.combination().item_hashes.len())
    }

    fn materialize(
        _conn: &Connection,
        snapshot: &ExportSnapshot,
        offset: usize,
        limit: usize,
    ) -> ImportResult<Vec<Item>> {
        let hashes = &snapshot.combination().item_hashes;
        hashes[slice_range(hashes.len(), offset, limit)]
            .iter()
            .map(|hash| {
                let export = snapshot.registry().get_item(hash)?;
                Ok(assign_id(Item {
                    id: Uuid::nil(),
                    item_type: export.item_type,
                    name: export.name,
                }))
            })
            .collect()
    }
}
