use crate::domain::{ImportPart, Mod};
use crate::export::ExportSnapshot;
use crate::importer::error::ImportResult;
use crate::importer::identity::assign_id;
use crate::importer::reconciler::{slice_range, ReconcileKind};
use crate::repository::ModRepository;
use rusqlite::Connection;
use uuid::Uuid;

// ==========================================
// 模组对账（按组合 mod_hashes 顺序）
// ==========================================
pub struct ModKind;

impl ReconcileKind for ModKind {
    const PART: ImportPart = ImportPart::Mod;

    type Entity = Mod;
    type Repo = ModRepository;

    fn count(snapshot: &ExportSnapshot) -> ImportResult<usize> {
        Ok(snapshot.combination().mod_hashes.len())
    }

    fn materialize(
        _conn: &Connection,
        snapshot: &ExportSnapshot,
        offset: usize,
        limit: usize,
    ) -> ImportResult<Vec<Mod>> {
        let hashes = &snapshot.combination().mod_hashes;
        hashes[slice_range(hashes.len(), offset, limit)]
            .iter()
            .map(|hash| {
                let export = snapshot.registry().get_mod(hash)?;
                Ok(assign_id(Mod {
                    id: Uuid::nil(),
                    name: export.name,
                    version: export.version,
                    author: export.author,
                }))
            })
            .collect()
    }
}
