use crate::domain::{CraftingCategory, ImportPart, Machine};
use crate::export::ExportSnapshot;
use crate::importer::cache::IdentityCache;
use crate::importer::error::ImportResult;
use crate::importer::identity::{assign_id, crafting_category_id};
use crate::importer::reconciler::{slice_range, ReconcileKind};
use crate::repository::{CraftingCategoryRepository, MachineRepository};
use rusqlite::Connection;
use tracing::warn;
use uuid::Uuid;

// ==========================================
// 机器对账（按组合 machine_hashes 顺序）
// ==========================================
// 无制作类别的机器不产生任何行
// 类别必须已由 crafting-category 分部导入，否则分块失败
pub struct MachineKind;

impl ReconcileKind for MachineKind {
    const PART: ImportPart = ImportPart::Machine;

    type Entity = Machine;
    type Repo = MachineRepository;

    fn count(snapshot: &ExportSnapshot) -> ImportResult<usize> {
        Ok(snapshot.combination().machine_hashes.len())
    }

    fn materialize(
        conn: &Connection,
        snapshot: &ExportSnapshot,
        offset: usize,
        limit: usize,
    ) -> ImportResult<Vec<Machine>> {
        let hashes = &snapshot.combination().machine_hashes;
        let exports = hashes[slice_range(hashes.len(), offset, limit)]
            .iter()
            .map(|hash| snapshot.registry().get_machine(hash))
            .collect::<ImportResult<Vec<_>>>()?;

        let mut categories: IdentityCache<CraftingCategory> = IdentityCache::new("crafting-category");
        categories.fill::<CraftingCategoryRepository>(
            conn,
            exports
                .iter()
                .flat_map(|m| m.crafting_categories.iter())
                .map(|name| crafting_category_id(name)),
        )?;

        let mut machines = Vec::with_capacity(exports.len());
        for export in exports {
            if export.crafting_categories.is_empty() {
                warn!(machine = %export.name, "机器没有制作类别，跳过");
                continue;
            }

            let mut machine_categories = export
                .crafting_categories
                .iter()
                .map(|name| categories.require(&crafting_category_id(name), || name.clone()))
                .collect::<ImportResult<Vec<_>>>()?;
            machine_categories.sort_by(|a, b| a.name.cmp(&b.name));
            machine_categories.dedup_by(|a, b| a.id == b.id);

            machines.push(assign_id(Machine {
                id: Uuid::nil(),
                name: export.name,
                crafting_categories: machine_categories,
                crafting_speed: export.crafting_speed,
                item_slots: export.item_slots,
                fluid_input_slots: export.fluid_input_slots,
                fluid_output_slots: export.fluid_output_slots,
                module_slots: export.module_slots,
                energy_usage: export.energy_usage,
                energy_usage_unit: export.energy_usage_unit,
            }));
        }
        Ok(machines)
    }
}
