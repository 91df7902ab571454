use crate::domain::{ImportPart, Translation, TranslationType};
use crate::export::ExportSnapshot;
use crate::importer::error::ImportResult;
use crate::importer::reconciler::{slice_range, ReconcileKind};
use crate::importer::translation_aggregator::TranslationAggregator;
use crate::repository::TranslationRepository;
use rusqlite::Connection;
use std::collections::BTreeSet;
use tracing::debug;

// ==========================================
// 翻译对账
// ==========================================
// 按实体名称分块：同名的 item/machine/recipe 翻译总落在同一分块，
// 聚合器的去重在分块内即完整
pub struct TranslationKind;

/// 快照中全部实体名称（去重、升序）
pub fn translation_names(snapshot: &ExportSnapshot) -> ImportResult<Vec<String>> {
    let mut names = BTreeSet::new();
    for m in snapshot.mods() {
        names.insert(m?.name);
    }
    for item in snapshot.items() {
        names.insert(item?.name);
    }
    for machine in snapshot.machines() {
        names.insert(machine?.name);
    }
    for recipe in snapshot.recipes() {
        names.insert(recipe?.name);
    }
    Ok(names.into_iter().collect())
}

/// 聚合指定名称（None 表示全部）的翻译，尚未 optimize
pub fn aggregate(
    snapshot: &ExportSnapshot,
    names: Option<&BTreeSet<String>>,
) -> ImportResult<TranslationAggregator> {
    let wanted = |name: &str| names.map_or(true, |set| set.contains(name));
    let mut aggregator = TranslationAggregator::new();

    for m in snapshot.mods() {
        let m = m?;
        if wanted(&m.name) {
            aggregator.add(TranslationType::Mod, &m.name, &m.titles, &m.descriptions);
        }
    }
    for item in snapshot.items() {
        let item = item?;
        if wanted(&item.name) {
            aggregator.add(item.item_type.into(), &item.name, &item.labels, &item.descriptions);
        }
    }
    for machine in snapshot.machines() {
        let machine = machine?;
        if wanted(&machine.name) {
            aggregator.add(
                TranslationType::Machine,
                &machine.name,
                &machine.labels,
                &machine.descriptions,
            );
        }
    }
    for recipe in snapshot.recipes() {
        let recipe = recipe?;
        if wanted(&recipe.name) {
            aggregator.add(
                TranslationType::Recipe,
                &recipe.name,
                &recipe.labels,
                &recipe.descriptions,
            );
        }
    }

    Ok(aggregator)
}

impl ReconcileKind for TranslationKind {
    const PART: ImportPart = ImportPart::Translation;

    type Entity = Translation;
    type Repo = TranslationRepository;

    fn count(snapshot: &ExportSnapshot) -> ImportResult<usize> {
        Ok(translation_names(snapshot)?.len())
    }

    fn materialize(
        _conn: &Connection,
        snapshot: &ExportSnapshot,
        offset: usize,
        limit: usize,
    ) -> ImportResult<Vec<Translation>> {
        let names = translation_names(snapshot)?;
        let selected: BTreeSet<String> = names[slice_range(names.len(), offset, limit)]
            .iter()
            .cloned()
            .collect();

        let mut aggregator = aggregate(snapshot, Some(&selected))?;
        let removed = aggregator.optimize();
        debug!(names = selected.len(), removed, "翻译去重完成");
        Ok(aggregator.into_translations())
    }
}
