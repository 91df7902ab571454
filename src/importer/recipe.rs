use crate::domain::{
    CraftingCategory, ImportPart, Item, ItemType, Recipe, RecipeIngredient, RecipeProduct,
};
use crate::export::ExportSnapshot;
use crate::importer::cache::IdentityCache;
use crate::importer::error::ImportResult;
use crate::importer::identity::{assign_id, crafting_category_id, item_id};
use crate::importer::reconciler::{slice_range, ReconcileKind};
use crate::repository::{CraftingCategoryRepository, ItemRepository, RecipeRepository};
use rusqlite::Connection;
use uuid::Uuid;

// ==========================================
// 配方对账（按组合 recipe_hashes 顺序）
// ==========================================
// 原料/产物保持导出顺序；引用的物品与类别必须已存在
pub struct RecipeKind;

fn item_key(item_type: ItemType, name: &str) -> String {
    format!("{}/{}", item_type.as_str(), name)
}

impl ReconcileKind for RecipeKind {
    const PART: ImportPart = ImportPart::Recipe;

    type Entity = Recipe;
    type Repo = RecipeRepository;

    fn count(snapshot: &ExportSnapshot) -> ImportResult<usize> {
        Ok(snapshot.combination().recipe_hashes.len())
    }

    fn materialize(
        conn: &Connection,
        snapshot: &ExportSnapshot,
        offset: usize,
        limit: usize,
    ) -> ImportResult<Vec<Recipe>> {
        let hashes = &snapshot.combination().recipe_hashes;
        let exports = hashes[slice_range(hashes.len(), offset, limit)]
            .iter()
            .map(|hash| snapshot.registry().get_recipe(hash))
            .collect::<ImportResult<Vec<_>>>()?;

        let mut categories: IdentityCache<CraftingCategory> = IdentityCache::new("crafting-category");
        categories.fill::<CraftingCategoryRepository>(
            conn,
            exports.iter().map(|r| crafting_category_id(&r.crafting_category)),
        )?;

        let mut items: IdentityCache<Item> = IdentityCache::new("item");
        items.fill::<ItemRepository>(
            conn,
            exports.iter().flat_map(|r| {
                r.ingredients
                    .iter()
                    .map(|i| item_id(i.item_type, &i.name))
                    .chain(r.products.iter().map(|p| item_id(p.item_type, &p.name)))
            }),
        )?;

        let mut recipes = Vec::with_capacity(exports.len());
        for export in exports {
            let crafting_category = categories.require(
                &crafting_category_id(&export.crafting_category),
                || export.crafting_category.clone(),
            )?;

            let ingredients = export
                .ingredients
                .iter()
                .map(|i| {
                    let item = items.require(&item_id(i.item_type, &i.name), || {
                        item_key(i.item_type, &i.name)
                    })?;
                    Ok(RecipeIngredient {
                        item,
                        amount: i.amount,
                    })
                })
                .collect::<ImportResult<Vec<_>>>()?;

            let products = export
                .products
                .iter()
                .map(|p| {
                    let item = items.require(&item_id(p.item_type, &p.name), || {
                        item_key(p.item_type, &p.name)
                    })?;
                    Ok(RecipeProduct {
                        item,
                        amount_min: p.amount_min,
                        amount_max: p.amount_max,
                        probability: p.probability,
                    })
                })
                .collect::<ImportResult<Vec<_>>>()?;

            recipes.push(assign_id(Recipe {
                id: Uuid::nil(),
                name: export.name,
                mode: export.mode,
                crafting_time: export.crafting_time,
                crafting_category,
                ingredients,
                products,
            }));
        }
        Ok(recipes)
    }
}
