use crate::domain::{
    CraftingCategory, Identity, Item, ItemType, Recipe, RecipeIngredient, RecipeMode,
    RecipeProduct,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{build_in_clause, id_batches, parse_text_column};
use crate::repository::EntityRepository;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// RecipeRepository - 配方仓储
// ==========================================
// 原料/产物按 order_index 保序；随配方级联删除
pub struct RecipeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RecipeRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询组合挂载的全部配方（含原料/产物）
    pub fn list_for_combination(&self, combination_id: Uuid) -> RepositoryResult<Vec<Recipe>> {
        let conn = self.get_conn()?;
        let ids = Self::linked_ids_tx(&conn, combination_id)?;
        let mut recipes: Vec<Recipe> = Self::find_by_ids_tx(&conn, &ids)?.into_values().collect();
        recipes.sort_by(|a, b| a.name.cmp(&b.name).then(a.mode.cmp(&b.mode)));
        Ok(recipes)
    }

    fn load_children_tx(
        conn: &Connection,
        recipes: &mut HashMap<Identity, Recipe>,
    ) -> RepositoryResult<()> {
        let ids: Vec<Identity> = recipes.keys().copied().collect();
        for batch in id_batches(&ids) {
            let sql = format!(
                r#"
                SELECT ri.recipe_id, i.id, i.type, i.name, ri.amount
                FROM recipe_ingredient ri
                JOIN item i ON i.id = ri.item_id
                WHERE {}
                ORDER BY ri.recipe_id, ri.order_index
                "#,
                build_in_clause("ri.recipe_id", batch.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(batch.iter()), |row| {
                Ok((
                    row.get::<_, Identity>(0)?,
                    RecipeIngredient {
                        item: map_item(row, 1)?,
                        amount: row.get(4)?,
                    },
                ))
            })?;
            for row in rows {
                let (recipe_id, ingredient) = row?;
                if let Some(recipe) = recipes.get_mut(&recipe_id) {
                    recipe.ingredients.push(ingredient);
                }
            }

            let sql = format!(
                r#"
                SELECT rp.recipe_id, i.id, i.type, i.name,
                       rp.amount_min, rp.amount_max, rp.probability
                FROM recipe_product rp
                JOIN item i ON i.id = rp.item_id
                WHERE {}
                ORDER BY rp.recipe_id, rp.order_index
                "#,
                build_in_clause("rp.recipe_id", batch.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(batch.iter()), |row| {
                Ok((
                    row.get::<_, Identity>(0)?,
                    RecipeProduct {
                        item: map_item(row, 1)?,
                        amount_min: row.get(4)?,
                        amount_max: row.get(5)?,
                        probability: row.get(6)?,
                    },
                ))
            })?;
            for row in rows {
                let (recipe_id, product) = row?;
                if let Some(recipe) = recipes.get_mut(&recipe_id) {
                    recipe.products.push(product);
                }
            }
        }
        Ok(())
    }
}

fn map_item(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Item> {
    let raw_type: String = row.get(offset + 1)?;
    Ok(Item {
        id: row.get(offset)?,
        item_type: parse_text_column(offset + 1, "item.type", &raw_type, ItemType::parse)?,
        name: row.get(offset + 2)?,
    })
}

impl EntityRepository for RecipeRepository {
    type Entity = Recipe;

    const LINK_TABLE: &'static str = "combination_recipe";
    const LINK_COLUMN: &'static str = "recipe_id";

    fn find_by_ids_tx(
        conn: &Connection,
        ids: &[Identity],
    ) -> RepositoryResult<HashMap<Identity, Recipe>> {
        let mut found = HashMap::with_capacity(ids.len());
        for batch in id_batches(ids) {
            let sql = format!(
                r#"
                SELECT r.id, r.name, r.mode, r.crafting_time, c.id, c.name
                FROM recipe r
                JOIN crafting_category c ON c.id = r.crafting_category_id
                WHERE {}
                "#,
                build_in_clause("r.id", batch.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(batch.iter()), |row| {
                let raw_mode: String = row.get(2)?;
                Ok(Recipe {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    mode: parse_text_column(2, "recipe.mode", &raw_mode, RecipeMode::parse)?,
                    crafting_time: row.get(3)?,
                    crafting_category: CraftingCategory {
                        id: row.get(4)?,
                        name: row.get(5)?,
                    },
                    ingredients: Vec::new(),
                    products: Vec::new(),
                })
            })?;
            for row in rows {
                let recipe = row?;
                found.insert(recipe.id, recipe);
            }
        }

        Self::load_children_tx(conn, &mut found)?;
        Ok(found)
    }

    fn save_tx(conn: &Connection, entity: &Recipe, is_new: bool) -> RepositoryResult<()> {
        let values = params![
            entity.id,
            entity.name,
            entity.mode.as_str(),
            entity.crafting_time,
            entity.crafting_category.id,
        ];

        if is_new {
            conn.execute(
                r#"
                INSERT INTO recipe (id, name, mode, crafting_time, crafting_category_id)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                values,
            )?;
        } else {
            conn.execute(
                r#"
                UPDATE recipe SET
                    name = ?2, mode = ?3, crafting_time = ?4, crafting_category_id = ?5
                WHERE id = ?1
                "#,
                values,
            )?;
            conn.execute(
                "DELETE FROM recipe_ingredient WHERE recipe_id = ?1",
                params![entity.id],
            )?;
            conn.execute(
                "DELETE FROM recipe_product WHERE recipe_id = ?1",
                params![entity.id],
            )?;
        }

        let mut stmt = conn.prepare_cached(
            r#"
            INSERT INTO recipe_ingredient (recipe_id, order_index, item_id, amount)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )?;
        for (index, ingredient) in entity.ingredients.iter().enumerate() {
            stmt.execute(params![
                entity.id,
                index as i64,
                ingredient.item.id,
                ingredient.amount
            ])?;
        }

        let mut stmt = conn.prepare_cached(
            r#"
            INSERT INTO recipe_product (
                recipe_id, order_index, item_id, amount_min, amount_max, probability
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )?;
        for (index, product) in entity.products.iter().enumerate() {
            stmt.execute(params![
                entity.id,
                index as i64,
                product.item.id,
                product.amount_min,
                product.amount_max,
                product.probability
            ])?;
        }
        Ok(())
    }

    fn remove_orphans_tx(conn: &Connection) -> RepositoryResult<usize> {
        let rows = conn.execute(
            "DELETE FROM recipe WHERE id NOT IN (SELECT recipe_id FROM combination_recipe)",
            [],
        )?;
        Ok(rows)
    }
}
