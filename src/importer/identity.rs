// ==========================================
// 组合导入引擎 - 实体标识计算
// ==========================================
// 规则: 标识 = SHA-256(规范化语义元组的 JSON)，截取前 16 字节
// 红线: 元组只包含语义字段，不含自身标识与簿记字段
// 顺序: 原料/产物保持原顺序；机器的制作类别先排序
// ==========================================

use crate::domain::{
    CraftingCategory, Identity, Item, ItemType, Machine, Mod, Recipe, Translation,
};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// 可计算内容标识的实体
pub trait Identifiable {
    /// 规范化语义元组（JSON 数组）
    fn identity_tuple(&self) -> Value;

    fn id(&self) -> Identity;

    fn set_id(&mut self, id: Identity);
}

/// 计算实体标识
pub fn calculate_id<T: Identifiable + ?Sized>(entity: &T) -> Identity {
    digest(&entity.identity_tuple())
}

/// 对任意 JSON 值计算摘要标识
pub fn digest(value: &Value) -> Identity {
    // serde_json 对数组/标量的输出是确定的
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    let hash = Sha256::digest(&bytes);
    let mut id = [0u8; 16];
    id.copy_from_slice(&hash[..16]);
    Uuid::from_bytes(id)
}

/// 计算标识并写回实体
pub fn assign_id<T: Identifiable>(mut entity: T) -> T {
    let id = calculate_id(&entity);
    entity.set_id(id);
    entity
}

// ==========================================
// 各实体的语义元组
// ==========================================

impl Identifiable for CraftingCategory {
    fn identity_tuple(&self) -> Value {
        json!([self.name])
    }

    fn id(&self) -> Identity {
        self.id
    }

    fn set_id(&mut self, id: Identity) {
        self.id = id;
    }
}

impl Identifiable for Item {
    fn identity_tuple(&self) -> Value {
        json!([self.item_type.as_str(), self.name])
    }

    fn id(&self) -> Identity {
        self.id
    }

    fn set_id(&mut self, id: Identity) {
        self.id = id;
    }
}

impl Identifiable for Machine {
    fn identity_tuple(&self) -> Value {
        let mut categories: Vec<&str> = self
            .crafting_categories
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        categories.sort_unstable();

        json!([
            self.name,
            self.crafting_speed,
            categories,
            self.item_slots,
            self.fluid_input_slots,
            self.fluid_output_slots,
            self.module_slots,
            self.energy_usage,
            self.energy_usage_unit,
        ])
    }

    fn id(&self) -> Identity {
        self.id
    }

    fn set_id(&mut self, id: Identity) {
        self.id = id;
    }
}

impl Identifiable for Recipe {
    fn identity_tuple(&self) -> Value {
        let ingredients: Vec<Value> = self
            .ingredients
            .iter()
            .map(|i| json!([i.item.item_type.as_str(), i.item.name, i.amount]))
            .collect();
        let products: Vec<Value> = self
            .products
            .iter()
            .map(|p| {
                json!([
                    p.item.item_type.as_str(),
                    p.item.name,
                    p.amount_min,
                    p.amount_max,
                    p.probability,
                ])
            })
            .collect();

        json!([
            self.name,
            self.mode.as_str(),
            self.crafting_time,
            self.crafting_category.name,
            ingredients,
            products,
        ])
    }

    fn id(&self) -> Identity {
        self.id
    }

    fn set_id(&mut self, id: Identity) {
        self.id = id;
    }
}

impl Identifiable for Mod {
    fn identity_tuple(&self) -> Value {
        json!([self.name, self.version])
    }

    fn id(&self) -> Identity {
        self.id
    }

    fn set_id(&mut self, id: Identity) {
        self.id = id;
    }
}

impl Identifiable for Translation {
    fn identity_tuple(&self) -> Value {
        json!([
            self.locale,
            self.translation_type.as_str(),
            self.name,
            self.value,
            self.description,
            self.is_duplicated_by_machine,
            self.is_duplicated_by_recipe,
        ])
    }

    fn id(&self) -> Identity {
        self.id
    }

    fn set_id(&mut self, id: Identity) {
        self.id = id;
    }
}

/// 制作类别标识（按名称，无需构造实体）
pub fn crafting_category_id(name: &str) -> Identity {
    digest(&json!([name]))
}

/// 物品标识（按类型+名称）
pub fn item_id(item_type: ItemType, name: &str) -> Identity {
    digest(&json!([item_type.as_str(), name]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RecipeIngredient, RecipeMode, RecipeProduct, TranslationType};

    fn category(name: &str) -> CraftingCategory {
        assign_id(CraftingCategory {
            id: Uuid::nil(),
            name: name.to_string(),
        })
    }

    fn item(item_type: ItemType, name: &str) -> Item {
        assign_id(Item {
            id: Uuid::nil(),
            item_type,
            name: name.to_string(),
        })
    }

    fn machine(categories: &[&str]) -> Machine {
        Machine {
            id: Uuid::nil(),
            name: "assembling-machine-1".to_string(),
            crafting_categories: categories.iter().map(|c| category(c)).collect(),
            crafting_speed: 0.5,
            item_slots: 255,
            fluid_input_slots: 0,
            fluid_output_slots: 0,
            module_slots: 0,
            energy_usage: 75.0,
            energy_usage_unit: "kW".to_string(),
        }
    }

    fn recipe() -> Recipe {
        Recipe {
            id: Uuid::nil(),
            name: "iron-gear-wheel".to_string(),
            mode: RecipeMode::Normal,
            crafting_time: 0.5,
            crafting_category: category("crafting"),
            ingredients: vec![RecipeIngredient {
                item: item(ItemType::Item, "iron-plate"),
                amount: 2.0,
            }],
            products: vec![RecipeProduct {
                item: item(ItemType::Item, "iron-gear-wheel"),
                amount_min: 1.0,
                amount_max: 1.0,
                probability: 1.0,
            }],
        }
    }

    #[test]
    fn test_identity_is_deterministic_across_instances() {
        assert_eq!(calculate_id(&recipe()), calculate_id(&recipe()));
        assert_eq!(category("crafting").id, crafting_category_id("crafting"));
        assert_eq!(item(ItemType::Fluid, "water").id, item_id(ItemType::Fluid, "water"));
    }

    #[test]
    fn test_machine_identity_ignores_category_order() {
        let a = machine(&["crafting", "advanced-crafting", "basic-crafting"]);
        let b = machine(&["basic-crafting", "crafting", "advanced-crafting"]);
        assert_eq!(calculate_id(&a), calculate_id(&b));
    }

    #[test]
    fn test_identity_changes_with_semantic_fields() {
        let base = calculate_id(&machine(&["crafting"]));

        let mut slots = machine(&["crafting"]);
        slots.module_slots = 2;
        assert_ne!(calculate_id(&slots), base);

        let mut amount = recipe();
        amount.ingredients[0].amount = 3.0;
        assert_ne!(calculate_id(&amount), calculate_id(&recipe()));

        let mut renamed = recipe();
        renamed.name = "copper-cable".to_string();
        assert_ne!(calculate_id(&renamed), calculate_id(&recipe()));
    }

    #[test]
    fn test_recipe_identity_is_order_sensitive_for_ingredients() {
        let mut a = recipe();
        a.ingredients.push(RecipeIngredient {
            item: item(ItemType::Item, "copper-plate"),
            amount: 1.0,
        });
        let mut b = a.clone();
        b.ingredients.reverse();
        assert_ne!(calculate_id(&a), calculate_id(&b));
    }

    #[test]
    fn test_identity_ignores_bookkeeping_fields() {
        let a = Mod {
            id: Uuid::nil(),
            name: "base".to_string(),
            version: "1.1.0".to_string(),
            author: "Wube".to_string(),
        };
        let mut b = a.clone();
        b.author = "someone else".to_string();
        b.id = Uuid::new_v4();
        assert_eq!(calculate_id(&a), calculate_id(&b));

        let mut c = a.clone();
        c.version = "1.1.1".to_string();
        assert_ne!(calculate_id(&a), calculate_id(&c));
    }

    #[test]
    fn test_translation_identity_includes_flags() {
        let a = Translation {
            id: Uuid::nil(),
            locale: "en".to_string(),
            translation_type: TranslationType::Item,
            name: "iron-plate".to_string(),
            value: "Iron plate".to_string(),
            description: String::new(),
            is_duplicated_by_machine: false,
            is_duplicated_by_recipe: false,
        };
        let mut b = a.clone();
        b.is_duplicated_by_machine = true;
        assert_ne!(calculate_id(&a), calculate_id(&b));
    }
}
