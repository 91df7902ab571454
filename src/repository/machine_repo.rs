use crate::domain::{CraftingCategory, Identity, Machine};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{build_in_clause, id_batches};
use crate::repository::EntityRepository;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// MachineRepository - 机器仓储
// ==========================================
// 机器行 + machine_crafting_category 子表（随机器级联删除）
pub struct MachineRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MachineRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询组合挂载的全部机器（含类别）
    pub fn list_for_combination(&self, combination_id: Uuid) -> RepositoryResult<Vec<Machine>> {
        let conn = self.get_conn()?;
        let ids = Self::linked_ids_tx(&conn, combination_id)?;
        let mut machines: Vec<Machine> = Self::find_by_ids_tx(&conn, &ids)?.into_values().collect();
        machines.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(machines)
    }

    fn load_categories_tx(
        conn: &Connection,
        machines: &mut HashMap<Identity, Machine>,
    ) -> RepositoryResult<()> {
        let ids: Vec<Identity> = machines.keys().copied().collect();
        for batch in id_batches(&ids) {
            let sql = format!(
                r#"
                SELECT mcc.machine_id, c.id, c.name
                FROM machine_crafting_category mcc
                JOIN crafting_category c ON c.id = mcc.crafting_category_id
                WHERE {}
                "#,
                build_in_clause("mcc.machine_id", batch.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(batch.iter()), |row| {
                Ok((
                    row.get::<_, Identity>(0)?,
                    CraftingCategory {
                        id: row.get(1)?,
                        name: row.get(2)?,
                    },
                ))
            })?;
            for row in rows {
                let (machine_id, category) = row?;
                if let Some(machine) = machines.get_mut(&machine_id) {
                    machine.crafting_categories.push(category);
                }
            }
        }

        for machine in machines.values_mut() {
            machine.crafting_categories.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(())
    }
}

impl EntityRepository for MachineRepository {
    type Entity = Machine;

    const LINK_TABLE: &'static str = "combination_machine";
    const LINK_COLUMN: &'static str = "machine_id";

    fn find_by_ids_tx(
        conn: &Connection,
        ids: &[Identity],
    ) -> RepositoryResult<HashMap<Identity, Machine>> {
        let mut found = HashMap::with_capacity(ids.len());
        for batch in id_batches(ids) {
            let sql = format!(
                r#"
                SELECT id, name, crafting_speed, item_slots, fluid_input_slots,
                       fluid_output_slots, module_slots, energy_usage, energy_usage_unit
                FROM machine WHERE {}
                "#,
                build_in_clause("id", batch.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(batch.iter()), |row| {
                Ok(Machine {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    crafting_categories: Vec::new(),
                    crafting_speed: row.get(2)?,
                    item_slots: row.get(3)?,
                    fluid_input_slots: row.get(4)?,
                    fluid_output_slots: row.get(5)?,
                    module_slots: row.get(6)?,
                    energy_usage: row.get(7)?,
                    energy_usage_unit: row.get(8)?,
                })
            })?;
            for row in rows {
                let machine = row?;
                found.insert(machine.id, machine);
            }
        }

        Self::load_categories_tx(conn, &mut found)?;
        Ok(found)
    }

    fn save_tx(conn: &Connection, entity: &Machine, is_new: bool) -> RepositoryResult<()> {
        let values = params![
            entity.id,
            entity.name,
            entity.crafting_speed,
            entity.item_slots,
            entity.fluid_input_slots,
            entity.fluid_output_slots,
            entity.module_slots,
            entity.energy_usage,
            entity.energy_usage_unit,
        ];

        if is_new {
            conn.execute(
                r#"
                INSERT INTO machine (
                    id, name, crafting_speed, item_slots, fluid_input_slots,
                    fluid_output_slots, module_slots, energy_usage, energy_usage_unit
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                values,
            )?;
        } else {
            conn.execute(
                r#"
                UPDATE machine SET
                    name = ?2, crafting_speed = ?3, item_slots = ?4,
                    fluid_input_slots = ?5, fluid_output_slots = ?6,
                    module_slots = ?7, energy_usage = ?8, energy_usage_unit = ?9
                WHERE id = ?1
                "#,
                values,
            )?;
            conn.execute(
                "DELETE FROM machine_crafting_category WHERE machine_id = ?1",
                params![entity.id],
            )?;
        }

        let mut stmt = conn.prepare_cached(
            "INSERT OR IGNORE INTO machine_crafting_category (machine_id, crafting_category_id) VALUES (?1, ?2)",
        )?;
        for category in &entity.crafting_categories {
            stmt.execute(params![entity.id, category.id])?;
        }
        Ok(())
    }

    fn remove_orphans_tx(conn: &Connection) -> RepositoryResult<usize> {
        let rows = conn.execute(
            "DELETE FROM machine WHERE id NOT IN (SELECT machine_id FROM combination_machine)",
            [],
        )?;
        Ok(rows)
    }
}
