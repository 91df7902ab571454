use super::ItemRepository;
use crate::domain::{Item, ItemType};
use crate::importer::identity::item_id;
use crate::repository::EntityRepository;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

fn insert_combination(conn: &Connection) -> Uuid {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO combination (id, mod_names, imported_at, last_usage_at) VALUES (?1, '[]', datetime('now'), datetime('now'))",
        params![id],
    )
    .unwrap();
    id
}

fn make_item(item_type: ItemType, name: &str) -> Item {
    Item {
        id: item_id(item_type, name),
        item_type,
        name: name.to_string(),
    }
}

#[test]
fn test_save_and_find_by_ids() {
    let db = setup_test_db();
    let conn = db.lock().unwrap();

    let plate = make_item(ItemType::Item, "iron-plate");
    let water = make_item(ItemType::Fluid, "water");
    ItemRepository::save_tx(&conn, &plate, true).unwrap();
    ItemRepository::save_tx(&conn, &water, true).unwrap();

    let found = ItemRepository::find_by_ids_tx(&conn, &[plate.id, water.id, Uuid::new_v4()]).unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[&water.id].item_type, ItemType::Fluid);
    assert_eq!(found[&plate.id].name, "iron-plate");
}

#[test]
fn test_save_existing_overwrites_row() {
    let db = setup_test_db();
    let conn = db.lock().unwrap();

    let mut item = make_item(ItemType::Item, "iron-plate");
    ItemRepository::save_tx(&conn, &item, true).unwrap();
    item.name = "iron-plate-renamed".to_string();
    ItemRepository::save_tx(&conn, &item, false).unwrap();

    let found = ItemRepository::find_by_ids_tx(&conn, &[item.id]).unwrap();
    assert_eq!(found[&item.id].name, "iron-plate-renamed");
}

#[test]
fn test_attach_and_detach_combination() {
    let db = setup_test_db();
    let conn = db.lock().unwrap();
    let combination_id = insert_combination(&conn);

    let a = make_item(ItemType::Item, "a");
    let b = make_item(ItemType::Item, "b");
    ItemRepository::save_tx(&conn, &a, true).unwrap();
    ItemRepository::save_tx(&conn, &b, true).unwrap();

    assert_eq!(ItemRepository::attach_tx(&conn, combination_id, &[a.id, b.id]).unwrap(), 2);
    // 重复挂载被忽略
    assert_eq!(ItemRepository::attach_tx(&conn, combination_id, &[a.id]).unwrap(), 0);
    assert_eq!(ItemRepository::linked_ids_tx(&conn, combination_id).unwrap().len(), 2);

    assert_eq!(ItemRepository::detach_combination_tx(&conn, combination_id).unwrap(), 2);
    assert!(ItemRepository::linked_ids_tx(&conn, combination_id).unwrap().is_empty());
}

#[test]
fn test_remove_orphans_keeps_linked_and_referenced() {
    let db = setup_test_db();
    {
        let conn = db.lock().unwrap();
        let combination_id = insert_combination(&conn);

        let linked = make_item(ItemType::Item, "linked");
        let referenced = make_item(ItemType::Item, "referenced");
        let orphan = make_item(ItemType::Item, "orphan");
        for item in [&linked, &referenced, &orphan] {
            ItemRepository::save_tx(&conn, item, true).unwrap();
        }
        ItemRepository::attach_tx(&conn, combination_id, &[linked.id]).unwrap();

        conn.execute(
            "INSERT INTO crafting_category (id, name) VALUES (?1, 'crafting')",
            params![Uuid::nil()],
        )
        .unwrap();
        let recipe_id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO recipe (id, name, mode, crafting_time, crafting_category_id) VALUES (?1, 'r', 'normal', 1.0, ?2)",
            params![recipe_id, Uuid::nil()],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO recipe_product (recipe_id, order_index, item_id, amount_min, amount_max, probability) VALUES (?1, 0, ?2, 1, 1, 1)",
            params![recipe_id, referenced.id],
        )
        .unwrap();

        assert_eq!(ItemRepository::remove_orphans_tx(&conn).unwrap(), 1);
    }

    let repo = ItemRepository::new(db);
    assert_eq!(repo.count_all().unwrap(), 2);
    assert!(repo.find_by_name(ItemType::Item, "orphan").unwrap().is_none());
    assert!(repo.find_by_name(ItemType::Item, "linked").unwrap().is_some());
}

#[test]
fn test_unknown_type_column_is_reported() {
    let db = setup_test_db();
    let conn = db.lock().unwrap();
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO item (id, type, name) VALUES (?1, 'gas', 'steam')",
        params![id],
    )
    .unwrap();

    let err = ItemRepository::find_by_ids_tx(&conn, &[id]).unwrap_err();
    assert!(err.to_string().contains("gas"));
}
