// ==========================================
// 组合导入引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键/busy_timeout）
// - 幂等建表，父进程与每个分块子进程各自打开连接
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::Path;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 建表语句
///
/// 说明：
/// - 实体表由多个组合共享，组合通过 combination_* 关联表引用
/// - 子表（机器类别、配方原料/产物）随父行级联删除
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL DEFAULT 'global',
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS combination (
    id BLOB PRIMARY KEY,
    mod_names TEXT NOT NULL,
    imported_at TEXT NOT NULL,
    last_usage_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS game_mod (
    id BLOB PRIMARY KEY,
    name TEXT NOT NULL,
    version TEXT NOT NULL,
    author TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS combination_mod (
    combination_id BLOB NOT NULL REFERENCES combination(id) ON DELETE CASCADE,
    mod_id BLOB NOT NULL REFERENCES game_mod(id),
    PRIMARY KEY (combination_id, mod_id)
);

CREATE TABLE IF NOT EXISTS crafting_category (
    id BLOB PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS combination_crafting_category (
    combination_id BLOB NOT NULL REFERENCES combination(id) ON DELETE CASCADE,
    crafting_category_id BLOB NOT NULL REFERENCES crafting_category(id),
    PRIMARY KEY (combination_id, crafting_category_id)
);

CREATE TABLE IF NOT EXISTS item (
    id BLOB PRIMARY KEY,
    type TEXT NOT NULL,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS combination_item (
    combination_id BLOB NOT NULL REFERENCES combination(id) ON DELETE CASCADE,
    item_id BLOB NOT NULL REFERENCES item(id),
    PRIMARY KEY (combination_id, item_id)
);

CREATE TABLE IF NOT EXISTS machine (
    id BLOB PRIMARY KEY,
    name TEXT NOT NULL,
    crafting_speed REAL NOT NULL,
    item_slots INTEGER NOT NULL,
    fluid_input_slots INTEGER NOT NULL,
    fluid_output_slots INTEGER NOT NULL,
    module_slots INTEGER NOT NULL,
    energy_usage REAL NOT NULL,
    energy_usage_unit TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS machine_crafting_category (
    machine_id BLOB NOT NULL REFERENCES machine(id) ON DELETE CASCADE,
    crafting_category_id BLOB NOT NULL REFERENCES crafting_category(id),
    PRIMARY KEY (machine_id, crafting_category_id)
);

CREATE TABLE IF NOT EXISTS combination_machine (
    combination_id BLOB NOT NULL REFERENCES combination(id) ON DELETE CASCADE,
    machine_id BLOB NOT NULL REFERENCES machine(id),
    PRIMARY KEY (combination_id, machine_id)
);

CREATE TABLE IF NOT EXISTS recipe (
    id BLOB PRIMARY KEY,
    name TEXT NOT NULL,
    mode TEXT NOT NULL,
    crafting_time REAL NOT NULL,
    crafting_category_id BLOB NOT NULL REFERENCES crafting_category(id)
);

CREATE TABLE IF NOT EXISTS recipe_ingredient (
    recipe_id BLOB NOT NULL REFERENCES recipe(id) ON DELETE CASCADE,
    order_index INTEGER NOT NULL,
    item_id BLOB NOT NULL REFERENCES item(id),
    amount REAL NOT NULL,
    PRIMARY KEY (recipe_id, order_index)
);

CREATE TABLE IF NOT EXISTS recipe_product (
    recipe_id BLOB NOT NULL REFERENCES recipe(id) ON DELETE CASCADE,
    order_index INTEGER NOT NULL,
    item_id BLOB NOT NULL REFERENCES item(id),
    amount_min REAL NOT NULL,
    amount_max REAL NOT NULL,
    probability REAL NOT NULL,
    PRIMARY KEY (recipe_id, order_index)
);

CREATE TABLE IF NOT EXISTS combination_recipe (
    combination_id BLOB NOT NULL REFERENCES combination(id) ON DELETE CASCADE,
    recipe_id BLOB NOT NULL REFERENCES recipe(id),
    PRIMARY KEY (combination_id, recipe_id)
);

CREATE TABLE IF NOT EXISTS translation (
    id BLOB PRIMARY KEY,
    locale TEXT NOT NULL,
    type TEXT NOT NULL,
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    description TEXT NOT NULL,
    is_duplicated_by_machine INTEGER NOT NULL DEFAULT 0,
    is_duplicated_by_recipe INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS combination_translation (
    combination_id BLOB NOT NULL REFERENCES combination(id) ON DELETE CASCADE,
    translation_id BLOB NOT NULL REFERENCES translation(id),
    PRIMARY KEY (combination_id, translation_id)
);

CREATE TABLE IF NOT EXISTS icon_image (
    id BLOB PRIMARY KEY,
    size INTEGER NOT NULL,
    contents BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS icon (
    combination_id BLOB NOT NULL REFERENCES combination(id) ON DELETE CASCADE,
    type TEXT NOT NULL,
    name TEXT NOT NULL,
    image_id BLOB NOT NULL REFERENCES icon_image(id),
    PRIMARY KEY (combination_id, type, name)
);

CREATE INDEX IF NOT EXISTS idx_recipe_ingredient_item ON recipe_ingredient(item_id);
CREATE INDEX IF NOT EXISTS idx_recipe_product_item ON recipe_product(item_id);
CREATE INDEX IF NOT EXISTS idx_recipe_crafting_category ON recipe(crafting_category_id);
CREATE INDEX IF NOT EXISTS idx_machine_crafting_category ON machine_crafting_category(crafting_category_id);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置（含 SQL 追踪）
pub fn open_sqlite_connection(db_path: &Path) -> rusqlite::Result<Connection> {
    let mut conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    crate::perf::install_sqlite_tracing(&mut conn);
    Ok(conn)
}

/// 幂等建表并登记 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 打开连接、建表，并在 schema 版本不一致时告警
pub fn open_and_migrate(db_path: &Path) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    match read_schema_version(&conn)? {
        Some(v) if v != CURRENT_SCHEMA_VERSION => {
            tracing::warn!(
                expected = CURRENT_SCHEMA_VERSION,
                actual = v,
                "数据库 schema_version 与当前代码不一致"
            );
        }
        _ => {}
    }
    Ok(conn)
}
