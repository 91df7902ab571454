// ==========================================
// 组合导入引擎 - 分块内标识缓存
// ==========================================
// 生命周期: 由单个分块创建，分块结束即丢弃，不跨运行共享
// ==========================================

use crate::domain::Identity;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::{EntityRepository, RepositoryResult};
use rusqlite::Connection;
use std::collections::HashMap;

pub struct IdentityCache<T> {
    kind: &'static str,
    entries: HashMap<Identity, T>,
}

impl<T> IdentityCache<T> {
    /// kind 用于 MissingEntity 报错
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    /// 批量读取尚未缓存的标识
    pub fn fill<R>(&mut self, conn: &Connection, ids: impl IntoIterator<Item = Identity>) -> RepositoryResult<()>
    where
        R: EntityRepository<Entity = T>,
    {
        let mut missing: Vec<Identity> = ids
            .into_iter()
            .filter(|id| !self.entries.contains_key(id))
            .collect();
        missing.sort_unstable();
        missing.dedup();

        if missing.is_empty() {
            return Ok(());
        }
        self.entries.extend(R::find_by_ids_tx(conn, &missing)?);
        Ok(())
    }
}

impl<T: Clone> IdentityCache<T> {
    /// 取出缓存实体，缺失时以 key 报 MissingEntity
    pub fn require(&self, id: &Identity, key: impl FnOnce() -> String) -> ImportResult<T> {
        self.entries
            .get(id)
            .cloned()
            .ok_or_else(|| ImportError::missing(self.kind, key()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemType, Item};
    use crate::importer::identity::item_id;
    use crate::repository::ItemRepository;

    #[test]
    fn test_require_reports_kind_and_key() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();

        let plate = Item {
            id: item_id(ItemType::Item, "iron-plate"),
            item_type: ItemType::Item,
            name: "iron-plate".to_string(),
        };
        ItemRepository::save_tx(&conn, &plate, true).unwrap();

        let gear_id = item_id(ItemType::Item, "iron-gear-wheel");
        let mut cache: IdentityCache<Item> = IdentityCache::new("item");
        cache.fill::<ItemRepository>(&conn, [plate.id, gear_id, plate.id]).unwrap();
        // 已缓存的标识不再查询
        cache.fill::<ItemRepository>(&conn, [plate.id]).unwrap();

        assert_eq!(cache.require(&plate.id, || "item/iron-plate".into()).unwrap(), plate);
        let err = cache.require(&gear_id, || "item/iron-gear-wheel".into()).unwrap_err();
        assert!(matches!(
            err,
            ImportError::MissingEntity { ref kind, ref key } if kind == "item" && key == "item/iron-gear-wheel"
        ));
    }
}
