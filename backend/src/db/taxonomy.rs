//! Taxonomy store shared by the care and reject hierarchies.
//!
//! Both taxonomies have the same shape (group -> entries with a denormalized
//! group name), so one store serves both, parameterized by table pair instead
//! of duplicating the CRUD per resource.

use common::model::taxonomy::{
    TaxonomyGroup, TaxonomyGroupCreate, TaxonomyGroupUpdate, TaxonomyItem, TaxonomyItemCreate,
    TaxonomyItemUpdate,
};
use common::requests::ListQuery;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{codegen, now_rfc3339, Db, DbError, DbResult, Filters, Page};

/// Table pair plus the Vietnamese nouns used in user-facing messages.
#[derive(Clone, Copy, Debug)]
pub struct TaxonomyTables {
    pub groups: &'static str,
    pub items: &'static str,
    pub group_label: &'static str,
    pub item_label: &'static str,
}

pub const CARE: TaxonomyTables = TaxonomyTables {
    groups: "care_groups",
    items: "care_results",
    group_label: "nhóm chăm sóc",
    item_label: "kết quả chăm sóc",
};

pub const REJECT: TaxonomyTables = TaxonomyTables {
    groups: "reject_groups",
    items: "reject_reasons",
    group_label: "nhóm từ chối",
    item_label: "lý do từ chối",
};

fn row_to_group(row: &Row) -> rusqlite::Result<TaxonomyGroup> {
    Ok(TaxonomyGroup {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        display_order: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn row_to_item(row: &Row) -> rusqlite::Result<TaxonomyItem> {
    Ok(TaxonomyItem {
        id: row.get(0)?,
        group_id: row.get(1)?,
        group_name: row.get(2)?,
        name: row.get(3)?,
        classification: row.get(4)?,
        code: row.get(5)?,
        display_order: row.get(6)?,
        is_active: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

const GROUP_COLUMNS: &str = "id, name, code, display_order, is_active, created_at, updated_at";
const ITEM_COLUMNS: &str =
    "id, group_id, group_name, name, classification, code, display_order, is_active, created_at, updated_at";

impl Db {
    pub fn insert_taxonomy_group(
        &self,
        t: TaxonomyTables,
        req: TaxonomyGroupCreate,
    ) -> DbResult<TaxonomyGroup> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(DbError::Validation(format!(
                "Tên {} không được để trống",
                t.group_label
            )));
        }

        let conn = self.lock();
        let code = codegen::unique_code(&conn, t.groups, &codegen::initials_code(name))?;
        let now = now_rfc3339();
        let group = TaxonomyGroup {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            code,
            display_order: req.display_order.unwrap_or(0),
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        };
        conn.execute(
            &format!(
                "INSERT INTO {} (id, name, code, display_order, is_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                t.groups
            ),
            params![
                group.id,
                group.name,
                group.code,
                group.display_order,
                group.is_active,
                group.created_at,
                group.updated_at,
            ],
        )?;
        Ok(group)
    }

    pub fn get_taxonomy_group(&self, t: TaxonomyTables, id: &str) -> DbResult<Option<TaxonomyGroup>> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {GROUP_COLUMNS} FROM {} WHERE id = ?1", t.groups),
            [id],
            row_to_group,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_taxonomy_groups(
        &self,
        t: TaxonomyTables,
        q: &ListQuery,
        page: Page,
    ) -> DbResult<(Vec<TaxonomyGroup>, u64)> {
        let mut filters = Filters::new();
        filters.push_search(&q.search, &["name", "code"]);
        filters.push_active(q.active);

        let conn = self.lock();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}{}", t.groups, filters.where_sql()),
            filters.params().as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {GROUP_COLUMNS} FROM {}{} ORDER BY display_order, name LIMIT {} OFFSET {}",
            t.groups,
            filters.where_sql(),
            page.limit,
            page.offset()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(filters.params().as_slice(), row_to_group)?;
        let groups = rows.collect::<Result<Vec<_>, _>>()?;
        Ok((groups, total as u64))
    }

    /// Renaming a group rewrites the denormalized `group_name` on every entry
    /// referencing it, in the same transaction.
    pub fn update_taxonomy_group(
        &self,
        t: TaxonomyTables,
        id: &str,
        upd: TaxonomyGroupUpdate,
    ) -> DbResult<TaxonomyGroup> {
        let mut group = self
            .get_taxonomy_group(t, id)?
            .ok_or_else(|| DbError::NotFound(format!("Không tìm thấy {}", t.group_label)))?;

        let mut renamed = false;
        if let Some(name) = upd.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DbError::Validation(format!(
                    "Tên {} không được để trống",
                    t.group_label
                )));
            }
            renamed = name != group.name;
            group.name = name;
        }
        if let Some(order) = upd.display_order {
            group.display_order = order;
        }
        if let Some(active) = upd.is_active {
            group.is_active = active;
        }
        group.updated_at = now_rfc3339();

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            &format!(
                "UPDATE {} SET name = ?2, display_order = ?3, is_active = ?4, updated_at = ?5
                 WHERE id = ?1",
                t.groups
            ),
            params![
                group.id,
                group.name,
                group.display_order,
                group.is_active,
                group.updated_at,
            ],
        )?;
        if renamed {
            tx.execute(
                &format!(
                    "UPDATE {} SET group_name = ?2, updated_at = ?3 WHERE group_id = ?1",
                    t.items
                ),
                params![group.id, group.name, group.updated_at],
            )?;
        }
        tx.commit()?;
        Ok(group)
    }

    /// Refuses while entries still reference the group.
    pub fn delete_taxonomy_group(&self, t: TaxonomyTables, id: &str) -> DbResult<()> {
        let conn = self.lock();
        let in_use: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE group_id = ?1", t.items),
            [id],
            |row| row.get(0),
        )?;
        if in_use > 0 {
            return Err(DbError::Constraint(format!(
                "{} đang có {} liên kết, không thể xóa",
                capitalize(t.group_label),
                t.item_label
            )));
        }
        let affected = conn.execute(&format!("DELETE FROM {} WHERE id = ?1", t.groups), [id])?;
        if affected == 0 {
            return Err(DbError::NotFound(format!("Không tìm thấy {}", t.group_label)));
        }
        Ok(())
    }

    pub fn insert_taxonomy_item(
        &self,
        t: TaxonomyTables,
        req: TaxonomyItemCreate,
    ) -> DbResult<TaxonomyItem> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(DbError::Validation(format!(
                "Tên {} không được để trống",
                t.item_label
            )));
        }
        let group = self
            .get_taxonomy_group(t, &req.group_id)?
            .ok_or_else(|| DbError::Validation(format!("{} không tồn tại", capitalize(t.group_label))))?;

        let conn = self.lock();
        let base = codegen::child_code_base(&group.code, name);
        let code = codegen::unique_code(&conn, t.items, &base)?;
        let now = now_rfc3339();
        let item = TaxonomyItem {
            id: Uuid::new_v4().to_string(),
            group_id: group.id,
            group_name: group.name,
            name: name.to_string(),
            classification: req.classification,
            code,
            display_order: req.display_order.unwrap_or(0),
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        };
        conn.execute(
            &format!(
                "INSERT INTO {} (id, group_id, group_name, name, classification, code, display_order, is_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                t.items
            ),
            params![
                item.id,
                item.group_id,
                item.group_name,
                item.name,
                item.classification,
                item.code,
                item.display_order,
                item.is_active,
                item.created_at,
                item.updated_at,
            ],
        )?;
        Ok(item)
    }

    pub fn get_taxonomy_item(&self, t: TaxonomyTables, id: &str) -> DbResult<Option<TaxonomyItem>> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM {} WHERE id = ?1", t.items),
            [id],
            row_to_item,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_taxonomy_items(
        &self,
        t: TaxonomyTables,
        q: &ListQuery,
        page: Page,
    ) -> DbResult<(Vec<TaxonomyItem>, u64)> {
        let mut filters = Filters::new();
        filters.push_search(&q.search, &["name", "code"]);
        filters.push_active(q.active);
        if let Some(group_id) = &q.group_id {
            filters.push("group_id = ?", group_id.clone());
        }

        let conn = self.lock();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}{}", t.items, filters.where_sql()),
            filters.params().as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM {}{} ORDER BY display_order, name LIMIT {} OFFSET {}",
            t.items,
            filters.where_sql(),
            page.limit,
            page.offset()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(filters.params().as_slice(), row_to_item)?;
        let items = rows.collect::<Result<Vec<_>, _>>()?;
        Ok((items, total as u64))
    }

    pub fn update_taxonomy_item(
        &self,
        t: TaxonomyTables,
        id: &str,
        upd: TaxonomyItemUpdate,
    ) -> DbResult<TaxonomyItem> {
        let mut item = self
            .get_taxonomy_item(t, id)?
            .ok_or_else(|| DbError::NotFound(format!("Không tìm thấy {}", t.item_label)))?;

        if let Some(name) = upd.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DbError::Validation(format!(
                    "Tên {} không được để trống",
                    t.item_label
                )));
            }
            item.name = name;
        }
        if let Some(classification) = upd.classification {
            item.classification = Some(classification);
        }
        if let Some(order) = upd.display_order {
            item.display_order = order;
        }
        if let Some(active) = upd.is_active {
            item.is_active = active;
        }
        item.updated_at = now_rfc3339();

        let conn = self.lock();
        conn.execute(
            &format!(
                "UPDATE {} SET name = ?2, classification = ?3, display_order = ?4, is_active = ?5, updated_at = ?6
                 WHERE id = ?1",
                t.items
            ),
            params![
                item.id,
                item.name,
                item.classification,
                item.display_order,
                item.is_active,
                item.updated_at,
            ],
        )?;
        Ok(item)
    }

    pub fn delete_taxonomy_item(&self, t: TaxonomyTables, id: &str) -> DbResult<()> {
        let conn = self.lock();
        let affected = conn.execute(&format!("DELETE FROM {} WHERE id = ?1", t.items), [id])?;
        if affected == 0 {
            return Err(DbError::NotFound(format!("Không tìm thấy {}", t.item_label)));
        }
        Ok(())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Db {
        Db::open_in_memory().unwrap()
    }

    fn create_group(db: &Db, t: TaxonomyTables, name: &str) -> TaxonomyGroup {
        db.insert_taxonomy_group(
            t,
            TaxonomyGroupCreate {
                name: name.into(),
                display_order: None,
            },
        )
        .unwrap()
    }

    fn create_item(db: &Db, t: TaxonomyTables, group_id: &str, name: &str) -> TaxonomyItem {
        db.insert_taxonomy_item(
            t,
            TaxonomyItemCreate {
                group_id: group_id.into(),
                name: name.into(),
                classification: None,
                display_order: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn group_codes_resolve_collisions() {
        let db = setup_db();
        let first = create_group(&db, CARE, "Gọi điện - Email");
        let second = create_group(&db, CARE, "Gọi điện - Email");
        assert_eq!(first.code, "GDE");
        assert_eq!(second.code, "GDE2");
    }

    #[test]
    fn care_and_reject_codes_do_not_collide() {
        let db = setup_db();
        let care = create_group(&db, CARE, "Tư vấn");
        let reject = create_group(&db, REJECT, "Tư vấn");
        // Same code in different tables is fine; uniqueness is per taxonomy.
        assert_eq!(care.code, "TV");
        assert_eq!(reject.code, "TV");
    }

    #[test]
    fn item_code_carries_parent_prefix() {
        let db = setup_db();
        let group = create_group(&db, CARE, "Gọi điện - Email");
        let item = create_item(&db, CARE, &group.id, "Không nghe máy");
        assert_eq!(item.code, "GD-KNM");
        assert_eq!(item.group_name, group.name);
    }

    #[test]
    fn renaming_group_rewrites_item_group_names() {
        let db = setup_db();
        let group = create_group(&db, CARE, "Gọi điện");
        let a = create_item(&db, CARE, &group.id, "Không nghe máy");
        let b = create_item(&db, CARE, &group.id, "Hẹn gọi lại");

        db.update_taxonomy_group(
            CARE,
            &group.id,
            TaxonomyGroupUpdate {
                name: Some("Gọi điện thoại".into()),
                ..Default::default()
            },
        )
        .unwrap();

        for id in [&a.id, &b.id] {
            let item = db.get_taxonomy_item(CARE, id).unwrap().unwrap();
            assert_eq!(item.group_name, "Gọi điện thoại");
        }
    }

    #[test]
    fn group_with_items_cannot_be_deleted() {
        let db = setup_db();
        let group = create_group(&db, CARE, "Gọi điện");
        let item = create_item(&db, CARE, &group.id, "Không nghe máy");

        let err = db.delete_taxonomy_group(CARE, &group.id).unwrap_err();
        assert!(matches!(err, DbError::Constraint(_)));

        db.delete_taxonomy_item(CARE, &item.id).unwrap();
        db.delete_taxonomy_group(CARE, &group.id).unwrap();
        assert!(db.get_taxonomy_group(CARE, &group.id).unwrap().is_none());
    }

    #[test]
    fn item_requires_existing_group() {
        let db = setup_db();
        let err = db
            .insert_taxonomy_item(
                REJECT,
                TaxonomyItemCreate {
                    group_id: "missing".into(),
                    name: "Giá cao".into(),
                    classification: None,
                    display_order: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }
}
