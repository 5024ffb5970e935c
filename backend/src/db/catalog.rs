//! Service-group and service catalog operations.

use common::model::catalog::{
    Service, ServiceCreate, ServiceGroup, ServiceGroupCreate, ServiceGroupUpdate, ServiceUpdate,
};
use common::requests::ListQuery;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{codegen, now_rfc3339, Db, DbError, DbResult, Filters, Page};

fn row_to_group(row: &Row) -> rusqlite::Result<ServiceGroup> {
    Ok(ServiceGroup {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        description: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn row_to_service(row: &Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        group_id: row.get(3)?,
        unit: row.get(4)?,
        description: row.get(5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

const GROUP_COLUMNS: &str = "id, name, code, description, is_active, created_at, updated_at";
const SERVICE_COLUMNS: &str =
    "id, name, code, group_id, unit, description, is_active, created_at, updated_at";

impl Db {
    pub fn insert_service_group(&self, req: ServiceGroupCreate) -> DbResult<ServiceGroup> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(DbError::Validation(
                "Tên nhóm dịch vụ không được để trống".into(),
            ));
        }

        let conn = self.lock();
        let code = codegen::next_sequential_code(&conn, "SG")?;
        let now = now_rfc3339();
        let group = ServiceGroup {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            code,
            description: req.description,
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        };
        conn.execute(
            "INSERT INTO service_groups (id, name, code, description, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                group.id,
                group.name,
                group.code,
                group.description,
                group.is_active,
                group.created_at,
                group.updated_at,
            ],
        )?;
        Ok(group)
    }

    pub fn get_service_group(&self, id: &str) -> DbResult<Option<ServiceGroup>> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {GROUP_COLUMNS} FROM service_groups WHERE id = ?1"),
            [id],
            row_to_group,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_service_groups(
        &self,
        q: &ListQuery,
        page: Page,
    ) -> DbResult<(Vec<ServiceGroup>, u64)> {
        let mut filters = Filters::new();
        filters.push_search(&q.search, &["name", "code"]);
        filters.push_active(q.active);

        let conn = self.lock();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM service_groups{}", filters.where_sql()),
            filters.params().as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {GROUP_COLUMNS} FROM service_groups{} ORDER BY code LIMIT {} OFFSET {}",
            filters.where_sql(),
            page.limit,
            page.offset()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(filters.params().as_slice(), row_to_group)?;
        let groups = rows.collect::<Result<Vec<_>, _>>()?;
        Ok((groups, total as u64))
    }

    pub fn update_service_group(&self, id: &str, upd: ServiceGroupUpdate) -> DbResult<ServiceGroup> {
        let mut group = self
            .get_service_group(id)?
            .ok_or_else(|| DbError::NotFound("Không tìm thấy nhóm dịch vụ".into()))?;

        if let Some(name) = upd.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DbError::Validation(
                    "Tên nhóm dịch vụ không được để trống".into(),
                ));
            }
            group.name = name;
        }
        if let Some(description) = upd.description {
            group.description = Some(description);
        }
        if let Some(active) = upd.is_active {
            group.is_active = active;
        }
        group.updated_at = now_rfc3339();

        let conn = self.lock();
        conn.execute(
            "UPDATE service_groups
             SET name = ?2, description = ?3, is_active = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                group.id,
                group.name,
                group.description,
                group.is_active,
                group.updated_at,
            ],
        )?;
        Ok(group)
    }

    /// Refuses while services still reference the group.
    pub fn delete_service_group(&self, id: &str) -> DbResult<()> {
        let conn = self.lock();
        let in_use: i64 = conn.query_row(
            "SELECT COUNT(*) FROM services WHERE group_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        if in_use > 0 {
            return Err(DbError::Constraint(
                "Nhóm dịch vụ đang có dịch vụ liên kết, không thể xóa".into(),
            ));
        }
        let affected = conn.execute("DELETE FROM service_groups WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(DbError::NotFound("Không tìm thấy nhóm dịch vụ".into()));
        }
        Ok(())
    }

    pub fn insert_service(&self, req: ServiceCreate) -> DbResult<Service> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(DbError::Validation("Tên dịch vụ không được để trống".into()));
        }
        if self.get_service_group(&req.group_id)?.is_none() {
            return Err(DbError::Validation("Nhóm dịch vụ không tồn tại".into()));
        }

        let conn = self.lock();
        let code = codegen::next_sequential_code(&conn, "DV")?;
        let now = now_rfc3339();
        let service = Service {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            code,
            group_id: req.group_id,
            unit: req.unit,
            description: req.description,
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        };
        conn.execute(
            "INSERT INTO services (id, name, code, group_id, unit, description, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                service.id,
                service.name,
                service.code,
                service.group_id,
                service.unit,
                service.description,
                service.is_active,
                service.created_at,
                service.updated_at,
            ],
        )?;
        Ok(service)
    }

    pub fn get_service(&self, id: &str) -> DbResult<Option<Service>> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1"),
            [id],
            row_to_service,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_services(&self, q: &ListQuery, page: Page) -> DbResult<(Vec<Service>, u64)> {
        let mut filters = Filters::new();
        filters.push_search(&q.search, &["name", "code"]);
        filters.push_active(q.active);
        if let Some(group_id) = &q.group_id {
            filters.push("group_id = ?", group_id.clone());
        }

        let conn = self.lock();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM services{}", filters.where_sql()),
            filters.params().as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {SERVICE_COLUMNS} FROM services{} ORDER BY code LIMIT {} OFFSET {}",
            filters.where_sql(),
            page.limit,
            page.offset()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(filters.params().as_slice(), row_to_service)?;
        let services = rows.collect::<Result<Vec<_>, _>>()?;
        Ok((services, total as u64))
    }

    pub fn update_service(&self, id: &str, upd: ServiceUpdate) -> DbResult<Service> {
        let mut service = self
            .get_service(id)?
            .ok_or_else(|| DbError::NotFound("Không tìm thấy dịch vụ".into()))?;

        if let Some(name) = upd.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DbError::Validation("Tên dịch vụ không được để trống".into()));
            }
            service.name = name;
        }
        if let Some(group_id) = upd.group_id {
            if self.get_service_group(&group_id)?.is_none() {
                return Err(DbError::Validation("Nhóm dịch vụ không tồn tại".into()));
            }
            service.group_id = group_id;
        }
        if let Some(unit) = upd.unit {
            service.unit = Some(unit);
        }
        if let Some(description) = upd.description {
            service.description = Some(description);
        }
        if let Some(active) = upd.is_active {
            service.is_active = active;
        }
        service.updated_at = now_rfc3339();

        let conn = self.lock();
        conn.execute(
            "UPDATE services
             SET name = ?2, group_id = ?3, unit = ?4, description = ?5, is_active = ?6, updated_at = ?7
             WHERE id = ?1",
            params![
                service.id,
                service.name,
                service.group_id,
                service.unit,
                service.description,
                service.is_active,
                service.updated_at,
            ],
        )?;
        Ok(service)
    }

    pub fn delete_service(&self, id: &str) -> DbResult<()> {
        let conn = self.lock();
        let priced: i64 = conn.query_row(
            "SELECT COUNT(*) FROM service_prices WHERE service_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        if priced > 0 {
            return Err(DbError::Constraint(
                "Dịch vụ đang nằm trong bảng giá, không thể xóa".into(),
            ));
        }
        let affected = conn.execute("DELETE FROM services WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(DbError::NotFound("Không tìm thấy dịch vụ".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Db {
        Db::open_in_memory().unwrap()
    }

    fn create_group(db: &Db, name: &str) -> ServiceGroup {
        db.insert_service_group(ServiceGroupCreate {
            name: name.into(),
            description: None,
        })
        .unwrap()
    }

    #[test]
    fn first_group_gets_sg_0001() {
        let db = setup_db();
        let first = create_group(&db, "Chăm sóc da");
        let second = create_group(&db, "Trị liệu");
        assert_eq!(first.code, "SG-0001");
        assert_eq!(second.code, "SG-0002");
    }

    #[test]
    fn list_filters_and_pages() {
        let db = setup_db();
        for i in 0..25 {
            create_group(&db, &format!("Nhóm {i}"));
        }

        let q = ListQuery::default();
        let (rows, total) = db.list_service_groups(&q, Page { page: 2, limit: 20 }).unwrap();
        assert_eq!(total, 25);
        assert_eq!(rows.len(), 5);

        let q = ListQuery {
            search: Some("Nhóm 7".into()),
            ..Default::default()
        };
        let (rows, total) = db.list_service_groups(&q, Page { page: 1, limit: 20 }).unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].name, "Nhóm 7");
    }

    #[test]
    fn service_requires_existing_group() {
        let db = setup_db();
        let err = db
            .insert_service(ServiceCreate {
                name: "Massage".into(),
                group_id: "missing".into(),
                unit: None,
                description: None,
            })
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[test]
    fn group_with_services_cannot_be_deleted() {
        let db = setup_db();
        let group = create_group(&db, "Trị liệu");
        db.insert_service(ServiceCreate {
            name: "Massage".into(),
            group_id: group.id.clone(),
            unit: Some("buổi".into()),
            description: None,
        })
        .unwrap();

        let err = db.delete_service_group(&group.id).unwrap_err();
        assert!(matches!(err, DbError::Constraint(_)));
    }

    #[test]
    fn update_changes_only_submitted_fields() {
        let db = setup_db();
        let group = create_group(&db, "Trị liệu");
        let updated = db
            .update_service_group(
                &group.id,
                ServiceGroupUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Trị liệu");
        assert!(!updated.is_active);
        assert_eq!(updated.code, group.code);
    }
}
