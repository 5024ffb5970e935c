//! Department and position reference data.

use common::model::org::{
    Department, DepartmentCreate, DepartmentUpdate, Position, PositionCreate, PositionUpdate,
};
use common::requests::ListQuery;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{codegen, now_rfc3339, Db, DbError, DbResult, Filters, Page};

const DEPARTMENT_COLUMNS: &str =
    "id, name, description, manager_id, employee_count, is_active, created_at, updated_at";
const POSITION_COLUMNS: &str = "id, name, code, description, is_active, created_at, updated_at";

fn row_to_department(row: &Row) -> rusqlite::Result<Department> {
    Ok(Department {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        manager_id: row.get(3)?,
        employee_count: row.get(4)?,
        is_active: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn row_to_position(row: &Row) -> rusqlite::Result<Position> {
    Ok(Position {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        description: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl Db {
    /// The department name must be unique among active departments; inactive
    /// rows may keep a retired name.
    fn department_name_taken(&self, name: &str, exclude_id: &str) -> DbResult<bool> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM departments WHERE name = ?1 AND is_active = 1 AND id <> ?2",
            params![name, exclude_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn insert_department(&self, req: DepartmentCreate) -> DbResult<Department> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(DbError::Validation(
                "Tên phòng ban không được để trống".into(),
            ));
        }
        if self.department_name_taken(&name, "")? {
            return Err(DbError::Validation("Tên phòng ban đã tồn tại".into()));
        }

        let now = now_rfc3339();
        let department = Department {
            id: Uuid::new_v4().to_string(),
            name,
            description: req.description,
            manager_id: req.manager_id,
            employee_count: req.employee_count.unwrap_or(0),
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        };
        let conn = self.lock();
        conn.execute(
            "INSERT INTO departments (id, name, description, manager_id, employee_count, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                department.id,
                department.name,
                department.description,
                department.manager_id,
                department.employee_count,
                department.is_active,
                department.created_at,
                department.updated_at,
            ],
        )?;
        Ok(department)
    }

    pub fn get_department(&self, id: &str) -> DbResult<Option<Department>> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE id = ?1"),
            [id],
            row_to_department,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_departments(&self, q: &ListQuery, page: Page) -> DbResult<(Vec<Department>, u64)> {
        let mut filters = Filters::new();
        filters.push_search(&q.search, &["name"]);
        filters.push_active(q.active);

        let conn = self.lock();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM departments{}", filters.where_sql()),
            filters.params().as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {DEPARTMENT_COLUMNS} FROM departments{} ORDER BY name LIMIT {} OFFSET {}",
            filters.where_sql(),
            page.limit,
            page.offset()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(filters.params().as_slice(), row_to_department)?;
        let departments = rows.collect::<Result<Vec<_>, _>>()?;
        Ok((departments, total as u64))
    }

    pub fn update_department(&self, id: &str, upd: DepartmentUpdate) -> DbResult<Department> {
        let mut department = self
            .get_department(id)?
            .ok_or_else(|| DbError::NotFound("Không tìm thấy phòng ban".into()))?;

        if let Some(name) = upd.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DbError::Validation(
                    "Tên phòng ban không được để trống".into(),
                ));
            }
            department.name = name;
        }
        if let Some(description) = upd.description {
            department.description = Some(description);
        }
        if let Some(manager_id) = upd.manager_id {
            department.manager_id = Some(manager_id);
        }
        if let Some(count) = upd.employee_count {
            department.employee_count = count;
        }
        if let Some(active) = upd.is_active {
            department.is_active = active;
        }
        // Re-check after applying: reactivating under a taken name must fail too.
        if department.is_active && self.department_name_taken(&department.name, id)? {
            return Err(DbError::Validation("Tên phòng ban đã tồn tại".into()));
        }
        department.updated_at = now_rfc3339();

        let conn = self.lock();
        conn.execute(
            "UPDATE departments
             SET name = ?2, description = ?3, manager_id = ?4, employee_count = ?5,
                 is_active = ?6, updated_at = ?7
             WHERE id = ?1",
            params![
                department.id,
                department.name,
                department.description,
                department.manager_id,
                department.employee_count,
                department.is_active,
                department.updated_at,
            ],
        )?;
        Ok(department)
    }

    pub fn delete_department(&self, id: &str) -> DbResult<()> {
        let conn = self.lock();
        let affected = conn.execute("DELETE FROM departments WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(DbError::NotFound("Không tìm thấy phòng ban".into()));
        }
        Ok(())
    }

    pub fn insert_position(&self, req: PositionCreate) -> DbResult<Position> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(DbError::Validation(
                "Tên chức vụ không được để trống".into(),
            ));
        }

        let conn = self.lock();
        let code = codegen::unique_code(&conn, "positions", &codegen::initials_code(name))?;
        let now = now_rfc3339();
        let position = Position {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            code,
            description: req.description,
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        };
        conn.execute(
            "INSERT INTO positions (id, name, code, description, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                position.id,
                position.name,
                position.code,
                position.description,
                position.is_active,
                position.created_at,
                position.updated_at,
            ],
        )?;
        Ok(position)
    }

    pub fn get_position(&self, id: &str) -> DbResult<Option<Position>> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {POSITION_COLUMNS} FROM positions WHERE id = ?1"),
            [id],
            row_to_position,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_positions(&self, q: &ListQuery, page: Page) -> DbResult<(Vec<Position>, u64)> {
        let mut filters = Filters::new();
        filters.push_search(&q.search, &["name", "code"]);
        filters.push_active(q.active);

        let conn = self.lock();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM positions{}", filters.where_sql()),
            filters.params().as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {POSITION_COLUMNS} FROM positions{} ORDER BY name LIMIT {} OFFSET {}",
            filters.where_sql(),
            page.limit,
            page.offset()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(filters.params().as_slice(), row_to_position)?;
        let positions = rows.collect::<Result<Vec<_>, _>>()?;
        Ok((positions, total as u64))
    }

    pub fn update_position(&self, id: &str, upd: PositionUpdate) -> DbResult<Position> {
        let mut position = self
            .get_position(id)?
            .ok_or_else(|| DbError::NotFound("Không tìm thấy chức vụ".into()))?;

        if let Some(name) = upd.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DbError::Validation(
                    "Tên chức vụ không được để trống".into(),
                ));
            }
            position.name = name;
        }
        if let Some(description) = upd.description {
            position.description = Some(description);
        }
        if let Some(active) = upd.is_active {
            position.is_active = active;
        }
        position.updated_at = now_rfc3339();

        let conn = self.lock();
        conn.execute(
            "UPDATE positions SET name = ?2, description = ?3, is_active = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                position.id,
                position.name,
                position.description,
                position.is_active,
                position.updated_at,
            ],
        )?;
        Ok(position)
    }

    pub fn delete_position(&self, id: &str) -> DbResult<()> {
        let conn = self.lock();
        let affected = conn.execute("DELETE FROM positions WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(DbError::NotFound("Không tìm thấy chức vụ".into()));
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

    fn create_department(db: &Db, name: &str) -> Department {
        db.insert_department(DepartmentCreate {
            name: name.into(),
            description: None,
            manager_id: None,
            employee_count: None,
        })
        .unwrap()
    }

    #[test]
    fn active_department_names_are_unique() {
        let db = setup_db();
        create_department(&db, "Kinh doanh");
        let err = db
            .insert_department(DepartmentCreate {
                name: "Kinh doanh".into(),
                description: None,
                manager_id: None,
                employee_count: None,
            })
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[test]
    fn inactive_department_frees_its_name() {
        let db = setup_db();
        let old = create_department(&db, "Kinh doanh");
        db.update_department(
            &old.id,
            DepartmentUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        // Name is reusable once the old department is inactive.
        create_department(&db, "Kinh doanh");

        // But the old one cannot come back while the name is taken.
        let err = db
            .update_department(
                &old.id,
                DepartmentUpdate {
                    is_active: Some(true),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[test]
    fn position_codes_from_initials() {
        let db = setup_db();
        let p = db
            .insert_position(PositionCreate {
                name: "Trưởng phòng".into(),
                description: None,
            })
            .unwrap();
        assert_eq!(p.code, "TP");

        let p2 = db
            .insert_position(PositionCreate {
                name: "Trợ lý phó".into(),
                description: None,
            })
            .unwrap();
        // "Trợ lý phó" -> TLP, no collision with TP.
        assert_eq!(p2.code, "TLP");
    }
}
