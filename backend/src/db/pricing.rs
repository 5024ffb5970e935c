//! Price packages and their per-service unit prices.

use common::model::pricing::{
    PriceEntry, PricePackage, PricePackageCreate, PricePackageUpdate, ServicePrice,
};
use common::requests::ListQuery;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{codegen, now_rfc3339, Db, DbError, DbResult, Filters, Page};

const PACKAGE_COLUMNS: &str = "id, name, code, description, is_active, created_at, updated_at";

fn row_to_package(row: &Row) -> rusqlite::Result<PricePackage> {
    Ok(PricePackage {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        description: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        prices: Vec::new(),
    })
}

fn load_prices(conn: &Connection, package_id: &str) -> DbResult<Vec<ServicePrice>> {
    let mut stmt = conn.prepare(
        "SELECT sp.service_id, COALESCE(s.name, ''), sp.unit_price
         FROM service_prices sp
         LEFT JOIN services s ON s.id = sp.service_id
         WHERE sp.package_id = ?1
         ORDER BY s.name",
    )?;
    let rows = stmt.query_map([package_id], |row| {
        Ok(ServicePrice {
            service_id: row.get(0)?,
            service_name: row.get(1)?,
            unit_price: row.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

fn replace_prices(conn: &Connection, package_id: &str, prices: &[PriceEntry]) -> DbResult<()> {
    conn.execute(
        "DELETE FROM service_prices WHERE package_id = ?1",
        [package_id],
    )?;
    for entry in prices {
        if entry.unit_price < 0.0 {
            return Err(DbError::Validation("Đơn giá không được âm".into()));
        }
        let known: i64 = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM services WHERE id = ?1)",
            [&entry.service_id],
            |row| row.get(0),
        )?;
        if known == 0 {
            return Err(DbError::Validation("Dịch vụ trong bảng giá không tồn tại".into()));
        }
        conn.execute(
            "INSERT INTO service_prices (package_id, service_id, unit_price) VALUES (?1, ?2, ?3)",
            params![package_id, entry.service_id, entry.unit_price],
        )?;
    }
    Ok(())
}

impl Db {
    pub fn insert_price_package(&self, req: PricePackageCreate) -> DbResult<PricePackage> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(DbError::Validation("Tên bảng giá không được để trống".into()));
        }

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let code = codegen::next_sequential_code(&tx, "BG")?;
        let now = now_rfc3339();
        let id = Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO price_packages (id, name, code, description, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)",
            params![id, name, code, req.description, now, now],
        )?;
        replace_prices(&tx, &id, &req.prices)?;
        let prices = load_prices(&tx, &id)?;
        tx.commit()?;

        Ok(PricePackage {
            id,
            name: name.to_string(),
            code,
            description: req.description,
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
            prices,
        })
    }

    pub fn get_price_package(&self, id: &str) -> DbResult<Option<PricePackage>> {
        let conn = self.lock();
        let package = conn
            .query_row(
                &format!("SELECT {PACKAGE_COLUMNS} FROM price_packages WHERE id = ?1"),
                [id],
                row_to_package,
            )
            .optional()?;
        match package {
            Some(mut p) => {
                p.prices = load_prices(&conn, &p.id)?;
                Ok(Some(p))
            }
            None => Ok(None),
        }
    }

    pub fn list_price_packages(
        &self,
        q: &ListQuery,
        page: Page,
    ) -> DbResult<(Vec<PricePackage>, u64)> {
        let mut filters = Filters::new();
        filters.push_search(&q.search, &["name", "code"]);
        filters.push_active(q.active);

        let conn = self.lock();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM price_packages{}", filters.where_sql()),
            filters.params().as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {PACKAGE_COLUMNS} FROM price_packages{} ORDER BY code LIMIT {} OFFSET {}",
            filters.where_sql(),
            page.limit,
            page.offset()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(filters.params().as_slice(), row_to_package)?;
        let mut packages = rows.collect::<Result<Vec<_>, _>>()?;
        for package in &mut packages {
            package.prices = load_prices(&conn, &package.id)?;
        }
        Ok((packages, total as u64))
    }

    pub fn update_price_package(&self, id: &str, upd: PricePackageUpdate) -> DbResult<PricePackage> {
        let mut package = self
            .get_price_package(id)?
            .ok_or_else(|| DbError::NotFound("Không tìm thấy bảng giá".into()))?;

        if let Some(name) = upd.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DbError::Validation("Tên bảng giá không được để trống".into()));
            }
            package.name = name;
        }
        if let Some(description) = upd.description {
            package.description = Some(description);
        }
        if let Some(active) = upd.is_active {
            package.is_active = active;
        }
        package.updated_at = now_rfc3339();

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE price_packages
             SET name = ?2, description = ?3, is_active = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                package.id,
                package.name,
                package.description,
                package.is_active,
                package.updated_at,
            ],
        )?;
        if let Some(prices) = &upd.prices {
            replace_prices(&tx, &package.id, prices)?;
        }
        package.prices = load_prices(&tx, &package.id)?;
        tx.commit()?;
        Ok(package)
    }

    pub fn delete_price_package(&self, id: &str) -> DbResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM service_prices WHERE package_id = ?1", [id])?;
        let affected = tx.execute("DELETE FROM price_packages WHERE id = ?1", [id])?;
        tx.commit()?;
        if affected == 0 {
            return Err(DbError::NotFound("Không tìm thấy bảng giá".into()));
        }
        Ok(())
    }

    /// Unit price of a service inside a package, if the package lists it.
    pub fn package_price(&self, package_id: &str, service_id: &str) -> DbResult<Option<f64>> {
        let conn = self.lock();
        conn.query_row(
            "SELECT unit_price FROM service_prices WHERE package_id = ?1 AND service_id = ?2",
            params![package_id, service_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::catalog::{ServiceCreate, ServiceGroupCreate};

    fn setup() -> (Db, String) {
        let db = Db::open_in_memory().unwrap();
        let group = db
            .insert_service_group(ServiceGroupCreate {
                name: "Trị liệu".into(),
                description: None,
            })
            .unwrap();
        let service = db
            .insert_service(ServiceCreate {
                name: "Massage".into(),
                group_id: group.id,
                unit: Some("buổi".into()),
                description: None,
            })
            .unwrap();
        (db, service.id)
    }

    #[test]
    fn create_package_with_prices() {
        let (db, service_id) = setup();
        let package = db
            .insert_price_package(PricePackageCreate {
                name: "Bảng giá chuẩn".into(),
                description: None,
                prices: vec![PriceEntry {
                    service_id: service_id.clone(),
                    unit_price: 350_000.0,
                }],
            })
            .unwrap();

        assert_eq!(package.code, "BG-0001");
        assert_eq!(package.prices.len(), 1);
        assert_eq!(package.prices[0].service_name, "Massage");
        assert_eq!(
            db.package_price(&package.id, &service_id).unwrap(),
            Some(350_000.0)
        );
    }

    #[test]
    fn unknown_service_rolls_back_creation() {
        let (db, _) = setup();
        let err = db
            .insert_price_package(PricePackageCreate {
                name: "Hỏng".into(),
                description: None,
                prices: vec![PriceEntry {
                    service_id: "missing".into(),
                    unit_price: 1.0,
                }],
            })
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let (rows, total) = db
            .list_price_packages(&ListQuery::default(), Page { page: 1, limit: 20 })
            .unwrap();
        assert_eq!(total, 0);
        assert!(rows.is_empty());
    }

    #[test]
    fn updating_prices_replaces_rows() {
        let (db, service_id) = setup();
        let package = db
            .insert_price_package(PricePackageCreate {
                name: "Bảng giá".into(),
                description: None,
                prices: vec![PriceEntry {
                    service_id: service_id.clone(),
                    unit_price: 100.0,
                }],
            })
            .unwrap();

        let updated = db
            .update_price_package(
                &package.id,
                PricePackageUpdate {
                    prices: Some(vec![PriceEntry {
                        service_id: service_id.clone(),
                        unit_price: 150.0,
                    }]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.prices[0].unit_price, 150.0);
    }

    #[test]
    fn delete_removes_package_and_prices() {
        let (db, service_id) = setup();
        let package = db
            .insert_price_package(PricePackageCreate {
                name: "Bảng giá".into(),
                description: None,
                prices: vec![PriceEntry {
                    service_id: service_id.clone(),
                    unit_price: 100.0,
                }],
            })
            .unwrap();

        db.delete_price_package(&package.id).unwrap();
        assert!(db.get_price_package(&package.id).unwrap().is_none());
        assert_eq!(db.package_price(&package.id, &service_id).unwrap(), None);
    }
}
