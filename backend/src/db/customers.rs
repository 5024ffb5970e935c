//! Customer database operations. Deletion is always soft: rows keep their
//! history but disappear from list queries.

use common::model::customer::{Customer, CustomerCreate, CustomerUpdate};
use common::requests::ListQuery;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{codegen, now_rfc3339, Db, DbError, DbResult, Filters, Page};

const COLUMNS: &str = "id, code, name, phone, email, address, province, source, notes, \
                       latitude, longitude, is_del, created_at, updated_at";

fn row_to_customer(row: &Row) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        address: row.get(5)?,
        province: row.get(6)?,
        source: row.get(7)?,
        notes: row.get(8)?,
        latitude: row.get(9)?,
        longitude: row.get(10)?,
        is_del: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn validate_contact(email: Option<&str>, phone: Option<&str>) -> DbResult<()> {
    if let Some(email) = email {
        let email = email.trim();
        if !email.is_empty() && (!email.contains('@') || !email.contains('.')) {
            return Err(DbError::Validation("Email không hợp lệ".into()));
        }
    }
    if let Some(phone) = phone {
        let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
        if !phone.trim().is_empty() && !(8..=15).contains(&digits) {
            return Err(DbError::Validation("Số điện thoại không hợp lệ".into()));
        }
    }
    Ok(())
}

impl Db {
    pub fn insert_customer(&self, req: CustomerCreate) -> DbResult<Customer> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(DbError::Validation(
                "Tên khách hàng không được để trống".into(),
            ));
        }
        validate_contact(req.email.as_deref(), req.phone.as_deref())?;

        let conn = self.lock();
        let code = codegen::next_sequential_code(&conn, "KH")?;
        let now = now_rfc3339();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            code,
            name: name.to_string(),
            phone: req.phone,
            email: req.email,
            address: req.address,
            province: req.province,
            source: req.source,
            notes: req.notes,
            latitude: req.latitude,
            longitude: req.longitude,
            is_del: false,
            created_at: now.clone(),
            updated_at: now,
        };
        conn.execute(
            "INSERT INTO customers (id, code, name, phone, email, address, province, source, notes, latitude, longitude, is_del, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                customer.id,
                customer.code,
                customer.name,
                customer.phone,
                customer.email,
                customer.address,
                customer.province,
                customer.source,
                customer.notes,
                customer.latitude,
                customer.longitude,
                customer.is_del,
                customer.created_at,
                customer.updated_at,
            ],
        )?;
        Ok(customer)
    }

    /// Soft-deleted rows are invisible here.
    pub fn get_customer(&self, id: &str) -> DbResult<Option<Customer>> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM customers WHERE id = ?1 AND is_del = 0"),
            [id],
            row_to_customer,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_customers(&self, q: &ListQuery, page: Page) -> DbResult<(Vec<Customer>, u64)> {
        let mut filters = Filters::new();
        filters.push_clause("is_del = 0");
        filters.push_search(&q.search, &["name", "code", "phone"]);

        let conn = self.lock();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM customers{}", filters.where_sql()),
            filters.params().as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {COLUMNS} FROM customers{} ORDER BY code LIMIT {} OFFSET {}",
            filters.where_sql(),
            page.limit,
            page.offset()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(filters.params().as_slice(), row_to_customer)?;
        let customers = rows.collect::<Result<Vec<_>, _>>()?;
        Ok((customers, total as u64))
    }

    /// Every live customer, for the Excel export.
    pub fn export_customers(&self) -> DbResult<Vec<Customer>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM customers WHERE is_del = 0 ORDER BY code"
        ))?;
        let rows = stmt.query_map([], row_to_customer)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn update_customer(&self, id: &str, upd: CustomerUpdate) -> DbResult<Customer> {
        let mut customer = self
            .get_customer(id)?
            .ok_or_else(|| DbError::NotFound("Không tìm thấy khách hàng".into()))?;

        if let Some(name) = upd.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DbError::Validation(
                    "Tên khách hàng không được để trống".into(),
                ));
            }
            customer.name = name;
        }
        validate_contact(upd.email.as_deref(), upd.phone.as_deref())?;
        if let Some(phone) = upd.phone {
            customer.phone = Some(phone);
        }
        if let Some(email) = upd.email {
            customer.email = Some(email);
        }
        if let Some(address) = upd.address {
            customer.address = Some(address);
        }
        if let Some(province) = upd.province {
            customer.province = Some(province);
        }
        if let Some(source) = upd.source {
            customer.source = Some(source);
        }
        if let Some(notes) = upd.notes {
            customer.notes = Some(notes);
        }
        if let Some(latitude) = upd.latitude {
            customer.latitude = Some(latitude);
        }
        if let Some(longitude) = upd.longitude {
            customer.longitude = Some(longitude);
        }
        customer.updated_at = now_rfc3339();

        let conn = self.lock();
        conn.execute(
            "UPDATE customers
             SET name = ?2, phone = ?3, email = ?4, address = ?5, province = ?6,
                 source = ?7, notes = ?8, latitude = ?9, longitude = ?10, updated_at = ?11
             WHERE id = ?1 AND is_del = 0",
            params![
                customer.id,
                customer.name,
                customer.phone,
                customer.email,
                customer.address,
                customer.province,
                customer.source,
                customer.notes,
                customer.latitude,
                customer.longitude,
                customer.updated_at,
            ],
        )?;
        Ok(customer)
    }

    pub fn soft_delete_customer(&self, id: &str) -> DbResult<()> {
        let conn = self.lock();
        let affected = conn.execute(
            "UPDATE customers SET is_del = 1, updated_at = ?2 WHERE id = ?1 AND is_del = 0",
            params![id, now_rfc3339()],
        )?;
        if affected == 0 {
            return Err(DbError::NotFound("Không tìm thấy khách hàng".into()));
        }
        Ok(())
    }

    pub fn has_import_file(&self, md5: &str) -> DbResult<bool> {
        let conn = self.lock();
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM import_files WHERE md5 = ?1)",
            [md5],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    pub fn record_import_file(&self, md5: &str, file_name: &str) -> DbResult<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR REPLACE INTO import_files (md5, file_name, imported_at) VALUES (?1, ?2, ?3)",
            params![md5, file_name, now_rfc3339()],
        )?;
        Ok(())
    }
}
