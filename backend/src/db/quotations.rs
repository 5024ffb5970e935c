//! Quotation operations. Lines snapshot the service name and the unit price
//! in effect when the quotation was written.

use common::model::quotation::{
    Quotation, QuotationCreate, QuotationLine, QuotationLineInput, QuotationUpdate,
};
use common::requests::ListQuery;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{codegen, now_rfc3339, Db, DbError, DbResult, Filters, Page};

const COLUMNS: &str =
    "id, code, customer_id, opportunity_id, package_id, status, notes, total, created_at, updated_at";

fn row_to_quotation(row: &Row) -> rusqlite::Result<Quotation> {
    Ok(Quotation {
        id: row.get(0)?,
        code: row.get(1)?,
        customer_id: row.get(2)?,
        opportunity_id: row.get(3)?,
        package_id: row.get(4)?,
        status: row.get(5)?,
        notes: row.get(6)?,
        total: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        lines: Vec::new(),
    })
}

fn load_lines(conn: &Connection, quotation_id: &str) -> DbResult<Vec<QuotationLine>> {
    let mut stmt = conn.prepare(
        "SELECT service_id, service_name, quantity, unit_price, line_total
         FROM quotation_lines WHERE quotation_id = ?1 ORDER BY rowid",
    )?;
    let rows = stmt.query_map([quotation_id], |row| {
        Ok(QuotationLine {
            service_id: row.get(0)?,
            service_name: row.get(1)?,
            quantity: row.get(2)?,
            unit_price: row.get(3)?,
            line_total: row.get(4)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Resolve submitted line inputs into priced snapshot rows. Missing unit
/// prices are filled from the chosen package; without either, the write is
/// refused.
fn resolve_lines(
    conn: &Connection,
    package_id: Option<&str>,
    inputs: &[QuotationLineInput],
) -> DbResult<Vec<QuotationLine>> {
    if inputs.is_empty() {
        return Err(DbError::Validation(
            "Báo giá phải có ít nhất một dòng dịch vụ".into(),
        ));
    }

    let mut lines = Vec::with_capacity(inputs.len());
    for input in inputs {
        if input.quantity <= 0.0 {
            return Err(DbError::Validation("Số lượng phải lớn hơn 0".into()));
        }
        let service_name: Option<String> = conn
            .query_row(
                "SELECT name FROM services WHERE id = ?1",
                [&input.service_id],
                |row| row.get(0),
            )
            .optional()?;
        let service_name = service_name
            .ok_or_else(|| DbError::Validation("Dịch vụ trong báo giá không tồn tại".into()))?;

        let unit_price = match input.unit_price {
            Some(p) if p >= 0.0 => p,
            Some(_) => return Err(DbError::Validation("Đơn giá không được âm".into())),
            None => {
                let from_package = match package_id {
                    Some(pkg) => conn
                        .query_row(
                            "SELECT unit_price FROM service_prices
                             WHERE package_id = ?1 AND service_id = ?2",
                            params![pkg, input.service_id],
                            |row| row.get(0),
                        )
                        .optional()?,
                    None => None,
                };
                from_package.ok_or_else(|| {
                    DbError::Validation(format!("Thiếu đơn giá cho dịch vụ '{}'", service_name))
                })?
            }
        };

        lines.push(QuotationLine {
            service_id: input.service_id.clone(),
            service_name,
            quantity: input.quantity,
            unit_price,
            line_total: input.quantity * unit_price,
        });
    }
    Ok(lines)
}

fn write_lines(conn: &Connection, quotation_id: &str, lines: &[QuotationLine]) -> DbResult<f64> {
    conn.execute(
        "DELETE FROM quotation_lines WHERE quotation_id = ?1",
        [quotation_id],
    )?;
    let mut total = 0.0;
    for line in lines {
        conn.execute(
            "INSERT INTO quotation_lines (quotation_id, service_id, service_name, quantity, unit_price, line_total)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                quotation_id,
                line.service_id,
                line.service_name,
                line.quantity,
                line.unit_price,
                line.line_total,
            ],
        )?;
        total += line.line_total;
    }
    Ok(total)
}

const STATUSES: &[&str] = &["draft", "sent", "accepted", "rejected"];

impl Db {
    pub fn insert_quotation(&self, req: QuotationCreate) -> DbResult<Quotation> {
        if self.get_customer(&req.customer_id)?.is_none() {
            return Err(DbError::Validation("Khách hàng không tồn tại".into()));
        }
        if let Some(opportunity_id) = &req.opportunity_id {
            if self.get_opportunity(opportunity_id)?.is_none() {
                return Err(DbError::Validation("Cơ hội không tồn tại".into()));
            }
        }
        if let Some(package_id) = &req.package_id {
            if self.get_price_package(package_id)?.is_none() {
                return Err(DbError::Validation("Bảng giá không tồn tại".into()));
            }
        }

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let lines = resolve_lines(&tx, req.package_id.as_deref(), &req.lines)?;
        let code = codegen::next_sequential_code(&tx, "QU")?;
        let now = now_rfc3339();
        let id = Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO quotations (id, code, customer_id, opportunity_id, package_id, status, notes, total, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 'draft', ?6, 0, ?7, ?8)",
            params![
                id,
                code,
                req.customer_id,
                req.opportunity_id,
                req.package_id,
                req.notes,
                now,
                now,
            ],
        )?;
        let total = write_lines(&tx, &id, &lines)?;
        tx.execute(
            "UPDATE quotations SET total = ?2 WHERE id = ?1",
            params![id, total],
        )?;
        tx.commit()?;

        Ok(Quotation {
            id,
            code,
            customer_id: req.customer_id,
            opportunity_id: req.opportunity_id,
            package_id: req.package_id,
            status: "draft".into(),
            notes: req.notes,
            total,
            created_at: now.clone(),
            updated_at: now,
            lines,
        })
    }

    pub fn get_quotation(&self, id: &str) -> DbResult<Option<Quotation>> {
        let conn = self.lock();
        let quotation = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM quotations WHERE id = ?1"),
                [id],
                row_to_quotation,
            )
            .optional()?;
        match quotation {
            Some(mut q) => {
                q.lines = load_lines(&conn, &q.id)?;
                Ok(Some(q))
            }
            None => Ok(None),
        }
    }

    pub fn list_quotations(&self, q: &ListQuery, page: Page) -> DbResult<(Vec<Quotation>, u64)> {
        let mut filters = Filters::new();
        filters.push_search(&q.search, &["code"]);
        if let Some(customer_id) = &q.customer_id {
            filters.push("customer_id = ?", customer_id.clone());
        }
        if let Some(status) = &q.status {
            filters.push("status = ?", status.clone());
        }

        let conn = self.lock();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM quotations{}", filters.where_sql()),
            filters.params().as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {COLUMNS} FROM quotations{} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            filters.where_sql(),
            page.limit,
            page.offset()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(filters.params().as_slice(), row_to_quotation)?;
        let mut quotations = rows.collect::<Result<Vec<_>, _>>()?;
        for quotation in &mut quotations {
            quotation.lines = load_lines(&conn, &quotation.id)?;
        }
        Ok((quotations, total as u64))
    }

    pub fn update_quotation(&self, id: &str, upd: QuotationUpdate) -> DbResult<Quotation> {
        let mut quotation = self
            .get_quotation(id)?
            .ok_or_else(|| DbError::NotFound("Không tìm thấy báo giá".into()))?;

        if let Some(status) = upd.status {
            if !STATUSES.contains(&status.as_str()) {
                return Err(DbError::Validation(
                    "Trạng thái báo giá không hợp lệ".into(),
                ));
            }
            quotation.status = status;
        }
        if let Some(notes) = upd.notes {
            quotation.notes = Some(notes);
        }
        quotation.updated_at = now_rfc3339();

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        if let Some(inputs) = &upd.lines {
            let lines = resolve_lines(&tx, quotation.package_id.as_deref(), inputs)?;
            quotation.total = write_lines(&tx, &quotation.id, &lines)?;
            quotation.lines = lines;
        }
        tx.execute(
            "UPDATE quotations SET status = ?2, notes = ?3, total = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                quotation.id,
                quotation.status,
                quotation.notes,
                quotation.total,
                quotation.updated_at,
            ],
        )?;
        tx.commit()?;
        Ok(quotation)
    }

    pub fn delete_quotation(&self, id: &str) -> DbResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM quotation_lines WHERE quotation_id = ?1", [id])?;
        let affected = tx.execute("DELETE FROM quotations WHERE id = ?1", [id])?;
        tx.commit()?;
        if affected == 0 {
            return Err(DbError::NotFound("Không tìm thấy báo giá".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::catalog::{ServiceCreate, ServiceGroupCreate};
    use common::model::customer::CustomerCreate;
    use common::model::pricing::{PriceEntry, PricePackageCreate};

    struct Fixture {
        db: Db,
        customer_id: String,
        service_id: String,
        package_id: String,
    }

    fn setup() -> Fixture {
        let db = Db::open_in_memory().unwrap();
        let customer = db
            .insert_customer(CustomerCreate {
                name: "Nguyễn Văn A".into(),
                phone: None,
                email: None,
                address: None,
                province: None,
                source: None,
                notes: None,
                latitude: None,
                longitude: None,
            })
            .unwrap();
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
        let package = db
            .insert_price_package(PricePackageCreate {
                name: "Bảng giá chuẩn".into(),
                description: None,
                prices: vec![PriceEntry {
                    service_id: service.id.clone(),
                    unit_price: 350_000.0,
                }],
            })
            .unwrap();
        Fixture {
            db,
            customer_id: customer.id,
            service_id: service.id,
            package_id: package.id,
        }
    }

    #[test]
    fn package_fills_missing_unit_prices() {
        let f = setup();
        let quotation = f
            .db
            .insert_quotation(QuotationCreate {
                customer_id: f.customer_id.clone(),
                opportunity_id: None,
                package_id: Some(f.package_id.clone()),
                notes: None,
                lines: vec![QuotationLineInput {
                    service_id: f.service_id.clone(),
                    quantity: 4.0,
                    unit_price: None,
                }],
            })
            .unwrap();

        assert_eq!(quotation.code, "QU-0001");
        assert_eq!(quotation.lines[0].unit_price, 350_000.0);
        assert_eq!(quotation.lines[0].service_name, "Massage");
        assert_eq!(quotation.total, 1_400_000.0);
    }

    #[test]
    fn missing_price_without_package_is_refused() {
        let f = setup();
        let err = f
            .db
            .insert_quotation(QuotationCreate {
                customer_id: f.customer_id.clone(),
                opportunity_id: None,
                package_id: None,
                notes: None,
                lines: vec![QuotationLineInput {
                    service_id: f.service_id.clone(),
                    quantity: 1.0,
                    unit_price: None,
                }],
            })
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[test]
    fn empty_lines_are_refused() {
        let f = setup();
        let err = f
            .db
            .insert_quotation(QuotationCreate {
                customer_id: f.customer_id.clone(),
                opportunity_id: None,
                package_id: None,
                notes: None,
                lines: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[test]
    fn replacing_lines_recomputes_total() {
        let f = setup();
        let quotation = f
            .db
            .insert_quotation(QuotationCreate {
                customer_id: f.customer_id.clone(),
                opportunity_id: None,
                package_id: Some(f.package_id.clone()),
                notes: None,
                lines: vec![QuotationLineInput {
                    service_id: f.service_id.clone(),
                    quantity: 1.0,
                    unit_price: None,
                }],
            })
            .unwrap();
        assert_eq!(quotation.total, 350_000.0);

        let updated = f
            .db
            .update_quotation(
                &quotation.id,
                QuotationUpdate {
                    status: Some("sent".into()),
                    notes: None,
                    lines: Some(vec![QuotationLineInput {
                        service_id: f.service_id.clone(),
                        quantity: 2.0,
                        unit_price: Some(300_000.0),
                    }]),
                },
            )
            .unwrap();
        assert_eq!(updated.status, "sent");
        assert_eq!(updated.total, 600_000.0);
    }

    #[test]
    fn catalog_rename_does_not_rewrite_line_snapshots() {
        let f = setup();
        let quotation = f
            .db
            .insert_quotation(QuotationCreate {
                customer_id: f.customer_id.clone(),
                opportunity_id: None,
                package_id: Some(f.package_id.clone()),
                notes: None,
                lines: vec![QuotationLineInput {
                    service_id: f.service_id.clone(),
                    quantity: 1.0,
                    unit_price: None,
                }],
            })
            .unwrap();

        f.db.update_service(
            &f.service_id,
            common::model::catalog::ServiceUpdate {
                name: Some("Massage cao cấp".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let fetched = f.db.get_quotation(&quotation.id).unwrap().unwrap();
        assert_eq!(fetched.lines[0].service_name, "Massage");
    }

    #[test]
    fn invalid_status_is_refused() {
        let f = setup();
        let quotation = f
            .db
            .insert_quotation(QuotationCreate {
                customer_id: f.customer_id.clone(),
                opportunity_id: None,
                package_id: Some(f.package_id.clone()),
                notes: None,
                lines: vec![QuotationLineInput {
                    service_id: f.service_id.clone(),
                    quantity: 1.0,
                    unit_price: None,
                }],
            })
            .unwrap();

        let err = f
            .db
            .update_quotation(
                &quotation.id,
                QuotationUpdate {
                    status: Some("won".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }
}
