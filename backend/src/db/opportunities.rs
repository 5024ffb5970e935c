//! Sales opportunity operations.

use common::model::opportunity::{Opportunity, OpportunityCreate, OpportunityUpdate};
use common::requests::ListQuery;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{codegen, now_rfc3339, Db, DbError, DbResult, Filters, Page, CARE, REJECT};

const COLUMNS: &str = "id, code, customer_id, title, stage, value, assignee_id, \
                       care_result_id, reject_reason_id, notes, is_active, created_at, updated_at";

fn row_to_opportunity(row: &Row) -> rusqlite::Result<Opportunity> {
    Ok(Opportunity {
        id: row.get(0)?,
        code: row.get(1)?,
        customer_id: row.get(2)?,
        title: row.get(3)?,
        stage: row.get(4)?,
        value: row.get(5)?,
        assignee_id: row.get(6)?,
        care_result_id: row.get(7)?,
        reject_reason_id: row.get(8)?,
        notes: row.get(9)?,
        is_active: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl Db {
    pub fn insert_opportunity(&self, req: OpportunityCreate) -> DbResult<Opportunity> {
        let title = req.title.trim();
        if title.is_empty() {
            return Err(DbError::Validation(
                "Tiêu đề cơ hội không được để trống".into(),
            ));
        }
        if self.get_customer(&req.customer_id)?.is_none() {
            return Err(DbError::Validation("Khách hàng không tồn tại".into()));
        }

        let conn = self.lock();
        let code = codegen::next_sequential_code(&conn, "CH")?;
        let now = now_rfc3339();
        let opportunity = Opportunity {
            id: Uuid::new_v4().to_string(),
            code,
            customer_id: req.customer_id,
            title: title.to_string(),
            stage: req.stage.unwrap_or_else(|| "moi".into()),
            value: req.value,
            assignee_id: req.assignee_id,
            care_result_id: None,
            reject_reason_id: None,
            notes: req.notes,
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        };
        conn.execute(
            "INSERT INTO opportunities (id, code, customer_id, title, stage, value, assignee_id, care_result_id, reject_reason_id, notes, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                opportunity.id,
                opportunity.code,
                opportunity.customer_id,
                opportunity.title,
                opportunity.stage,
                opportunity.value,
                opportunity.assignee_id,
                opportunity.care_result_id,
                opportunity.reject_reason_id,
                opportunity.notes,
                opportunity.is_active,
                opportunity.created_at,
                opportunity.updated_at,
            ],
        )?;
        Ok(opportunity)
    }

    pub fn get_opportunity(&self, id: &str) -> DbResult<Option<Opportunity>> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM opportunities WHERE id = ?1"),
            [id],
            row_to_opportunity,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_opportunities(&self, q: &ListQuery, page: Page) -> DbResult<(Vec<Opportunity>, u64)> {
        let mut filters = Filters::new();
        filters.push_search(&q.search, &["title", "code"]);
        filters.push_active(q.active);
        if let Some(customer_id) = &q.customer_id {
            filters.push("customer_id = ?", customer_id.clone());
        }
        if let Some(stage) = &q.stage {
            filters.push("stage = ?", stage.clone());
        }

        let conn = self.lock();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM opportunities{}", filters.where_sql()),
            filters.params().as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {COLUMNS} FROM opportunities{} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            filters.where_sql(),
            page.limit,
            page.offset()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(filters.params().as_slice(), row_to_opportunity)?;
        let opportunities = rows.collect::<Result<Vec<_>, _>>()?;
        Ok((opportunities, total as u64))
    }

    pub fn update_opportunity(&self, id: &str, upd: OpportunityUpdate) -> DbResult<Opportunity> {
        let mut opportunity = self
            .get_opportunity(id)?
            .ok_or_else(|| DbError::NotFound("Không tìm thấy cơ hội".into()))?;

        if let Some(title) = upd.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(DbError::Validation(
                    "Tiêu đề cơ hội không được để trống".into(),
                ));
            }
            opportunity.title = title;
        }
        if let Some(stage) = upd.stage {
            opportunity.stage = stage;
        }
        if let Some(value) = upd.value {
            opportunity.value = Some(value);
        }
        if let Some(assignee_id) = upd.assignee_id {
            opportunity.assignee_id = Some(assignee_id);
        }
        if let Some(care_result_id) = upd.care_result_id {
            if self.get_taxonomy_item(CARE, &care_result_id)?.is_none() {
                return Err(DbError::Validation("Kết quả chăm sóc không tồn tại".into()));
            }
            opportunity.care_result_id = Some(care_result_id);
        }
        if let Some(reject_reason_id) = upd.reject_reason_id {
            if self.get_taxonomy_item(REJECT, &reject_reason_id)?.is_none() {
                return Err(DbError::Validation("Lý do từ chối không tồn tại".into()));
            }
            opportunity.reject_reason_id = Some(reject_reason_id);
        }
        if let Some(notes) = upd.notes {
            opportunity.notes = Some(notes);
        }
        if let Some(active) = upd.is_active {
            opportunity.is_active = active;
        }
        opportunity.updated_at = now_rfc3339();

        let conn = self.lock();
        conn.execute(
            "UPDATE opportunities
             SET title = ?2, stage = ?3, value = ?4, assignee_id = ?5, care_result_id = ?6,
                 reject_reason_id = ?7, notes = ?8, is_active = ?9, updated_at = ?10
             WHERE id = ?1",
            params![
                opportunity.id,
                opportunity.title,
                opportunity.stage,
                opportunity.value,
                opportunity.assignee_id,
                opportunity.care_result_id,
                opportunity.reject_reason_id,
                opportunity.notes,
                opportunity.is_active,
                opportunity.updated_at,
            ],
        )?;
        Ok(opportunity)
    }

    pub fn delete_opportunity(&self, id: &str) -> DbResult<()> {
        let conn = self.lock();
        let affected = conn.execute("DELETE FROM opportunities WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(DbError::NotFound("Không tìm thấy cơ hội".into()));
        }
        Ok(())
    }
}
