use actix_web::http::header::ContentDisposition;
use actix_web::web::Data;
use actix_web::HttpResponse;

use crate::db::Db;
use crate::error::ApiError;
use crate::excel::{self, customers::build_customer_export};

/// `GET /api/customers/export` - every live customer as an `.xlsx` workbook.
pub(super) async fn process(db: Data<Db>) -> Result<HttpResponse, ApiError> {
    let customers = db.export_customers()?;
    let bytes = build_customer_export(&customers)?;
    Ok(HttpResponse::Ok()
        .content_type(excel::XLSX_CONTENT_TYPE)
        .insert_header(ContentDisposition::attachment("danh-sach-khach-hang.xlsx"))
        .body(bytes))
}
