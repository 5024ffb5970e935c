use actix_web::http::header::ContentDisposition;
use actix_web::web::{delete, get, post, put, scope, Data, Json, Path, Query};
use actix_web::{HttpResponse, Scope};
use common::model::quotation::{QuotationCreate, QuotationUpdate};
use common::requests::ListQuery;
use common::response::ApiResponse;

use crate::db::{Db, Page};
use crate::error::ApiError;
use crate::excel::{self, quotation::build_quotation_export};

const API_PATH: &str = "/api/quotations";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list))
        .route("", post().to(create))
        .route("/{id}/export", get().to(export))
        .route("/{id}", get().to(get_one))
        .route("/{id}", put().to(update))
        .route("/{id}", delete().to(remove))
}

async fn list(db: Data<Db>, query: Query<ListQuery>) -> Result<HttpResponse, ApiError> {
    let q = query.into_inner();
    let page = Page::from_query(&q);
    let (quotations, total) = db.list_quotations(&q, page)?;
    Ok(HttpResponse::Ok().json(ApiResponse::page(quotations, page.pagination(total))))
}

async fn create(db: Data<Db>, payload: Json<QuotationCreate>) -> Result<HttpResponse, ApiError> {
    let quotation = db.insert_quotation(payload.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(quotation)))
}

async fn get_one(db: Data<Db>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    let quotation = db
        .get_quotation(&id)?
        .ok_or_else(|| ApiError::NotFound("Không tìm thấy báo giá".into()))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(quotation)))
}

async fn update(
    db: Data<Db>,
    id: Path<String>,
    payload: Json<QuotationUpdate>,
) -> Result<HttpResponse, ApiError> {
    let quotation = db.update_quotation(&id, payload.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(quotation)))
}

async fn remove(db: Data<Db>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    db.delete_quotation(&id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Đã xóa báo giá")))
}

/// Serve the quotation as an `.xlsx` workbook.
async fn export(db: Data<Db>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    let quotation = db
        .get_quotation(&id)?
        .ok_or_else(|| ApiError::NotFound("Không tìm thấy báo giá".into()))?;
    // A soft-deleted customer is invisible to the lookup, so the export 404s.
    let customer = db
        .get_customer(&quotation.customer_id)?
        .ok_or_else(|| ApiError::NotFound("Không tìm thấy khách hàng của báo giá".into()))?;

    let bytes = build_quotation_export(&quotation, &customer)?;
    Ok(HttpResponse::Ok()
        .content_type(excel::XLSX_CONTENT_TYPE)
        .insert_header(ContentDisposition::attachment(format!(
            "{}.xlsx",
            quotation.code
        )))
        .body(bytes))
}
