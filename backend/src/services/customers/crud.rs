use actix_web::web::{Data, Json, Path, Query};
use actix_web::HttpResponse;
use common::model::customer::{CustomerCreate, CustomerUpdate};
use common::requests::ListQuery;
use common::response::ApiResponse;

use crate::db::{Db, Page};
use crate::error::ApiError;

pub(super) async fn list(db: Data<Db>, query: Query<ListQuery>) -> Result<HttpResponse, ApiError> {
    let q = query.into_inner();
    let page = Page::from_query(&q);
    let (customers, total) = db.list_customers(&q, page)?;
    Ok(HttpResponse::Ok().json(ApiResponse::page(customers, page.pagination(total))))
}

pub(super) async fn create(
    db: Data<Db>,
    payload: Json<CustomerCreate>,
) -> Result<HttpResponse, ApiError> {
    let customer = db.insert_customer(payload.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(customer)))
}

pub(super) async fn get_one(db: Data<Db>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    let customer = db
        .get_customer(&id)?
        .ok_or_else(|| ApiError::NotFound("Không tìm thấy khách hàng".into()))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(customer)))
}

pub(super) async fn update(
    db: Data<Db>,
    id: Path<String>,
    payload: Json<CustomerUpdate>,
) -> Result<HttpResponse, ApiError> {
    let customer = db.update_customer(&id, payload.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(customer)))
}

pub(super) async fn remove(db: Data<Db>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    db.soft_delete_customer(&id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Đã xóa khách hàng")))
}
