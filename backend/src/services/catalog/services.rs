use actix_web::web::{delete, get, post, put, scope, Data, Json, Path, Query};
use actix_web::{HttpResponse, Scope};
use common::model::catalog::{ServiceCreate, ServiceUpdate};
use common::requests::ListQuery;
use common::response::ApiResponse;

use crate::db::{Db, Page};
use crate::error::ApiError;

const API_PATH: &str = "/api/services";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list))
        .route("", post().to(create))
        .route("/{id}", get().to(get_one))
        .route("/{id}", put().to(update))
        .route("/{id}", delete().to(remove))
}

async fn list(db: Data<Db>, query: Query<ListQuery>) -> Result<HttpResponse, ApiError> {
    let q = query.into_inner();
    let page = Page::from_query(&q);
    let (services, total) = db.list_services(&q, page)?;
    Ok(HttpResponse::Ok().json(ApiResponse::page(services, page.pagination(total))))
}

async fn create(db: Data<Db>, payload: Json<ServiceCreate>) -> Result<HttpResponse, ApiError> {
    let service = db.insert_service(payload.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(service)))
}

async fn get_one(db: Data<Db>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    let service = db
        .get_service(&id)?
        .ok_or_else(|| ApiError::NotFound("Không tìm thấy dịch vụ".into()))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(service)))
}

async fn update(
    db: Data<Db>,
    id: Path<String>,
    payload: Json<ServiceUpdate>,
) -> Result<HttpResponse, ApiError> {
    let service = db.update_service(&id, payload.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(service)))
}

async fn remove(db: Data<Db>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    db.delete_service(&id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Đã xóa dịch vụ")))
}
