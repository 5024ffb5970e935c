use actix_web::web::{delete, get, post, put, scope, Data, Json, Path, Query};
use actix_web::{HttpResponse, Scope};
use common::model::catalog::{ServiceGroupCreate, ServiceGroupUpdate};
use common::requests::ListQuery;
use common::response::ApiResponse;

use crate::db::{Db, Page};
use crate::error::ApiError;

const API_PATH: &str = "/api/service-groups";

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
    let (groups, total) = db.list_service_groups(&q, page)?;
    Ok(HttpResponse::Ok().json(ApiResponse::page(groups, page.pagination(total))))
}

async fn create(db: Data<Db>, payload: Json<ServiceGroupCreate>) -> Result<HttpResponse, ApiError> {
    let group = db.insert_service_group(payload.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(group)))
}

async fn get_one(db: Data<Db>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    let group = db
        .get_service_group(&id)?
        .ok_or_else(|| ApiError::NotFound("Không tìm thấy nhóm dịch vụ".into()))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(group)))
}

async fn update(
    db: Data<Db>,
    id: Path<String>,
    payload: Json<ServiceGroupUpdate>,
) -> Result<HttpResponse, ApiError> {
    let group = db.update_service_group(&id, payload.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(group)))
}

async fn remove(db: Data<Db>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    db.delete_service_group(&id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Đã xóa nhóm dịch vụ")))
}
