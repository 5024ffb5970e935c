use actix_web::web::{delete, get, post, put, scope, Data, Json, Path, Query};
use actix_web::{HttpResponse, Scope};
use common::model::org::{PositionCreate, PositionUpdate};
use common::requests::ListQuery;
use common::response::ApiResponse;

use crate::db::{Db, Page};
use crate::error::ApiError;

const API_PATH: &str = "/api/positions";

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
    let (positions, total) = db.list_positions(&q, page)?;
    Ok(HttpResponse::Ok().json(ApiResponse::page(positions, page.pagination(total))))
}

async fn create(db: Data<Db>, payload: Json<PositionCreate>) -> Result<HttpResponse, ApiError> {
    let position = db.insert_position(payload.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(position)))
}

async fn get_one(db: Data<Db>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    let position = db
        .get_position(&id)?
        .ok_or_else(|| ApiError::NotFound("Không tìm thấy chức vụ".into()))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(position)))
}

async fn update(
    db: Data<Db>,
    id: Path<String>,
    payload: Json<PositionUpdate>,
) -> Result<HttpResponse, ApiError> {
    let position = db.update_position(&id, payload.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(position)))
}

async fn remove(db: Data<Db>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    db.delete_position(&id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Đã xóa chức vụ")))
}
