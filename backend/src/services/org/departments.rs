use actix_web::web::{delete, get, post, put, scope, Data, Json, Path, Query};
use actix_web::{HttpResponse, Scope};
use common::model::org::{DepartmentCreate, DepartmentUpdate};
use common::requests::ListQuery;
use common::response::ApiResponse;

use crate::db::{Db, Page};
use crate::error::ApiError;

const API_PATH: &str = "/api/departments";

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
    let (departments, total) = db.list_departments(&q, page)?;
    Ok(HttpResponse::Ok().json(ApiResponse::page(departments, page.pagination(total))))
}

async fn create(db: Data<Db>, payload: Json<DepartmentCreate>) -> Result<HttpResponse, ApiError> {
    let department = db.insert_department(payload.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(department)))
}

async fn get_one(db: Data<Db>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    let department = db
        .get_department(&id)?
        .ok_or_else(|| ApiError::NotFound("Không tìm thấy phòng ban".into()))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(department)))
}

async fn update(
    db: Data<Db>,
    id: Path<String>,
    payload: Json<DepartmentUpdate>,
) -> Result<HttpResponse, ApiError> {
    let department = db.update_department(&id, payload.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(department)))
}

async fn remove(db: Data<Db>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    db.delete_department(&id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Đã xóa phòng ban")))
}
