use actix_web::web::{delete, get, post, put, scope, Data, Json, Path, Query};
use actix_web::{HttpResponse, Scope};
use common::model::pricing::{PricePackageCreate, PricePackageUpdate};
use common::requests::ListQuery;
use common::response::ApiResponse;

use crate::db::{Db, Page};
use crate::error::ApiError;

const API_PATH: &str = "/api/price-packages";

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
    let (packages, total) = db.list_price_packages(&q, page)?;
    Ok(HttpResponse::Ok().json(ApiResponse::page(packages, page.pagination(total))))
}

async fn create(db: Data<Db>, payload: Json<PricePackageCreate>) -> Result<HttpResponse, ApiError> {
    let package = db.insert_price_package(payload.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(package)))
}

async fn get_one(db: Data<Db>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    let package = db
        .get_price_package(&id)?
        .ok_or_else(|| ApiError::NotFound("Không tìm thấy bảng giá".into()))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(package)))
}

async fn update(
    db: Data<Db>,
    id: Path<String>,
    payload: Json<PricePackageUpdate>,
) -> Result<HttpResponse, ApiError> {
    let package = db.update_price_package(&id, payload.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(package)))
}

async fn remove(db: Data<Db>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    db.delete_price_package(&id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Đã xóa bảng giá")))
}
