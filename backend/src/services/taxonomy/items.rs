use actix_web::web::{Data, Json, Path, Query};
use actix_web::HttpResponse;
use common::model::taxonomy::{TaxonomyItemCreate, TaxonomyItemUpdate};
use common::requests::ListQuery;
use common::response::ApiResponse;

use crate::db::{Db, Page, TaxonomyTables};
use crate::error::ApiError;

pub(super) async fn list(
    db: Data<Db>,
    query: Query<ListQuery>,
    t: TaxonomyTables,
) -> Result<HttpResponse, ApiError> {
    let q = query.into_inner();
    let page = Page::from_query(&q);
    let (items, total) = db.list_taxonomy_items(t, &q, page)?;
    Ok(HttpResponse::Ok().json(ApiResponse::page(items, page.pagination(total))))
}

pub(super) async fn create(
    db: Data<Db>,
    payload: Json<TaxonomyItemCreate>,
    t: TaxonomyTables,
) -> Result<HttpResponse, ApiError> {
    let item = db.insert_taxonomy_item(t, payload.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(item)))
}

pub(super) async fn get_one(
    db: Data<Db>,
    id: Path<String>,
    t: TaxonomyTables,
) -> Result<HttpResponse, ApiError> {
    let item = db
        .get_taxonomy_item(t, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Không tìm thấy {}", t.item_label)))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(item)))
}

pub(super) async fn update(
    db: Data<Db>,
    id: Path<String>,
    payload: Json<TaxonomyItemUpdate>,
    t: TaxonomyTables,
) -> Result<HttpResponse, ApiError> {
    let item = db.update_taxonomy_item(t, &id, payload.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(item)))
}

pub(super) async fn remove(
    db: Data<Db>,
    id: Path<String>,
    t: TaxonomyTables,
) -> Result<HttpResponse, ApiError> {
    db.delete_taxonomy_item(t, &id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::message(format!(
        "Đã xóa {}",
        t.item_label
    ))))
}
