use actix_web::web::{Data, Json, Path, Query};
use actix_web::HttpResponse;
use common::model::taxonomy::{TaxonomyGroupCreate, TaxonomyGroupUpdate};
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
    let (groups, total) = db.list_taxonomy_groups(t, &q, page)?;
    Ok(HttpResponse::Ok().json(ApiResponse::page(groups, page.pagination(total))))
}

pub(super) async fn create(
    db: Data<Db>,
    payload: Json<TaxonomyGroupCreate>,
    t: TaxonomyTables,
) -> Result<HttpResponse, ApiError> {
    let group = db.insert_taxonomy_group(t, payload.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(group)))
}

pub(super) async fn get_one(
    db: Data<Db>,
    id: Path<String>,
    t: TaxonomyTables,
) -> Result<HttpResponse, ApiError> {
    let group = db
        .get_taxonomy_group(t, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Không tìm thấy {}", t.group_label)))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(group)))
}

pub(super) async fn update(
    db: Data<Db>,
    id: Path<String>,
    payload: Json<TaxonomyGroupUpdate>,
    t: TaxonomyTables,
) -> Result<HttpResponse, ApiError> {
    let group = db.update_taxonomy_group(t, &id, payload.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(group)))
}

pub(super) async fn remove(
    db: Data<Db>,
    id: Path<String>,
    t: TaxonomyTables,
) -> Result<HttpResponse, ApiError> {
    db.delete_taxonomy_group(t, &id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::message(format!(
        "Đã xóa {}",
        t.group_label
    ))))
}
