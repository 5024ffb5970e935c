use actix_web::web::{delete, get, post, put, scope, Data, Json, Path, Query};
use actix_web::{HttpResponse, Scope};
use common::model::opportunity::{OpportunityCreate, OpportunityUpdate};
use common::requests::ListQuery;
use common::response::ApiResponse;

use crate::db::{Db, Page};
use crate::error::ApiError;

const API_PATH: &str = "/api/opportunities";

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
    let (opportunities, total) = db.list_opportunities(&q, page)?;
    Ok(HttpResponse::Ok().json(ApiResponse::page(opportunities, page.pagination(total))))
}

async fn create(db: Data<Db>, payload: Json<OpportunityCreate>) -> Result<HttpResponse, ApiError> {
    let opportunity = db.insert_opportunity(payload.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(opportunity)))
}

async fn get_one(db: Data<Db>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    let opportunity = db
        .get_opportunity(&id)?
        .ok_or_else(|| ApiError::NotFound("Không tìm thấy cơ hội".into()))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(opportunity)))
}

async fn update(
    db: Data<Db>,
    id: Path<String>,
    payload: Json<OpportunityUpdate>,
) -> Result<HttpResponse, ApiError> {
    let opportunity = db.update_opportunity(&id, payload.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(opportunity)))
}

async fn remove(db: Data<Db>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    db.delete_opportunity(&id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Đã xóa cơ hội")))
}
