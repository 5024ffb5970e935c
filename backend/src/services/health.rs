use actix_web::web::{get, scope};
use actix_web::{HttpResponse, Scope};
use common::response::ApiResponse;

const API_PATH: &str = "/api/health";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", get().to(process))
}

/// Unauthenticated liveness probe.
async fn process() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::message("ok"))
}
