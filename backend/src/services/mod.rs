//! HTTP service scopes, one module per resource area. Each module exposes a
//! `configure_routes()` returning the Actix `Scope` for its `/api/...` path.

pub mod auth;
pub mod catalog;
pub mod customers;
pub mod health;
pub mod org;
pub mod sales;
pub mod taxonomy;

use actix_web::web::ServiceConfig;

/// Register every API scope. Shared between `main` and the integration tests
/// so both serve the identical routing table.
pub fn register(cfg: &mut ServiceConfig) {
    cfg.service(health::configure_routes())
        .service(auth::configure_routes())
        .service(catalog::groups::configure_routes())
        .service(catalog::services::configure_routes())
        .service(catalog::packages::configure_routes())
        .service(taxonomy::care_group_routes())
        .service(taxonomy::care_result_routes())
        .service(taxonomy::reject_group_routes())
        .service(taxonomy::reject_reason_routes())
        .service(org::departments::configure_routes())
        .service(org::positions::configure_routes())
        .service(customers::configure_routes())
        .service(sales::opportunities::configure_routes())
        .service(sales::quotations::configure_routes());
}
