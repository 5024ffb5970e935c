//! Customer endpoints: CRUD, Excel template/export, CSV import with
//! background processing, and the map-link resolver.
//!
//! Registered routes under `/api/customers`:
//!
//! * `GET    ""` / `POST ""` / `GET|PUT|DELETE "/{id}"` - standard CRUD;
//!   DELETE is a soft delete.
//! * `GET    "/import-template"` - blank `.xlsx` entry workbook with dropdown
//!   validation for province and source.
//! * `POST   "/import"` - multipart CSV upload; answers with a job id.
//! * `GET    "/import/status/{job_id}"` - poll the background import job.
//! * `GET    "/export"` - `.xlsx` of all live customers.
//! * `POST   "/resolve-map"` - extract coordinates from a Google Maps link.

mod crud;
mod export;
mod import;
mod maps;

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/customers";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(crud::list))
        .route("", post().to(crud::create))
        .route("/import-template", get().to(import::template))
        .route("/import", post().to(import::upload))
        .route("/import/status/{job_id}", get().to(import::status))
        .route("/export", get().to(export::process))
        .route("/resolve-map", post().to(maps::process))
        .route("/{id}", get().to(crud::get_one))
        .route("/{id}", put().to(crud::update))
        .route("/{id}", delete().to(crud::remove))
}
