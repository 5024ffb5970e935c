//! Care and reject taxonomy endpoints. The four scopes share two handler
//! sets parameterized by table pair, mirroring the shared store underneath.

mod groups;
mod items;

use actix_web::web::{delete, get, post, put, scope, Data, Json, Path, Query};
use actix_web::Scope;
use common::model::taxonomy::{
    TaxonomyGroupCreate, TaxonomyGroupUpdate, TaxonomyItemCreate, TaxonomyItemUpdate,
};
use common::requests::ListQuery;

use crate::db::{Db, TaxonomyTables, CARE, REJECT};

pub fn care_group_routes() -> Scope {
    group_scope("/api/care-groups", CARE)
}

pub fn care_result_routes() -> Scope {
    item_scope("/api/care-results", CARE)
}

pub fn reject_group_routes() -> Scope {
    group_scope("/api/reject-groups", REJECT)
}

pub fn reject_reason_routes() -> Scope {
    item_scope("/api/reject-reasons", REJECT)
}

fn group_scope(path: &str, t: TaxonomyTables) -> Scope {
    scope(path)
        .route(
            "",
            get().to(move |db: Data<Db>, q: Query<ListQuery>| groups::list(db, q, t)),
        )
        .route(
            "",
            post().to(move |db: Data<Db>, body: Json<TaxonomyGroupCreate>| {
                groups::create(db, body, t)
            }),
        )
        .route(
            "/{id}",
            get().to(move |db: Data<Db>, id: Path<String>| groups::get_one(db, id, t)),
        )
        .route(
            "/{id}",
            put().to(
                move |db: Data<Db>, id: Path<String>, body: Json<TaxonomyGroupUpdate>| {
                    groups::update(db, id, body, t)
                },
            ),
        )
        .route(
            "/{id}",
            delete().to(move |db: Data<Db>, id: Path<String>| groups::remove(db, id, t)),
        )
}

fn item_scope(path: &str, t: TaxonomyTables) -> Scope {
    scope(path)
        .route(
            "",
            get().to(move |db: Data<Db>, q: Query<ListQuery>| items::list(db, q, t)),
        )
        .route(
            "",
            post().to(move |db: Data<Db>, body: Json<TaxonomyItemCreate>| {
                items::create(db, body, t)
            }),
        )
        .route(
            "/{id}",
            get().to(move |db: Data<Db>, id: Path<String>| items::get_one(db, id, t)),
        )
        .route(
            "/{id}",
            put().to(
                move |db: Data<Db>, id: Path<String>, body: Json<TaxonomyItemUpdate>| {
                    items::update(db, id, body, t)
                },
            ),
        )
        .route(
            "/{id}",
            delete().to(move |db: Data<Db>, id: Path<String>| items::remove(db, id, t)),
        )
}
