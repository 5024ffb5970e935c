//! HTTP-level tests: routing table, auth gate, response envelope and the
//! cross-resource rules a client observes.

use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::{test, web, App};
use serde_json::{json, Value};

use backend::auth::{self, middleware::RequireAuth};
use backend::config::Config;
use backend::db::Db;
use backend::job_controller::state::{start_job_updater, ImportJobs};
use backend::services;
use common::model::user::User;

struct TestCtx {
    db: Db,
    config: Config,
    admin: User,
}

fn setup_ctx() -> TestCtx {
    let db = Db::open_in_memory().unwrap();
    let config = Config::for_tests("test-secret");
    let hash = auth::hash_password("mat-khau").unwrap();
    let admin = db
        .create_user("admin", "Quản trị viên", "admin", &hash)
        .unwrap();
    TestCtx { db, config, admin }
}

fn token_cookie(ctx: &TestCtx) -> Cookie<'static> {
    let token = auth::issue_token(ctx.config.jwt_secret.as_bytes(), &ctx.admin, 1).unwrap();
    Cookie::new(auth::TOKEN_COOKIE, token)
}

macro_rules! init_app {
    ($ctx:expr) => {{
        let (jobs, rx) = ImportJobs::new();
        actix_web::rt::spawn(start_job_updater(jobs.clone(), rx));
        test::init_service(
            App::new()
                .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024))
                .app_data(web::Data::new($ctx.db.clone()))
                .app_data(web::Data::new($ctx.config.clone()))
                .app_data(web::Data::new(jobs))
                .wrap(RequireAuth::new($ctx.config.jwt_secret.as_bytes().to_vec()))
                .configure(services::register),
        )
        .await
    }};
}

#[actix_web::test]
async fn health_is_public() {
    let ctx = setup_ctx();
    let app = init_app!(&ctx);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(true));
}

#[actix_web::test]
async fn protected_routes_require_token_cookie() {
    let ctx = setup_ctx();
    let app = init_app!(&ctx);

    let req = test::TestRequest::get().uri("/api/customers").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));

    // A garbage token is rejected the same way.
    let req = test::TestRequest::get()
        .uri("/api/customers")
        .cookie(Cookie::new(auth::TOKEN_COOKIE, "khong-phai-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn login_sets_cookie_and_me_returns_user() {
    let ctx = setup_ctx();
    let app = init_app!(&ctx);

    // Wrong password: the allow-listed login route answers itself with 401.
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"username": "admin", "password": "sai"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"username": "admin", "password": "mat-khau"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .expect("login must set the token cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("HttpOnly"));

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .cookie(token_cookie(&ctx))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["username"], json!("admin"));
}

#[actix_web::test]
async fn service_group_codes_increment_over_http() {
    let ctx = setup_ctx();
    let app = init_app!(&ctx);

    for expected in ["SG-0001", "SG-0002"] {
        let req = test::TestRequest::post()
            .uri("/api/service-groups")
            .cookie(token_cookie(&ctx))
            .set_json(json!({"name": format!("Nhóm {expected}")}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["code"], json!(expected));
    }
}

#[actix_web::test]
async fn care_group_delete_is_guarded_by_children() {
    let ctx = setup_ctx();
    let app = init_app!(&ctx);
    let cookie = token_cookie(&ctx);

    let req = test::TestRequest::post()
        .uri("/api/care-groups")
        .cookie(cookie.clone())
        .set_json(json!({"name": "Gọi điện"}))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let group_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/care-results")
        .cookie(cookie.clone())
        .set_json(json!({"group_id": group_id, "name": "Không nghe máy"}))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let item_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/care-groups/{group_id}"))
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/care-results/{item_id}"))
        .cookie(cookie.clone())
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::delete()
        .uri(&format!("/api/care-groups/{group_id}"))
        .cookie(cookie)
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());
}

#[actix_web::test]
async fn renaming_care_group_propagates_to_results() {
    let ctx = setup_ctx();
    let app = init_app!(&ctx);
    let cookie = token_cookie(&ctx);

    let req = test::TestRequest::post()
        .uri("/api/care-groups")
        .cookie(cookie.clone())
        .set_json(json!({"name": "Gọi điện"}))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let group_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/care-results")
        .cookie(cookie.clone())
        .set_json(json!({"group_id": group_id, "name": "Hẹn gọi lại"}))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let item_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/care-groups/{group_id}"))
        .cookie(cookie.clone())
        .set_json(json!({"name": "Tổng đài"}))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::get()
        .uri(&format!("/api/care-results/{item_id}"))
        .cookie(cookie)
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["group_name"], json!("Tổng đài"));
}

#[actix_web::test]
async fn customer_soft_delete_hides_from_list() {
    let ctx = setup_ctx();
    let app = init_app!(&ctx);
    let cookie = token_cookie(&ctx);

    let req = test::TestRequest::post()
        .uri("/api/customers")
        .cookie(cookie.clone())
        .set_json(json!({"name": "Nguyễn Văn A", "phone": "0901234567"}))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["code"], json!("KH-0001"));
    let customer_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/customers/{customer_id}"))
        .cookie(cookie.clone())
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::get()
        .uri("/api/customers")
        .cookie(cookie.clone())
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["pagination"]["total"], json!(0));
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let req = test::TestRequest::get()
        .uri(&format!("/api/customers/{customer_id}"))
        .cookie(cookie)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn import_template_and_export_are_xlsx() {
    let ctx = setup_ctx();
    let app = init_app!(&ctx);
    let cookie = token_cookie(&ctx);

    for uri in ["/api/customers/import-template", "/api/customers/export"] {
        let req = test::TestRequest::get()
            .uri(uri)
            .cookie(cookie.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success(), "{uri} failed");
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.contains("spreadsheetml"), "{uri}: {content_type}");
        let body = test::read_body(resp).await;
        assert_eq!(&body[..2], b"PK", "{uri} is not a zip container");
    }
}

#[actix_web::test]
async fn quotation_export_round_trip() {
    let ctx = setup_ctx();
    let app = init_app!(&ctx);
    let cookie = token_cookie(&ctx);

    let req = test::TestRequest::post()
        .uri("/api/customers")
        .cookie(cookie.clone())
        .set_json(json!({"name": "Nguyễn Văn A"}))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let customer_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/service-groups")
        .cookie(cookie.clone())
        .set_json(json!({"name": "Trị liệu"}))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let group_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/services")
        .cookie(cookie.clone())
        .set_json(json!({"name": "Massage", "group_id": group_id, "unit": "buổi"}))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let service_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/quotations")
        .cookie(cookie.clone())
        .set_json(json!({
            "customer_id": customer_id,
            "lines": [
                {"service_id": service_id, "quantity": 2.0, "unit_price": 350000.0}
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["code"], json!("QU-0001"));
    assert_eq!(body["data"]["total"], json!(700000.0));
    let quotation_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/quotations/{quotation_id}/export"))
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body = test::read_body(resp).await;
    assert_eq!(&body[..2], b"PK");
}

#[actix_web::test]
async fn unknown_references_answer_400() {
    let ctx = setup_ctx();
    let app = init_app!(&ctx);
    let cookie = token_cookie(&ctx);

    let req = test::TestRequest::post()
        .uri("/api/services")
        .cookie(cookie.clone())
        .set_json(json!({"name": "Massage", "group_id": "khong-ton-tai"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::post()
        .uri("/api/opportunities")
        .cookie(cookie)
        .set_json(json!({"customer_id": "khong-ton-tai", "title": "X"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
}
