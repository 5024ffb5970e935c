//! Login, logout and current-user endpoints. The JWT travels in an httpOnly
//! cookie; browsers never see the token from script.

use actix_web::cookie::Cookie;
use actix_web::web::{get, post, scope, Data, Json};
use actix_web::{HttpMessage, HttpRequest, HttpResponse, Scope};
use common::requests::LoginRequest;
use common::response::ApiResponse;

use crate::auth::{self, Claims};
use crate::config::Config;
use crate::db::Db;
use crate::error::ApiError;

const API_PATH: &str = "/api/auth";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/login", post().to(login))
        .route("/logout", post().to(logout))
        .route("/me", get().to(me))
}

async fn login(
    db: Data<Db>,
    config: Data<Config>,
    payload: Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = payload.into_inner();
    let account = db
        .find_user_by_username(req.username.trim())?
        .ok_or_else(|| ApiError::Unauthorized("Sai tên đăng nhập hoặc mật khẩu".into()))?;
    if !auth::verify_password(&account.password_hash, &req.password)? {
        return Err(ApiError::Unauthorized("Sai tên đăng nhập hoặc mật khẩu".into()));
    }

    let token = auth::issue_token(
        config.jwt_secret.as_bytes(),
        &account.user,
        config.token_ttl_hours,
    )?;
    let cookie = Cookie::build(auth::TOKEN_COOKIE, token)
        .path("/")
        .http_only(true)
        .finish();

    log::info!("user '{}' logged in", account.user.username);
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(ApiResponse::ok(account.user)))
}

async fn logout() -> HttpResponse {
    let mut cookie = Cookie::build(auth::TOKEN_COOKIE, "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();
    HttpResponse::Ok()
        .cookie(cookie)
        .json(ApiResponse::message("Đã đăng xuất"))
}

async fn me(db: Data<Db>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("Bạn chưa đăng nhập".into()))?;
    let user = db
        .get_user(&claims.sub)?
        .ok_or_else(|| ApiError::NotFound("Không tìm thấy người dùng".into()))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(user)))
}
