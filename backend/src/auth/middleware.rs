//! Request gate: every path outside [`super::PUBLIC_PATHS`] must carry a
//! valid `token` cookie. Verified claims are stored in request extensions for
//! handlers that need the caller's identity.

use std::rc::Rc;

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage};
use futures_util::future::{ok, LocalBoxFuture, Ready};

use crate::error::ApiError;

use super::{verify_token, PUBLIC_PATHS, TOKEN_COOKIE};

pub struct RequireAuth {
    secret: Rc<Vec<u8>>,
}

impl RequireAuth {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Rc::new(secret.into()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequireAuthService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequireAuthService {
            service: Rc::new(service),
            secret: Rc::clone(&self.secret),
        })
    }
}

pub struct RequireAuthService<S> {
    service: Rc<S>,
    secret: Rc<Vec<u8>>,
}

impl<S, B> Service<ServiceRequest> for RequireAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let secret = Rc::clone(&self.secret);
        let svc = Rc::clone(&self.service);

        Box::pin(async move {
            let public = PUBLIC_PATHS.iter().any(|p| req.path().starts_with(p));
            if !public {
                let token = req
                    .cookie(TOKEN_COOKIE)
                    .map(|c| c.value().to_string())
                    .ok_or_else(|| {
                        Error::from(ApiError::Unauthorized("Bạn chưa đăng nhập".into()))
                    })?;
                let claims = verify_token(&secret, &token)?;
                req.extensions_mut().insert(claims);
            }
            svc.call(req).await
        })
    }
}
