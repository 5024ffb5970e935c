//! Google Maps short-link resolver. Follows the redirect and pulls the
//! coordinates out of the resolved URL, either from the `!3d<lat>!4d<lng>`
//! pin markers or the `@lat,lng` viewport segment.

use actix_web::web::Json;
use actix_web::HttpResponse;
use common::requests::ResolveMapRequest;
use common::response::ApiResponse;
use regex::Regex;
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Serialize, PartialEq)]
pub(super) struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

pub(super) async fn process(payload: Json<ResolveMapRequest>) -> Result<HttpResponse, ApiError> {
    let url = payload.into_inner().url;
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ApiError::Validation("Liên kết bản đồ không hợp lệ".into()));
    }

    // Short links answer with a redirect to the full maps URL; reqwest
    // follows it and `response.url()` is the final location.
    let response = reqwest::get(&url)
        .await
        .map_err(|e| {
            log::warn!("map link fetch failed: {e}");
            ApiError::Validation("Không thể truy cập liên kết bản đồ".into())
        })?;
    let resolved = response.url().to_string();

    let coords = extract_coordinates(&resolved)
        .ok_or_else(|| ApiError::Validation("Không tìm thấy tọa độ trong liên kết".into()))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(coords)))
}

fn extract_coordinates(url: &str) -> Option<Coordinates> {
    let pin = Regex::new(r"!3d(-?\d+(?:\.\d+)?)!4d(-?\d+(?:\.\d+)?)").ok()?;
    if let Some(captures) = pin.captures(url) {
        return Some(Coordinates {
            latitude: captures[1].parse().ok()?,
            longitude: captures[2].parse().ok()?,
        });
    }

    let viewport = Regex::new(r"@(-?\d+(?:\.\d+)?),(-?\d+(?:\.\d+)?)").ok()?;
    let captures = viewport.captures(url)?;
    Some(Coordinates {
        latitude: captures[1].parse().ok()?,
        longitude: captures[2].parse().ok()?,
    })
}
