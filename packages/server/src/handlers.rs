//! HTTP handler functions for the fire map API.

use actix_web::{HttpResponse, web};
use fire_map_dashboard::binder;
use fire_map_database::StoreError;
use fire_map_database_models::{CalendarBounds, DateRange};
use fire_map_server_models::{
    ApiBounds, ApiCounts, ApiError, ApiHealth, RangeQueryParams, RangeUpdate,
};
use geojson::Feature;

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/boroughs`
///
/// Returns the encoded borough boundaries computed at startup.
pub async fn boroughs(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/x-msgpack")
        .body(state.encoded_boundaries.clone())
}

/// `GET /api/boroughs.geojson`
pub async fn boroughs_geojson(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.boundaries.feature_collection())
}

/// `GET /api/counts`
///
/// Per-borough fire point counts for `start..=end`.
pub async fn counts(
    state: web::Data<AppState>,
    params: web::Query<RangeQueryParams>,
) -> HttpResponse {
    let range = match parse_range(&params, &state.calendar) {
        Ok(range) => range,
        Err(response) => return response,
    };

    match state.store.counts_by_borough(&range).await {
        Ok(rows) => HttpResponse::Ok().json(ApiCounts {
            range,
            rows: binder::bind_counts(&rows),
        }),
        Err(e) => store_error_response("Failed to query fire point counts", &e),
    }
}

/// `GET /api/points`
///
/// Fire points for `start..=end` as a `GeoJSON` `FeatureCollection`.
pub async fn points(
    state: web::Data<AppState>,
    params: web::Query<RangeQueryParams>,
) -> HttpResponse {
    let range = match parse_range(&params, &state.calendar) {
        Ok(range) => range,
        Err(response) => return response,
    };

    match state.store.points_in_range(&range).await {
        Ok(rows) => HttpResponse::Ok().json(binder::bind_points(&rows)),
        Err(e) => store_error_response("Failed to query fire points", &e),
    }
}

/// `GET /api/view`
pub async fn view(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.dashboard.view())
}

/// `POST /api/range`
///
/// Applies a date picker change and returns the resulting view.
pub async fn range(state: web::Data<AppState>, body: web::Json<RangeUpdate>) -> HttpResponse {
    HttpResponse::Ok().json(state.dashboard.update(&body).await)
}

/// `POST /api/interact/click`
pub async fn click(body: web::Json<Option<Feature>>) -> HttpResponse {
    HttpResponse::Ok().json(binder::on_feature_click(body.0.as_ref()))
}

/// `POST /api/interact/hover`
pub async fn hover(state: web::Data<AppState>, body: web::Json<Option<Feature>>) -> HttpResponse {
    HttpResponse::Ok().json(binder::on_borough_hover(
        body.0.as_ref(),
        state.boundaries.name_property(),
    ))
}

/// `POST /api/interact/bounds`
pub async fn bounds(body: web::Json<Option<Feature>>) -> HttpResponse {
    HttpResponse::Ok().json(binder::on_bounds_click(body.0.as_ref()).map(ApiBounds::from))
}

/// `POST /api/draw`
///
/// Echoes the drawn `GeoJSON` back as text. Nothing is stored.
pub async fn draw(body: String) -> HttpResponse {
    log::debug!("Received drawing ({} bytes)", body.len());
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(body)
}

fn parse_range(
    params: &RangeQueryParams,
    calendar: &CalendarBounds,
) -> Result<DateRange, HttpResponse> {
    DateRange::parse(params.start.as_deref(), params.end.as_deref())
        .and_then(|range| calendar.check_range(&range).map(|()| range))
        .map_err(|e| {
            HttpResponse::BadRequest().json(ApiError {
                error: e.to_string(),
            })
        })
}

fn store_error_response(context: &str, e: &StoreError) -> HttpResponse {
    log::error!("{context}: {e}");
    let body = ApiError {
        error: format!("{context}: {e}"),
    };
    match e {
        StoreError::Unavailable { .. } | StoreError::Connect { .. } => {
            HttpResponse::ServiceUnavailable().json(body)
        }
        _ => HttpResponse::InternalServerError().json(body),
    }
}
