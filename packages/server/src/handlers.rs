//! HTTP handler functions for the SISAGUA dashboard.
//!
//! Handlers never fail: bad filters, unreadable data, and map failures are
//! logged and answered with an empty or zeroed payload.

use actix_web::{HttpResponse, web};
use chrono::Local;
use sisagua_analytics::{by_collection_point, by_month, by_neighborhood, summarize};
use sisagua_sample_models::{FilterCriteria, SampleRecord};
use sisagua_server_models::{
    ApiHealth, FilterParams, FilterQuery, FilterResponse, MapStatus, UpdateResponse,
};

use crate::AppState;
use crate::dashboard::{self, DashboardPage};

/// Timestamp format shown on the dashboard.
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

fn now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Raw query string pairs, in request order.
type QueryPairs = Vec<(String, String)>;

/// Filter criteria from a `GET` query string. A query string that cannot be
/// decoded counts as an invalid filter.
fn query_criteria(
    query: Option<web::Query<QueryPairs>>,
    endpoint: &str,
) -> Option<FilterCriteria> {
    let Some(query) = query else {
        log::warn!("Undecodable query string in {endpoint}");
        return None;
    };
    match FilterQuery::from_pairs(query.into_inner()).to_criteria() {
        Ok(criteria) => Some(criteria),
        Err(e) => {
            log::warn!("Invalid filter in {endpoint}: {e}");
            None
        }
    }
}

/// Regenerates the collection map from `records`.
fn regenerate_map(state: &AppState, records: &[SampleRecord]) -> bool {
    let generated = sisagua_map::generate(
        &state.static_dir,
        records,
        &state.table,
        Some(state.geojson_path.as_path()),
    );
    if !generated {
        log::warn!("Map generation failed. Dashboard might not display map correctly.");
    }
    generated
}

/// `GET /`
///
/// Renders the dashboard over the full data set and regenerates the map.
pub async fn index(state: web::Data<AppState>) -> HttpResponse {
    let page = match state.source.read() {
        Ok(records) => {
            let stats = summarize(&records, &state.table);
            let neighborhoods = dashboard::sorted_neighborhoods(&records);
            regenerate_map(&state, &records);
            DashboardPage {
                stats,
                neighborhoods,
                last_update: now(),
                error: None,
            }
        }
        Err(e) => {
            log::error!("Error in main route: {e}");
            DashboardPage {
                stats: summarize(&[], &state.table),
                neighborhoods: Vec::new(),
                last_update: "Erro ao carregar dados".to_string(),
                error: Some(e.to_string()),
            }
        }
    };

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(dashboard::render(&page))
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/bairros`
///
/// Compliance per neighborhood for the filtered samples.
pub async fn neighborhoods(
    state: web::Data<AppState>,
    query: Option<web::Query<QueryPairs>>,
) -> HttpResponse {
    let summaries = query_criteria(query, "neighborhoods API")
        .map(|criteria| by_neighborhood(&state.source.load(&criteria), &state.table))
        .unwrap_or_default();
    HttpResponse::Ok().json(summaries)
}

/// `GET /api/distribuicao_mes`
///
/// Compliance per calendar month for the filtered samples.
pub async fn months(
    state: web::Data<AppState>,
    query: Option<web::Query<QueryPairs>>,
) -> HttpResponse {
    let summaries = query_criteria(query, "monthly distribution API")
        .map(|criteria| by_month(&state.source.load(&criteria), &state.table))
        .unwrap_or_default();
    HttpResponse::Ok().json(summaries)
}

/// `GET /api/distribuicao_ponto_coleta`
///
/// Compliance per collection point for the filtered samples.
pub async fn collection_points(
    state: web::Data<AppState>,
    query: Option<web::Query<QueryPairs>>,
) -> HttpResponse {
    let summaries = query_criteria(query, "collection point API")
        .map(|criteria| by_collection_point(&state.source.load(&criteria), &state.table))
        .unwrap_or_default();
    HttpResponse::Ok().json(summaries)
}

/// `POST /api/filtrar_dados`
///
/// Statistics for the filtered samples; the map is regenerated to match.
/// A malformed body or filter yields zeroed statistics with an `error`.
pub async fn filter(
    state: web::Data<AppState>,
    body: Option<web::Json<FilterParams>>,
) -> HttpResponse {
    let Some(params) = body else {
        log::warn!("Error in data filtering API: missing or malformed JSON body");
        return HttpResponse::Ok().json(FilterResponse::failed("Corpo da requisição inválido"));
    };

    let response = match params.to_criteria() {
        Ok(criteria) => {
            let records = state.source.load(&criteria);
            let stats = summarize(&records, &state.table);
            let generated = regenerate_map(&state, &records);
            FilterResponse::new(stats, MapStatus::from(generated))
        }
        Err(e) => {
            log::warn!("Error in data filtering API: {e}");
            FilterResponse::failed(e.to_string())
        }
    };

    HttpResponse::Ok().json(response)
}

/// `POST /atualizar_dados`
///
/// Acknowledges a refresh request. The CSV is re-read on every request,
/// so there is nothing to reload.
pub async fn update() -> HttpResponse {
    HttpResponse::Ok().json(UpdateResponse {
        status: "success".to_string(),
        message: "Dados atualizados com sucesso (simulação)".to_string(),
        ultima_atualizacao: now(),
    })
}
