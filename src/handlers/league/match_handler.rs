use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::handlers::league::{caller_id, error_response};
use crate::league::LeagueService;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::fixture::ReportScoreRequest;

#[tracing::instrument(name = "Start match", skip(service, claims))]
pub async fn start_match(
    match_id: Uuid,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let admin_id = match caller_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.start_match(admin_id, match_id).await {
        Ok(fixture) => HttpResponse::Ok().json(ApiResponse::success("Match is live", fixture)),
        Err(e) => error_response(&e),
    }
}

#[tracing::instrument(
    name = "Report score",
    skip(service, claims, request),
    fields(
        home_score = %request.home_score,
        away_score = %request.away_score,
        finalize = %request.finalize
    )
)]
pub async fn report_score(
    match_id: Uuid,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
    request: web::Json<ReportScoreRequest>,
) -> HttpResponse {
    let admin_id = match caller_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let finalize = request.finalize;
    match service.report_score(admin_id, match_id, request.into_inner()).await {
        Ok(fixture) => {
            let message = if finalize { "Match finalized" } else { "Live score updated" };
            HttpResponse::Ok().json(ApiResponse::success(message, fixture))
        }
        Err(e) => {
            tracing::warn!("Failed to report score for match {}: {}", match_id, e);
            error_response(&e)
        }
    }
}

#[tracing::instrument(name = "Undo match", skip(service, claims))]
pub async fn undo_match(
    match_id: Uuid,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let admin_id = match caller_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.undo_match(admin_id, match_id).await {
        Ok(fixture) => HttpResponse::Ok().json(ApiResponse::success("Match reset", fixture)),
        Err(e) => error_response(&e),
    }
}
