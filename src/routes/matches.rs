// src/routes/matches.rs
use actix_web::{post, put, web, HttpResponse};
use uuid::Uuid;

use crate::handlers::league::match_handler;
use crate::league::LeagueService;
use crate::middleware::auth::Claims;
use crate::models::fixture::ReportScoreRequest;

/// Move a pending match to live
#[post("/{match_id}/start")]
async fn start_match(
    path: web::Path<Uuid>,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    match_handler::start_match(path.into_inner(), service, claims).await
}

/// Live score update, or the final result when `finalize` is set
#[put("/{match_id}/score")]
async fn report_score(
    path: web::Path<Uuid>,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
    request: web::Json<ReportScoreRequest>,
) -> HttpResponse {
    match_handler::report_score(path.into_inner(), service, claims, request).await
}

#[post("/{match_id}/undo")]
async fn undo_match(
    path: web::Path<Uuid>,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    match_handler::undo_match(path.into_inner(), service, claims).await
}
