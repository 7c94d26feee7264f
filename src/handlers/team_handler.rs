use actix_web::{web, HttpResponse};

use crate::handlers::league::error_response;
use crate::league::LeagueService;
use crate::models::common::ApiResponse;
use crate::models::league::TeamSearchQuery;

#[tracing::instrument(name = "Search official teams", skip(service, query), fields(search = %query.search))]
pub async fn search_teams(service: web::Data<LeagueService>, query: web::Query<TeamSearchQuery>) -> HttpResponse {
    match service.search_official_teams(&query.search).await {
        Ok(teams) => HttpResponse::Ok().json(ApiResponse::success("Official teams retrieved", teams)),
        Err(e) => error_response(&e),
    }
}
