// src/routes/teams.rs
use actix_web::{get, web, HttpResponse};

use crate::handlers::team_handler;
use crate::league::LeagueService;
use crate::models::league::TeamSearchQuery;

#[get("")]
async fn search_teams(
    service: web::Data<LeagueService>,
    query: web::Query<TeamSearchQuery>,
) -> HttpResponse {
    team_handler::search_teams(service, query).await
}
