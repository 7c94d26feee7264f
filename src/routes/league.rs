// src/routes/league.rs
use actix_web::{delete, get, post, web, HttpResponse};
use uuid::Uuid;

use crate::handlers::league::league_handler;
use crate::league::LeagueService;
use crate::middleware::auth::Claims;
use crate::models::league::{CreateLeagueRequest, JoinLeagueRequest};

/// Create a new league in lobby
#[post("")]
async fn create_league(
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
    request: web::Json<CreateLeagueRequest>,
) -> HttpResponse {
    league_handler::create_league(service, claims, request).await
}

/// Join a lobby with an invite code
#[post("/join")]
async fn join_league(
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
    request: web::Json<JoinLeagueRequest>,
) -> HttpResponse {
    league_handler::join_league(service, claims, request).await
}

/// Completed leagues of the caller
#[get("/past")]
async fn get_past_leagues(
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    league_handler::get_past_leagues(service, claims).await
}

#[get("/{league_id}")]
async fn get_league(
    path: web::Path<Uuid>,
    service: web::Data<LeagueService>,
) -> HttpResponse {
    league_handler::get_league(path.into_inner(), service).await
}

#[delete("/{league_id}")]
async fn delete_league(
    path: web::Path<Uuid>,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    league_handler::delete_league(path.into_inner(), service, claims).await
}

/// League with its participants
#[get("/{league_id}/lobby")]
async fn get_lobby(
    path: web::Path<Uuid>,
    service: web::Data<LeagueService>,
) -> HttpResponse {
    league_handler::get_lobby(path.into_inner(), service).await
}

#[post("/{league_id}/leave")]
async fn leave_league(
    path: web::Path<Uuid>,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    league_handler::leave_league(path.into_inner(), service, claims).await
}

#[delete("/{league_id}/participants/{user_id}")]
async fn kick_participant(
    path: web::Path<(Uuid, Uuid)>,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let (league_id, user_id) = path.into_inner();
    league_handler::kick_participant(league_id, user_id, service, claims).await
}

/// Generate the fixture and activate the league
#[post("/{league_id}/start")]
async fn start_league(
    path: web::Path<Uuid>,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    league_handler::start_league(path.into_inner(), service, claims).await
}

#[post("/{league_id}/finish")]
async fn finish_league(
    path: web::Path<Uuid>,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    league_handler::finish_league(path.into_inner(), service, claims).await
}

/// Live standings
#[get("/{league_id}/standings")]
async fn get_standings(
    path: web::Path<Uuid>,
    service: web::Data<LeagueService>,
) -> HttpResponse {
    league_handler::get_standings(path.into_inner(), service).await
}

/// Standings frozen when the league was finished
#[get("/{league_id}/final_standings")]
async fn get_final_standings(
    path: web::Path<Uuid>,
    service: web::Data<LeagueService>,
) -> HttpResponse {
    league_handler::get_final_standings(path.into_inner(), service).await
}

#[get("/{league_id}/fixture")]
async fn get_fixture(
    path: web::Path<Uuid>,
    service: web::Data<LeagueService>,
) -> HttpResponse {
    league_handler::get_fixture(path.into_inner(), service).await
}

#[get("/{league_id}/next_match")]
async fn get_next_match(
    path: web::Path<Uuid>,
    service: web::Data<LeagueService>,
) -> HttpResponse {
    league_handler::get_next_match(path.into_inner(), service).await
}

#[get("/{league_id}/my_matches")]
async fn get_my_matches(
    path: web::Path<Uuid>,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    league_handler::get_my_matches(path.into_inner(), service, claims).await
}
