use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::handlers::league::{caller_id, error_response};
use crate::league::LeagueService;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::league::{CreateLeagueRequest, JoinLeagueRequest};

#[tracing::instrument(
    name = "Create league",
    skip(service, claims, request),
    fields(league_name = %request.name, format = %request.format)
)]
pub async fn create_league(
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
    request: web::Json<CreateLeagueRequest>,
) -> HttpResponse {
    let user_id = match caller_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.create_league(user_id, request.into_inner()).await {
        Ok(lobby) => HttpResponse::Created().json(ApiResponse::success("League created successfully", lobby)),
        Err(e) => {
            tracing::warn!("Failed to create league: {}", e);
            error_response(&e)
        }
    }
}

#[tracing::instrument(name = "Join league", skip(service, claims, request))]
pub async fn join_league(
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
    request: web::Json<JoinLeagueRequest>,
) -> HttpResponse {
    let user_id = match caller_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.join_league(user_id, request.into_inner()).await {
        Ok(participant) => HttpResponse::Ok().json(ApiResponse::success("Joined league", participant)),
        Err(e) => {
            tracing::warn!("User {} failed to join league: {}", user_id, e);
            error_response(&e)
        }
    }
}

#[tracing::instrument(name = "Leave league", skip(service, claims))]
pub async fn leave_league(
    league_id: Uuid,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let user_id = match caller_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.leave_league(user_id, league_id).await {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::<()>::success_message("Left league")),
        Err(e) => error_response(&e),
    }
}

#[tracing::instrument(name = "Remove participant", skip(service, claims))]
pub async fn kick_participant(
    league_id: Uuid,
    user_id: Uuid,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let admin_id = match caller_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.kick_participant(admin_id, league_id, user_id).await {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::<()>::success_message("Participant removed")),
        Err(e) => error_response(&e),
    }
}

#[tracing::instrument(name = "Delete league", skip(service, claims))]
pub async fn delete_league(
    league_id: Uuid,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let admin_id = match caller_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.delete_league(admin_id, league_id).await {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::<()>::success_message("League deleted")),
        Err(e) => error_response(&e),
    }
}

#[tracing::instrument(name = "Start league", skip(service, claims))]
pub async fn start_league(
    league_id: Uuid,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let admin_id = match caller_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.start_league(admin_id, league_id).await {
        Ok(started) => {
            tracing::info!("League {} started with {} matches", league_id, started.match_count);
            HttpResponse::Ok().json(ApiResponse::success("League started", started))
        }
        Err(e) => {
            tracing::warn!("Failed to start league {}: {}", league_id, e);
            error_response(&e)
        }
    }
}

#[tracing::instrument(name = "Finish league", skip(service, claims))]
pub async fn finish_league(
    league_id: Uuid,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let admin_id = match caller_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.finish_league(admin_id, league_id).await {
        Ok(standings) => HttpResponse::Ok().json(ApiResponse::success("League finished", standings)),
        Err(e) => error_response(&e),
    }
}

pub async fn get_league(league_id: Uuid, service: web::Data<LeagueService>) -> HttpResponse {
    match service.get_league(league_id).await {
        Ok(league) => HttpResponse::Ok().json(ApiResponse::success("League retrieved", league)),
        Err(e) => error_response(&e),
    }
}

pub async fn get_lobby(league_id: Uuid, service: web::Data<LeagueService>) -> HttpResponse {
    match service.lobby(league_id).await {
        Ok(lobby) => HttpResponse::Ok().json(ApiResponse::success("Lobby retrieved", lobby)),
        Err(e) => error_response(&e),
    }
}

#[tracing::instrument(name = "Get standings", skip(service))]
pub async fn get_standings(league_id: Uuid, service: web::Data<LeagueService>) -> HttpResponse {
    match service.standings(league_id).await {
        Ok(standings) => HttpResponse::Ok().json(ApiResponse::success("Standings retrieved", standings)),
        Err(e) => error_response(&e),
    }
}

pub async fn get_final_standings(league_id: Uuid, service: web::Data<LeagueService>) -> HttpResponse {
    match service.final_standings(league_id).await {
        Ok(standings) => HttpResponse::Ok().json(ApiResponse::success("Final standings retrieved", standings)),
        Err(e) => error_response(&e),
    }
}

pub async fn get_fixture(league_id: Uuid, service: web::Data<LeagueService>) -> HttpResponse {
    match service.fixture(league_id).await {
        Ok(matches) => HttpResponse::Ok().json(ApiResponse::success("Fixture retrieved", matches)),
        Err(e) => error_response(&e),
    }
}

pub async fn get_next_match(league_id: Uuid, service: web::Data<LeagueService>) -> HttpResponse {
    match service.next_match(league_id).await {
        Ok(Some(next)) => HttpResponse::Ok().json(ApiResponse::success("Next match retrieved", next)),
        Ok(None) => HttpResponse::Ok().json(ApiResponse::<()>::success_message("All matches have been played")),
        Err(e) => error_response(&e),
    }
}

pub async fn get_my_matches(
    league_id: Uuid,
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let user_id = match caller_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.user_matches(league_id, user_id).await {
        Ok(matches) => HttpResponse::Ok().json(ApiResponse::success("Matches retrieved", matches)),
        Err(e) => error_response(&e),
    }
}

pub async fn get_past_leagues(service: web::Data<LeagueService>, claims: web::ReqData<Claims>) -> HttpResponse {
    let user_id = match caller_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.past_leagues(user_id).await {
        Ok(leagues) => HttpResponse::Ok().json(ApiResponse::success("Past leagues retrieved", leagues)),
        Err(e) => error_response(&e),
    }
}
