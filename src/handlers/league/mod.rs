use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::league::LeagueError;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;

pub mod league_handler;
pub mod match_handler;

/// Map a service error onto the HTTP status the client acts on.
pub fn error_response(error: &LeagueError) -> HttpResponse {
    let body = ApiResponse::<()>::error_with_message(error.kind(), error.to_string());
    match error {
        LeagueError::NotFound(_) => HttpResponse::NotFound().json(body),
        LeagueError::Forbidden(_) => HttpResponse::Forbidden().json(body),
        LeagueError::StaleTransition { .. }
        | LeagueError::InvalidMatchTransition { .. }
        | LeagueError::ConcurrentUpdate { .. } => HttpResponse::Conflict().json(body),
        LeagueError::InsufficientParticipants { .. }
        | LeagueError::MissingMotm
        | LeagueError::InvalidMotm { .. } => HttpResponse::UnprocessableEntity().json(body),
        LeagueError::InvalidFormat(_) | LeagueError::Validation(_) => HttpResponse::BadRequest().json(body),
        LeagueError::Store { operation, source } => {
            tracing::error!("Store operation '{}' failed: {}", operation, source);
            HttpResponse::ServiceUnavailable().json(ApiResponse::<()>::error_with_message(
                error.kind(),
                format!("Store operation '{}' failed, try again later", operation),
            ))
        }
    }
}

/// The authenticated caller. The middleware only admits tokens whose subject is a user id.
pub fn caller_id(claims: &web::ReqData<Claims>) -> Result<Uuid, HttpResponse> {
    claims.user_id().ok_or_else(|| {
        tracing::error!("Invalid user ID in claims");
        HttpResponse::BadRequest().json(ApiResponse::<()>::error("Invalid user ID"))
    })
}
