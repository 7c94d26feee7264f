use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::handlers::league::{caller_id, error_response};
use crate::league::LeagueService;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;

#[tracing::instrument(name = "Get career stats", skip(service, claims))]
pub async fn get_career(service: web::Data<LeagueService>, claims: web::ReqData<Claims>) -> HttpResponse {
    let user_id = match caller_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.career(user_id).await {
        Ok(career) => HttpResponse::Ok().json(ApiResponse::success(
            "Career statistics retrieved",
            json!({
                "user_id": user_id,
                "stats": career,
                "win_rate": career.win_rate(),
            }),
        )),
        Err(e) => error_response(&e),
    }
}

#[tracing::instrument(name = "Reset career stats", skip(service, claims))]
pub async fn reset_career(service: web::Data<LeagueService>, claims: web::ReqData<Claims>) -> HttpResponse {
    let user_id = match caller_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.reset_career(user_id).await {
        Ok(reset_at) => HttpResponse::Ok().json(ApiResponse::success(
            "Career statistics reset",
            json!({ "reset_at": reset_at }),
        )),
        Err(e) => error_response(&e),
    }
}
