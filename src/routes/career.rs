// src/routes/career.rs
use actix_web::{get, post, web, HttpResponse};

use crate::handlers::career_handler;
use crate::league::LeagueService;
use crate::middleware::auth::Claims;

#[get("")]
async fn get_career(
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    career_handler::get_career(service, claims).await
}

#[post("/reset")]
async fn reset_career(
    service: web::Data<LeagueService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    career_handler::reset_career(service, claims).await
}
