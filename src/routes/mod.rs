use actix_web::web;

pub mod backend_health;
pub mod career;
pub mod league;
pub mod matches;
pub mod teams;

use crate::middleware::auth::AuthMiddleware;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(backend_health::backend_health);

    // League routes (require authentication)
    cfg.service(
        web::scope("/leagues")
            .wrap(AuthMiddleware)
            .service(league::create_league)
            .service(league::join_league)
            // before /{league_id} so "past" is not taken for an id
            .service(league::get_past_leagues)
            .service(league::get_league)
            .service(league::delete_league)
            .service(league::get_lobby)
            .service(league::leave_league)
            .service(league::kick_participant)
            .service(league::start_league)
            .service(league::finish_league)
            .service(league::get_standings)
            .service(league::get_final_standings)
            .service(league::get_fixture)
            .service(league::get_next_match)
            .service(league::get_my_matches)
    );
    // Match score operations (require authentication)
    cfg.service(
        web::scope("/matches")
            .wrap(AuthMiddleware)
            .service(matches::start_match)
            .service(matches::report_score)
            .service(matches::undo_match)
    );
    cfg.service(
        web::scope("/career")
            .wrap(AuthMiddleware)
            .service(career::get_career)
            .service(career::reset_career)
    );
    cfg.service(
        web::scope("/teams")
            .wrap(AuthMiddleware)
            .service(teams::search_teams)
    );
}
