pub mod backend_health_handler;
pub mod career_handler;
pub mod league;
pub mod team_handler;
