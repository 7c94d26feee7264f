pub mod career;
pub mod error;
pub mod fixtures;
pub mod league;
pub mod matches;
pub mod standings;
pub mod validation;

pub use error::LeagueError;
pub use league::LeagueService;
