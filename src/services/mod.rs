pub mod league_events;

pub use league_events::LeagueEventPublisher;
