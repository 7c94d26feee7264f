pub mod common;
pub mod events;
pub mod fixture;
pub mod league;
pub mod standings;
