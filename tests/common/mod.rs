#![allow(dead_code)]

pub mod failing_store;
pub mod league_helpers;
pub mod utils;
