pub mod bands;
pub mod config;
pub mod constants;
pub mod error;
pub mod penalty;
pub mod rank_tracker;
pub mod rank_utils;
pub mod report;
pub mod scorer;
pub mod season;
pub mod structures;
