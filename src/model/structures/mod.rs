pub mod age_category;
pub mod athlete;
pub mod current_rank;
pub mod race;
pub mod race_result;
pub mod race_type;
pub mod rank_kind;
pub mod ranking_snapshot;
