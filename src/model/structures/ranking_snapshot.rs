use chrono::NaiveDate;
use serde::Serialize;

use crate::model::structures::{athlete::AthleteId, current_rank::CurrentRankState, rank_kind::RankKind};

/// The full rank table as of one processed race, sorted by current rank descending.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RankingSnapshot {
    pub race_id: String,
    pub race_date: NaiveDate,
    pub race_index: usize,
    pub is_final: bool,
    pub rows: Vec<CurrentRankState>
}

impl RankingSnapshot {
    pub fn get(&self, athlete: &AthleteId) -> Option<&CurrentRankState> {
        self.rows.iter().find(|r| &r.athlete == athlete)
    }

    pub fn season_year(&self, kind: RankKind) -> i32 {
        kind.season_of(self.race_date)
    }
}
