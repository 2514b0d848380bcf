use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::structures::athlete::AthleteId;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankSource {
    /// Carried over from the previous season's final rank
    PriorSeason,
    Race
}

/// One entry of an athlete's race-rank history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RaceRankEntry {
    pub source: RankSource,
    pub race_id: Option<String>,
    pub race_date: Option<NaiveDate>,
    pub rank: Decimal
}

/// An athlete's running rank after some race.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRankState {
    pub athlete: AthleteId,
    pub current_rank: Decimal,
    /// Races counted toward the current rank at this point of the season
    pub races_counted: usize,
    pub races_attended: usize,
    /// Index of the race this state was computed for, starting at 1
    pub race_index: usize,
    pub last_race_date: Option<NaiveDate>,
    pub missed_fraction: Decimal,
    /// Missed-race penalty
    pub penalty: Decimal,
    /// Penalty for not-started and withdrawn entries so far
    pub non_finish_penalty: Decimal,
    /// Set only on the season's final race
    pub final_rank: Option<Decimal>
}

impl CurrentRankState {
    /// Multiplier applied to the best-races mean.
    pub fn penalty_factor(&self) -> Decimal {
        (Decimal::ONE - self.penalty) * (Decimal::ONE - self.non_finish_penalty)
    }
}

/// Last season's frozen final rank. Counts as a history entry for the
/// season's first race only.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriorSeasonRank {
    pub athlete: AthleteId,
    pub final_rank: Decimal
}
