use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::structures::{
    athlete::Sex,
    race_result::RaceStatus,
    race_type::{RaceLevel, RaceType}
};

/// A season's worth of prepared protocols.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultFeed {
    pub races: Vec<FeedRace>
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedRace {
    pub id: String,
    pub name: String,
    /// Protocol heading; the race level is classified from it when `race_level` is absent
    #[serde(default)]
    pub heading: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub race_type: Option<RaceType>,
    #[serde(default)]
    pub race_level: Option<RaceLevel>,
    #[serde(default)]
    pub is_final: bool,
    pub results: Vec<FeedResult>
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedResult {
    pub surname: String,
    pub given_name: String,
    #[serde(default)]
    pub birth_year: u16,
    pub category: String,
    /// `H:MM:SS`, `MM:SS` or whole seconds
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub placement: Option<u32>,
    pub status: RaceStatus
}

/// One row of the prior-season final rank table (CSV).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PriorRankRow {
    pub surname: String,
    pub given_name: String,
    pub birth_year: u16,
    pub sex: Sex,
    pub final_rank: String
}
