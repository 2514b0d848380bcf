use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{
    error::RaceDataError,
    structures::{
        age_category::AgeCategory,
        athlete::AthleteId,
        race_type::{RaceLevel, RaceType}
    }
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum RaceStatus {
    Finished,
    NotStarted,
    Withdrawn
}

/// One athlete in one race, as delivered by the ingestion side: names and
/// birth years corrected, category canonical, time in whole seconds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RaceResultRecord {
    pub athlete: AthleteId,
    pub category: AgeCategory,
    pub race_id: String,
    pub race_date: NaiveDate,
    /// None unless the athlete finished
    pub finish_seconds: Option<u32>,
    /// None is the "no placement" sentinel
    pub placement: Option<u32>,
    pub race_type: RaceType,
    pub race_level: RaceLevel,
    pub base_group_rank: Decimal,
    pub status: RaceStatus
}

impl RaceResultRecord {
    pub fn validate(&self) -> Result<(), RaceDataError> {
        self.athlete.validate()?;

        if self.placement == Some(0) {
            return Err(RaceDataError::ZeroPlacement);
        }

        if self.status == RaceStatus::Finished {
            match self.finish_seconds {
                None => return Err(RaceDataError::MissingFinishTime),
                Some(0) => return Err(RaceDataError::ZeroFinishTime),
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Finished with a placement: takes part in reference time and group rank.
    pub fn is_scorable(&self) -> bool {
        self.status == RaceStatus::Finished && self.placement.is_some() && self.finish_seconds.is_some()
    }

    /// Withdrawn and not-started athletes still count toward the comparative rank reference.
    pub fn counts_for_reference(&self) -> bool {
        match self.status {
            RaceStatus::Finished => self.is_scorable(),
            RaceStatus::NotStarted | RaceStatus::Withdrawn => true
        }
    }
}
