use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{
    error::RaceDataError,
    structures::{
        age_category::AgeCategory,
        race_result::RaceResultRecord,
        race_type::{RaceLevel, RaceType}
    }
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    /// The season's designated last race; final ranks are frozen here
    #[serde(default)]
    pub is_final: bool,
    pub records: Vec<RaceResultRecord>
}

/// A record the scorer refused, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedRecord {
    pub record: RaceResultRecord,
    pub reason: RaceDataError
}

/// All records of one race in one age category.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitionRaceGroup {
    pub race_id: String,
    pub category: AgeCategory,
    pub race_type: RaceType,
    pub race_level: RaceLevel,
    pub base_group_rank: Decimal,
    pub records: Vec<RaceResultRecord>
}

impl CompetitionRaceGroup {
    pub fn finishers(&self) -> impl Iterator<Item = &RaceResultRecord> {
        self.records.iter().filter(|r| r.is_scorable())
    }

    /// Drives the reference time band.
    pub fn finisher_count(&self) -> usize {
        self.finishers().count()
    }

    /// Drives the comparative rank band. Includes withdrawn and not-started athletes.
    pub fn participant_count(&self) -> usize {
        self.records.iter().filter(|r| r.counts_for_reference()).count()
    }

    pub fn distinct_placements(&self) -> usize {
        let mut placements: Vec<u32> = self.finishers().filter_map(|r| r.placement).collect();
        placements.sort_unstable();
        placements.dedup();

        placements.len()
    }
}

impl Race {
    pub fn new(id: &str, name: &str, date: NaiveDate, records: Vec<RaceResultRecord>) -> Race {
        Race {
            id: id.to_string(),
            name: name.to_string(),
            date,
            is_final: false,
            records
        }
    }

    /// Splits the race into per-category groups, ordered by category.
    /// Records failing validation are returned separately and never reach a group.
    pub fn groups(&self) -> (Vec<CompetitionRaceGroup>, Vec<ExcludedRecord>) {
        let mut by_category: BTreeMap<AgeCategory, Vec<RaceResultRecord>> = BTreeMap::new();
        let mut excluded = Vec::new();

        for record in &self.records {
            match record.validate() {
                Ok(()) => by_category
                    .entry(record.category.clone())
                    .or_default()
                    .push(record.clone()),
                Err(reason) => excluded.push(ExcludedRecord {
                    record: record.clone(),
                    reason
                })
            }
        }

        let groups = by_category
            .into_iter()
            .map(|(category, records)| {
                let first = &records[0];
                CompetitionRaceGroup {
                    race_id: self.id.clone(),
                    category,
                    race_type: first.race_type,
                    race_level: first.race_level,
                    base_group_rank: first.base_group_rank,
                    records
                }
            })
            .collect();

        (groups, excluded)
    }
}
