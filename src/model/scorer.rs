use std::collections::BTreeMap;

use itertools::Itertools;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{
    bands::Take,
    config::FormulaConfig,
    rank_tracker::RankTracker,
    rank_utils::mean,
    structures::{
        age_category::AgeCategory,
        athlete::AthleteId,
        race::{CompetitionRaceGroup, ExcludedRecord, Race}
    }
};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparativeSource {
    /// The age category's configured base rank
    BaseRank,
    /// Mean pre-race current rank of the strongest participants
    Peers
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComparativeRank {
    pub value: Decimal,
    pub source: ComparativeSource,
    /// The peers and their current ranks, e.g. `IVANOV IVAN 2001: 95.12, ...`
    pub audit: String
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AthleteGroupRank {
    pub athlete: AthleteId,
    pub placement: u32,
    pub finish_seconds: u32,
    pub group_rank: Decimal
}

/// Scoring of one race in one age category.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupScore {
    pub race_id: String,
    pub category: AgeCategory,
    pub finishers: usize,
    pub participants: usize,
    pub reference_seconds: Decimal,
    pub comparative_rank: ComparativeRank,
    pub ranks: Vec<AthleteGroupRank>
}

#[derive(Debug, Clone, PartialEq)]
pub struct RaceScore {
    pub race_id: String,
    pub groups: Vec<GroupScore>,
    /// Race score per athlete: the best group rank across the athlete's categories
    pub athlete_ranks: BTreeMap<AthleteId, Decimal>,
    pub excluded_records: Vec<ExcludedRecord>,
    /// Categories without a single finisher
    pub skipped_groups: Vec<AgeCategory>
}

pub struct RaceScorer<'a> {
    config: &'a FormulaConfig
}

impl<'a> RaceScorer<'a> {
    pub fn new(config: &'a FormulaConfig) -> RaceScorer<'a> {
        RaceScorer { config }
    }

    /// # Race scoring
    ///
    /// 1. Split the race into age category groups, dropping invalid records.
    /// 2. Score every group independently (in parallel) against the rank table
    ///     as it stood before this race.
    /// 3. Collapse to one score per athlete, taking the best group rank for
    ///     athletes entered in several categories.
    pub fn score_race(&self, race: &Race, race_index: usize, tracker: &RankTracker) -> RaceScore {
        let (groups, excluded_records) = race.groups();

        for excluded in &excluded_records {
            warn!(
                race_id = %race.id,
                athlete = %excluded.record.athlete,
                reason = %excluded.reason,
                "Excluding record"
            );
        }

        let scored: Vec<Result<GroupScore, AgeCategory>> = groups
            .par_iter()
            .map(|group| {
                self.score_group(group, race_index, tracker)
                    .ok_or_else(|| group.category.clone())
            })
            .collect();

        let (groups, skipped_groups): (Vec<GroupScore>, Vec<AgeCategory>) = scored.into_iter().partition_result();

        for category in &skipped_groups {
            debug!(race_id = %race.id, category = %category, "Skipping category without finishers");
        }

        let mut athlete_ranks: BTreeMap<AthleteId, Decimal> = BTreeMap::new();
        for rank in groups.iter().flat_map(|g| g.ranks.iter()) {
            athlete_ranks
                .entry(rank.athlete.clone())
                .and_modify(|best| *best = (*best).max(rank.group_rank))
                .or_insert(rank.group_rank);
        }

        RaceScore {
            race_id: race.id.clone(),
            groups,
            athlete_ranks,
            excluded_records,
            skipped_groups
        }
    }

    /// Scores one group. None when nobody finished.
    pub fn score_group(
        &self,
        group: &CompetitionRaceGroup,
        race_index: usize,
        tracker: &RankTracker
    ) -> Option<GroupScore> {
        let times: Vec<u32> = group.finishers().filter_map(|r| r.finish_seconds).collect();
        let reference_seconds = self.reference_time(&times)?;
        let comparative_rank = self.comparative_rank(group, race_index, tracker);

        let level = self.config.level_coefficient(group.race_level);
        let type_coefficient = self.config.type_coefficient(group.race_type);
        let n_finishers = times.len();

        let ranks = group
            .finishers()
            .filter_map(|record| {
                let placement = record.placement?;
                let finish_seconds = record.finish_seconds?;

                Some(AthleteGroupRank {
                    athlete: record.athlete.clone(),
                    placement,
                    finish_seconds,
                    group_rank: Self::group_rank(
                        level,
                        reference_seconds,
                        finish_seconds,
                        comparative_rank.value,
                        type_coefficient,
                        placement,
                        n_finishers
                    )
                })
            })
            .sorted_by(|a, b| a.placement.cmp(&b.placement).then_with(|| a.athlete.cmp(&b.athlete)))
            .collect();

        Some(GroupScore {
            race_id: group.race_id.clone(),
            category: group.category.clone(),
            finishers: n_finishers,
            participants: group.participant_count(),
            reference_seconds,
            comparative_rank,
            ranks
        })
    }

    /// Mean of the K fastest times, K picked by finisher count. K shrinks
    /// until the mean is within the cap of the winner's time. None without finishers.
    pub fn reference_time(&self, times: &[u32]) -> Option<Decimal> {
        let sorted: Vec<Decimal> = times.iter().sorted().map(|&t| Decimal::from(t)).collect();
        let fastest = *sorted.first()?;
        let cap = fastest * self.config.reference_time_cap;

        let mut k = self
            .config
            .finisher_reference_bands
            .lookup(sorted.len())
            .unwrap_or(Take::All)
            .resolve(sorted.len())
            .max(1);

        loop {
            let reference = mean(&sorted[..k])?;
            if reference <= cap || k == 1 {
                return Some(reference);
            }

            k -= 1;
        }
    }

    /// The skill level the race is scored against.
    ///
    /// The base rank applies during the first races of the season, when the
    /// category has a single distinct placement, or when no participant
    /// has a current rank yet. Otherwise it is the mean current rank of the
    /// top M participants, M picked by participant count (withdrawals included).
    pub fn comparative_rank(
        &self,
        group: &CompetitionRaceGroup,
        race_index: usize,
        tracker: &RankTracker
    ) -> ComparativeRank {
        let base = ComparativeRank {
            value: group.base_group_rank,
            source: ComparativeSource::BaseRank,
            audit: String::new()
        };

        let exempt = race_index <= self.config.races_exempt_from_comparative_rank.max(1);
        if exempt || group.distinct_placements() <= 1 {
            return base;
        }

        let participants = group.participant_count();
        let m = self
            .config
            .comparative_reference_bands
            .lookup(participants)
            .unwrap_or(Take::All)
            .resolve(participants);

        let peers: Vec<(&AthleteId, Decimal)> = group
            .records
            .iter()
            .filter(|r| r.counts_for_reference())
            .filter_map(|r| tracker.current_rank(&r.athlete).map(|rank| (&r.athlete, rank)))
            .unique_by(|(athlete, _)| *athlete)
            .sorted_by(|(a_id, a), (b_id, b)| b.cmp(a).then_with(|| a_id.cmp(b_id)))
            .take(m)
            .collect();

        let ranks: Vec<Decimal> = peers.iter().map(|(_, rank)| *rank).collect();
        let Some(value) = mean(&ranks) else {
            return base;
        };

        let audit = peers
            .iter()
            .map(|(athlete, rank)| format!("{}: {:.2}", athlete, rank.round_dp(2)))
            .join(", ");

        ComparativeRank {
            value,
            source: ComparativeSource::Peers,
            audit
        }
    }

    /// `level × (reference / time) × comparative × (1 − type × (placement − 1) / (N − 1))`
    /// with N floored at 2.
    pub fn group_rank(
        level_coefficient: Decimal,
        reference_seconds: Decimal,
        finish_seconds: u32,
        comparative_rank: Decimal,
        type_coefficient: Decimal,
        placement: u32,
        n_finishers: usize
    ) -> Decimal {
        let n = Decimal::from(n_finishers.max(2));
        let time_ratio = reference_seconds / Decimal::from(finish_seconds);
        let placement_share = (Decimal::from(placement) - Decimal::ONE) / (n - Decimal::ONE);
        let placement_term = Decimal::ONE - type_coefficient * placement_share;

        level_coefficient * time_ratio * comparative_rank * placement_term
    }
}
